//! # Controller
//!
//! AlertRule reconciliation: translation, the reconciliation pass and retry backoff.

pub mod backoff;
pub mod reconciler;
pub mod translator;

pub use reconciler::{Reconciler, ReconcilerError};
