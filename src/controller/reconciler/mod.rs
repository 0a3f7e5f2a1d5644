//! # Reconciler
//!
//! Drives one AlertRule towards its desired state: finalizer, generated
//! PrometheusRule and status.
//!
//! - `reconcile`: the reconciliation pass
//! - `status`: status block and condition helpers
//! - `types`: reconciler context and errors

mod reconcile;
pub mod status;
pub mod types;

pub use reconcile::{SyncAction, SyncOutcome};
pub use status::{mark_ready, upsert_condition};
pub use types::{Reconciler, ReconcilerError};
