//! # Observability
//!
//! Prometheus metrics for the controller. Logging goes through `tracing`
//! directly at each call site.

pub mod metrics;
