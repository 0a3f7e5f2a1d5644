//! # Reconciler Types
//!
//! The reconciler context and its error type.

use crate::crd::ResourceKey;
use crate::store::{ResourceStore, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Reconciles AlertRules into PrometheusRules through a [`ResourceStore`]
///
/// Holds no per-resource state: passes for different AlertRules may run
/// concurrently, passes for the same AlertRule must be serialized by the caller.
#[derive(Clone)]
pub struct Reconciler {
    pub(crate) store: Arc<dyn ResourceStore>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// The store this reconciler writes through
    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }
}

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// A resource store operation failed; propagated unmodified
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The AlertRule cannot be translated as stored (not retried blindly)
    #[error("malformed AlertRule {key}: {reason}")]
    Malformed { key: String, reason: String },
}

impl ReconcilerError {
    pub(crate) fn malformed(key: &ResourceKey, reason: impl Into<String>) -> Self {
        ReconcilerError::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the whole pass can succeed without outside changes
    pub fn is_transient(&self) -> bool {
        match self {
            ReconcilerError::Store(e) => e.is_transient(),
            ReconcilerError::Malformed { .. } => false,
        }
    }

    /// Metrics label for the error
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Store(StoreError::NotFound { .. }) => "not_found",
            ReconcilerError::Store(StoreError::AlreadyExists { .. }) => "already_exists",
            ReconcilerError::Store(StoreError::Conflict { .. }) => "conflict",
            ReconcilerError::Store(StoreError::Unavailable(_)) => "unavailable",
            ReconcilerError::Store(StoreError::Canceled) => "canceled",
            ReconcilerError::Store(_) => "store",
            ReconcilerError::Malformed { .. } => "malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Kind;

    #[test]
    fn test_store_errors_pass_through_unmodified() {
        let err = ReconcilerError::from(StoreError::not_found(Kind::AlertRule, "ns", "a"));
        assert_eq!(err.to_string(), "AlertRule ns/a not found");
        assert!(matches!(err, ReconcilerError::Store(ref e) if e.is_not_found()));
        assert_eq!(err.reason(), "not_found");
    }

    #[test]
    fn test_malformed_is_not_transient() {
        let err = ReconcilerError::malformed(&ResourceKey::new("ns", "a"), "no uid");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "malformed AlertRule ns/a: no uid");
        assert!(ReconcilerError::from(StoreError::Unavailable("down".into())).is_transient());
    }
}
