//! # Controller Context
//!
//! State shared by the trigger loops: the reconciler plus per-resource retry
//! backoff.

use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffState;
use crate::controller::Reconciler;
use crate::crd::ResourceKey;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Context handed to the reconcile adapter and the error policy
#[derive(Debug)]
pub struct ControllerContext {
    pub reconciler: Reconciler,
    pub config: ControllerConfig,
    /// Retry backoff per AlertRule, keyed by `namespace/name`
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl ControllerContext {
    pub fn new(reconciler: Reconciler, config: ControllerConfig) -> Self {
        Self {
            reconciler,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure for `key` and return the delay before the next attempt
    ///
    /// Returns the error count alongside the delay. Falls back to a fixed delay
    /// if the backoff map is poisoned.
    pub fn next_backoff(&self, key: &ResourceKey) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.to_string()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
                });
                state.increment_error();
                (
                    Duration::from_secs(state.backoff.next_backoff_seconds()),
                    state.error_count,
                )
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (
                    Duration::from_secs(crate::constants::DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS),
                    0,
                )
            }
        }
    }

    /// Forget the failure history of `key` after a successful pass
    pub fn reset_backoff(&self, key: &ResourceKey) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(&key.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn context() -> ControllerContext {
        let config = ControllerConfig {
            backoff_min_secs: 2,
            backoff_max_secs: 10,
            ..Default::default()
        };
        ControllerContext::new(Reconciler::new(Arc::new(InMemoryStore::new())), config)
    }

    #[test]
    fn test_backoff_grows_per_resource() {
        let ctx = context();
        let a = ResourceKey::new("ns", "a");
        let b = ResourceKey::new("ns", "b");

        assert_eq!(ctx.next_backoff(&a), (Duration::from_secs(2), 1));
        assert_eq!(ctx.next_backoff(&a), (Duration::from_secs(2), 2));
        assert_eq!(ctx.next_backoff(&a), (Duration::from_secs(4), 3));
        assert_eq!(ctx.next_backoff(&b), (Duration::from_secs(2), 1));
    }

    #[test]
    fn test_reset_backoff() {
        let ctx = context();
        let a = ResourceKey::new("ns", "a");
        for _ in 0..5 {
            ctx.next_backoff(&a);
        }
        ctx.reset_backoff(&a);
        assert_eq!(ctx.next_backoff(&a), (Duration::from_secs(2), 1));
    }
}
