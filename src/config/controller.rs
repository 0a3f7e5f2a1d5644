//! # Controller Settings
//!
//! Reconciliation loop settings loaded from environment variables.

use super::env_var_or_default;
use std::time::Duration;

/// Reconciliation loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Interval of the standalone resync loop (seconds)
    pub resync_interval_secs: u64,
    /// First retry delay after a failed reconciliation (seconds)
    pub backoff_min_secs: u64,
    /// Upper bound of the retry delay (seconds)
    pub backoff_max_secs: u64,
    /// Namespace to watch; all namespaces when unset
    pub watch_namespace: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            watch_namespace: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            backoff_min_secs: env_var_or_default("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty()),
        }
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.resync_interval_secs, 30);
        assert_eq!(config.backoff_min_secs, 1);
        assert_eq!(config.backoff_max_secs, 300);
        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.resync_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_resync_interval_is_clamped() {
        let config = ControllerConfig {
            resync_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.resync_interval(), Duration::from_secs(1));
    }
}
