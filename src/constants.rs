//! # Constants
//!
//! Names, labels and defaults shared by the reconciler, the stores and the
//! HTTP facade.

/// API group of the AlertRule CRD
pub const ALERT_RULE_GROUP: &str = "monitoring.kneutral.io";

/// API version of the AlertRule CRD
pub const ALERT_RULE_VERSION: &str = "v1alpha1";

/// Finalizer placed on every AlertRule the controller has synced
pub const FINALIZER: &str = "alertrule.kneutral.io/finalizer";

/// Prefix of every generated PrometheusRule name
pub const GENERATED_RULE_PREFIX: &str = "kneutral-";

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "alertrule-controller";

// Operator-identity labels on generated PrometheusRules.
// User-supplied labels never override these keys.
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
pub const LABEL_NAME: &str = "app.kubernetes.io/name";

pub const MANAGED_BY_VALUE: &str = "kneutral-operator";
pub const INSTANCE_VALUE: &str = "kneutral";

// Status reporting
pub const CONDITION_READY: &str = "Ready";
pub const REASON_RECONCILE_SUCCESS: &str = "ReconcileSuccess";

/// Default address of the HTTP facade (API, probes, metrics)
pub const DEFAULT_API_BIND_ADDRESS: &str = "0.0.0.0:8090";

/// Default server startup timeout in seconds
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default server readiness poll interval in milliseconds
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default interval of the standalone resync loop in seconds
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 30;

/// Default minimum error backoff in seconds
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Default maximum error backoff in seconds
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Requeue used when the backoff state cannot be locked
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;
