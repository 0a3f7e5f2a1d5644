//! # Error Policy
//!
//! Error handling and backoff for the controller watch loop.

use crate::controller::ReconcilerError;
use crate::crd::{AlertRule, ResourceKey};
use crate::observability;
use crate::runtime::context::ControllerContext;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource so one failing AlertRule does not
/// slow down the others.
pub fn handle_reconciliation_error(
    obj: Arc<AlertRule>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let key = obj.key().unwrap_or_else(|| {
        ResourceKey::new(
            obj.metadata.namespace.as_deref().unwrap_or("default"),
            obj.metadata.name.as_deref().unwrap_or("unknown"),
        )
    });

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = %key.name,
        resource.namespace = %key.namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    let (delay, error_count) = ctx.next_backoff(&key);
    if error.is_transient() {
        warn!("Transient reconciliation error for {}: {}", key, error);
    } else {
        error!("Reconciliation error for {}: {:?}", key, error);
    }

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        "Retrying in {}s at {} (error count: {}, trigger source: error-backoff)",
        delay.as_secs(),
        next_trigger_time.to_rfc3339(),
        error_count
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}

/// Log a watch stream error with a hint about its likely cause
pub fn log_watch_error(error_string: &str) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );
    let _error_guard = error_span.enter();

    let is_401 = error_string.contains("401") || error_string.contains("Unauthorized");
    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired");
    let is_404 = error_string.contains("404") || error_string.contains("NotFound");

    if is_401 {
        error!("Watch authentication failed (401 Unauthorized): RBAC may have been revoked or the token expired");
    } else if is_410 {
        warn!("Watch resource version expired (410), the watch restarts on its own");
    } else if is_404 {
        error!("Watched resource type not found; are the AlertRule and PrometheusRule CRDs installed?");
    } else {
        error!("Controller stream error: {}", error_string);
    }
}
