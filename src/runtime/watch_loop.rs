//! # Watch Loop
//!
//! Cluster trigger layer: a `kube_runtime` controller watching AlertRules and
//! the PrometheusRules they own.
//!
//! The controller never runs two passes for the same AlertRule at once, and a
//! change to an owned PrometheusRule requeues its owner.

use crate::controller::ReconcilerError;
use crate::crd::{AlertRule, PrometheusRule};
use crate::observability;
use crate::runtime::context::ControllerContext;
use crate::runtime::error_policy::{handle_reconciliation_error, log_watch_error};
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::controller::{Action, Error as ControllerError};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconcile adapter between the controller runtime and the reconciler
///
/// A pass asking for no revisit waits for the next change; a pass asking for a
/// revisit is requeued after the returned delay.
pub async fn reconcile_alert_rule(
    obj: Arc<AlertRule>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcilerError> {
    let Some(key) = obj.key() else {
        warn!("Ignoring AlertRule without name or namespace");
        return Ok(Action::await_change());
    };

    let requeue = ctx.reconciler.reconcile(&key).await?;
    ctx.reset_backoff(&key);

    Ok(match requeue {
        Some(delay) => {
            observability::metrics::increment_requeues_total("requested");
            Action::requeue(delay)
        }
        None => Action::await_change(),
    })
}

/// Run the controller until shutdown is signalled (SIGINT / SIGTERM)
pub async fn run_watch_loop(client: Client, ctx: Arc<ControllerContext>) {
    let (alert_rules, prometheus_rules): (Api<AlertRule>, Api<PrometheusRule>) =
        match ctx.config.watch_namespace.as_deref() {
            Some(ns) => (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client, ns),
            ),
            None => (Api::all(client.clone()), Api::all(client)),
        };

    info!(
        namespace = ctx.config.watch_namespace.as_deref().unwrap_or("*"),
        "Starting AlertRule watch loop"
    );

    Controller::new(alert_rules, watcher::Config::default())
        .owns(prometheus_rules, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_alert_rule, handle_reconciliation_error, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _action)) => {
                    debug!(resource = %object, "Reconciled");
                }
                // Already logged and counted by the reconciler and error policy
                Err(ControllerError::ReconcilerFailed(_, object)) => {
                    debug!(resource = %object, "Reconcile failed, backing off");
                }
                Err(ControllerError::ObjectNotFound(object)) => {
                    debug!(resource = %object, "Object no longer in cache");
                }
                Err(e) => log_watch_error(&e.to_string()),
            }
        })
        .await;

    info!("Watch loop stopped");
}
