//! # Reconcile
//!
//! One reconciliation pass for a single AlertRule.
//!
//! The pass reads current state fresh from the store every time, so it is safe
//! to repeat at any point and converges after a crash mid-way:
//!
//! 1. Fetch the AlertRule. Gone means nothing to do.
//! 2. Terminating: delete the generated PrometheusRule, then release the finalizer.
//! 3. Otherwise ensure the finalizer, then create or update the PrometheusRule
//!    and mark the AlertRule ready.

mod finalizer;
mod sync;

pub use sync::{SyncAction, SyncOutcome};

use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::ResourceKey;
use crate::observability;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, Instrument};

impl Reconciler {
    /// Reconcile the AlertRule identified by `key`
    ///
    /// Returns `Ok(None)` when no revisit is needed, `Ok(Some(delay))` to ask
    /// for a revisit. Store failures are returned unmodified.
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<Option<Duration>, ReconcilerError> {
        let span = info_span!(
            "alertrule.reconcile",
            resource.namespace = %key.namespace,
            resource.name = %key.name,
        );

        async move {
            let start = Instant::now();
            observability::metrics::increment_reconciliations();

            let result = self.reconcile_pass(key).await;

            observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                error!(error = %e, "Reconciliation failed");
                observability::metrics::increment_reconciliation_errors(e.reason());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn reconcile_pass(&self, key: &ResourceKey) -> Result<Option<Duration>, ReconcilerError> {
        let rule = match self.store.get_alert_rule(key).await {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                info!("AlertRule not found, ignoring since it must have been deleted");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if rule.is_terminating() {
            debug!("AlertRule is being deleted");
            return self.finalize(key, rule).await;
        }

        let rule = self.ensure_finalizer(rule).await?;
        let outcome = self.sync_generated_rule(key, &rule).await?;
        debug!(outcome = outcome.as_str(), "PrometheusRule in sync");

        self.report_ready(rule, &outcome.rule_name).await?;
        info!(
            prometheus_rule = %outcome.rule_name,
            outcome = outcome.as_str(),
            "Reconciliation complete"
        );
        Ok(None)
    }
}
