//! # Finalizer Handling
//!
//! Adding the controller finalizer to live AlertRules and running cleanup
//! before releasing it from terminating ones.

use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::controller::translator::generated_rule_key;
use crate::crd::{AlertRule, ResourceKey};
use crate::observability;
use crate::store::Kind;
use std::time::Duration;
use tracing::{debug, info};

impl Reconciler {
    /// Ensure the finalizer is present, returning the AlertRule as stored
    ///
    /// Subsequent writes in the same pass build on the returned object so they
    /// carry its fresh resource version.
    pub(super) async fn ensure_finalizer(
        &self,
        mut rule: AlertRule,
    ) -> Result<AlertRule, ReconcilerError> {
        if !rule.add_finalizer() {
            return Ok(rule);
        }

        let updated = self.store.update(rule.into()).await?.into_alert_rule()?;
        info!("Added finalizer");
        Ok(updated)
    }

    /// Delete the generated PrometheusRule and release the finalizer
    ///
    /// The finalizer is only removed once the PrometheusRule is confirmed gone,
    /// so a failed delete leaves the AlertRule blocked for the next pass.
    pub(super) async fn finalize(
        &self,
        key: &ResourceKey,
        mut rule: AlertRule,
    ) -> Result<Option<Duration>, ReconcilerError> {
        if !rule.has_finalizer() {
            debug!("Finalizer already released");
            return Ok(None);
        }

        let target = generated_rule_key(key);
        match self
            .store
            .delete(Kind::GeneratedRule, &target.namespace, &target.name)
            .await
        {
            Ok(()) => {
                info!(prometheus_rule = %target.name, "Deleted PrometheusRule");
                observability::metrics::increment_generated_rules("deleted");
            }
            Err(e) if e.is_not_found() => {
                debug!(prometheus_rule = %target.name, "PrometheusRule already gone");
            }
            Err(e) => return Err(e.into()),
        }

        rule.remove_finalizer();
        self.store.update(rule.into()).await?;
        info!("Removed finalizer");
        Ok(None)
    }
}
