//! # PrometheusRule Syncing
//!
//! Creates the generated PrometheusRule or brings an existing one back in line
//! with the AlertRule.

use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::controller::translator::{generated_rule_key, translate};
use crate::crd::{AlertRule, PrometheusRule, ResourceKey};
use crate::observability;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use tracing::info;

/// What the sync step did to the generated PrometheusRule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

/// Result of syncing the generated PrometheusRule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub rule_name: String,
    pub action: SyncAction,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self.action {
            SyncAction::Created => "created",
            SyncAction::Updated => "updated",
            SyncAction::Unchanged => "unchanged",
        }
    }
}

impl Reconciler {
    /// Create or update the PrometheusRule generated from `rule`
    pub(super) async fn sync_generated_rule(
        &self,
        key: &ResourceKey,
        rule: &AlertRule,
    ) -> Result<SyncOutcome, ReconcilerError> {
        let mut desired = translate(key, &rule.spec);
        let owner = rule.controller_owner_ref(&()).ok_or_else(|| {
            ReconcilerError::malformed(key, "AlertRule has no uid, cannot own a PrometheusRule")
        })?;
        desired.metadata.owner_references = Some(vec![owner.clone()]);

        let target = generated_rule_key(key);
        let action = match self.store.get_generated_rule(&target).await {
            Err(e) if e.is_not_found() => {
                self.store.create(desired.into()).await?;
                info!(prometheus_rule = %target.name, "Created PrometheusRule");
                SyncAction::Created
            }
            Err(e) => return Err(e.into()),
            Ok(existing)
                if existing.spec == desired.spec
                    && existing.metadata.labels == desired.metadata.labels
                    && is_owned_by(&existing, &owner) =>
            {
                SyncAction::Unchanged
            }
            Ok(mut existing) => {
                // Only groups, labels and our owner reference are ours; the rest
                // of the stored object is kept
                if !is_owned_by(&existing, &owner) {
                    let refs = existing.metadata.owner_references.get_or_insert_with(Vec::new);
                    refs.retain(|r| r.controller != Some(true));
                    refs.push(owner);
                    info!(prometheus_rule = %target.name, "Adopted PrometheusRule");
                }
                existing.spec = desired.spec;
                existing.metadata.labels = desired.metadata.labels;
                self.store.update(existing.into()).await?;
                info!(prometheus_rule = %target.name, "Updated PrometheusRule");
                SyncAction::Updated
            }
        };

        let outcome = SyncOutcome {
            rule_name: target.name,
            action,
        };
        observability::metrics::increment_generated_rules(outcome.as_str());
        Ok(outcome)
    }
}

/// Whether `rule` carries `owner` as its controller reference
fn is_owned_by(rule: &PrometheusRule, owner: &OwnerReference) -> bool {
    rule.metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| r.uid == owner.uid && r.controller == Some(true)))
}
