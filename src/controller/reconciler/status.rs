//! # Status Management
//!
//! Maintains the AlertRule status block: summary state, generated rule name,
//! last reconcile time and the condition list.
//!
//! The helpers here only mutate the in-memory status; persisting it is the
//! reconciler's job.

use crate::constants;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{AlertRule, AlertRuleStatus, Condition, RuleState};
use tracing::debug;

/// Insert or replace a condition by type
///
/// A condition of the same type is replaced in place, keeping list order.
/// Its transition time is carried over when the status value did not change.
pub fn upsert_condition(status: &mut AlertRuleStatus, mut condition: Condition) {
    match status
        .conditions
        .iter_mut()
        .find(|c| c.r#type == condition.r#type)
    {
        Some(existing) => {
            if existing.status == condition.status && existing.last_transition_time.is_some() {
                condition
                    .last_transition_time
                    .clone_from(&existing.last_transition_time);
            }
            *existing = condition;
        }
        None => status.conditions.push(condition),
    }
}

/// Record a successful reconciliation
pub fn mark_ready(
    status: &mut AlertRuleStatus,
    rule_name: &str,
    generation: Option<i64>,
    now: &str,
) {
    status.last_reconcile_time = Some(now.to_string());
    status.prometheus_rule_name = Some(rule_name.to_string());
    status.state = Some(RuleState::Active);

    upsert_condition(
        status,
        Condition {
            r#type: constants::CONDITION_READY.to_string(),
            status: "True".to_string(),
            observed_generation: generation,
            last_transition_time: Some(now.to_string()),
            reason: Some(constants::REASON_RECONCILE_SUCCESS.to_string()),
            message: Some(format!(
                "PrometheusRule {rule_name} created/updated successfully"
            )),
        },
    );
}

impl Reconciler {
    /// Mark the AlertRule ready and persist its status
    pub(crate) async fn report_ready(
        &self,
        mut rule: AlertRule,
        rule_name: &str,
    ) -> Result<(), ReconcilerError> {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let generation = rule.metadata.generation;
        mark_ready(
            rule.status.get_or_insert_with(AlertRuleStatus::default),
            rule_name,
            generation,
            &now,
        );

        self.store.update_status(rule.into()).await?;
        debug!(prometheus_rule = rule_name, "Status updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(r#type: &str, status: &str, at: &str) -> Condition {
        Condition {
            r#type: r#type.to_string(),
            status: status.to_string(),
            observed_generation: Some(1),
            last_transition_time: Some(at.to_string()),
            reason: Some("Test".to_string()),
            message: None,
        }
    }

    #[test]
    fn test_upsert_appends_new_type() {
        let mut status = AlertRuleStatus::default();
        upsert_condition(&mut status, condition("Ready", "True", "t1"));
        upsert_condition(&mut status, condition("Degraded", "False", "t1"));
        let types: Vec<_> = status.conditions.iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(types, ["Ready", "Degraded"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut status = AlertRuleStatus::default();
        upsert_condition(&mut status, condition("Ready", "True", "t1"));
        upsert_condition(&mut status, condition("Degraded", "False", "t1"));

        let mut replacement = condition("Ready", "False", "t2");
        replacement.reason = Some("Failed".to_string());
        upsert_condition(&mut status, replacement);

        assert_eq!(status.conditions.len(), 2);
        assert_eq!(status.conditions[0].r#type, "Ready");
        assert_eq!(status.conditions[0].status, "False");
        assert_eq!(status.conditions[0].reason.as_deref(), Some("Failed"));
        assert_eq!(status.conditions[0].last_transition_time.as_deref(), Some("t2"));
    }

    #[test]
    fn test_upsert_keeps_transition_time_when_status_unchanged() {
        let mut status = AlertRuleStatus::default();
        upsert_condition(&mut status, condition("Ready", "True", "t1"));
        let mut again = condition("Ready", "True", "t2");
        again.observed_generation = Some(2);
        upsert_condition(&mut status, again);

        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.conditions[0].last_transition_time.as_deref(), Some("t1"));
        assert_eq!(status.conditions[0].observed_generation, Some(2));
    }

    #[test]
    fn test_mark_ready_sets_summary_and_single_condition() {
        let mut status = AlertRuleStatus::default();
        for now in ["t1", "t2", "t3"] {
            mark_ready(&mut status, "kneutral-cpu-monitoring", Some(1), now);
        }

        assert_eq!(status.state, Some(RuleState::Active));
        assert_eq!(status.prometheus_rule_name.as_deref(), Some("kneutral-cpu-monitoring"));
        assert_eq!(status.last_reconcile_time.as_deref(), Some("t3"));
        assert_eq!(status.conditions.len(), 1);
        let ready = &status.conditions[0];
        assert_eq!(ready.status, "True");
        assert_eq!(ready.reason.as_deref(), Some("ReconcileSuccess"));
        assert_eq!(
            ready.message.as_deref(),
            Some("PrometheusRule kneutral-cpu-monitoring created/updated successfully")
        );
    }
}
