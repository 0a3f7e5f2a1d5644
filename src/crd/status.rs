//! # AlertRule Status
//!
//! Status types for tracking reconciliation state and conditions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of the AlertRule resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleStatus {
    /// Conditions represent the latest available observations
    /// At most one entry per condition type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Last reconciliation time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconcile_time: Option<String>,
    /// Name of the generated PrometheusRule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_rule_name: Option<String>,
    /// Summary state; unset until the first successful reconciliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RuleState>,
}

/// Summary state of an AlertRule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum RuleState {
    /// The PrometheusRule exists and matches the AlertRule
    Active,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Generation of the AlertRule this condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Last time the status value changed (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
