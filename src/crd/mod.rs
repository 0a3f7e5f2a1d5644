//! # Custom Resource Definitions
//!
//! CRD types for the AlertRule controller.
//!
//! `AlertRule` is the user-facing source resource. `PrometheusRule` is the
//! Prometheus-operator resource the controller derives from it.

mod prometheus_rule;
mod status;

pub use prometheus_rule::{PrometheusRule, PrometheusRuleSpec, RuleGroup, RuleSpec};
pub use status::{AlertRuleStatus, Condition, RuleState};

use crate::constants;
use kube::CustomResource;
use kube::ResourceExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// AlertRule Custom Resource Definition
///
/// Declares Prometheus alerting rules in a vendor-neutral shape. The controller
/// translates each AlertRule into a `PrometheusRule` named `kneutral-<name>`
/// in the same namespace and keeps it in sync.
///
/// # Example
///
/// ```yaml
/// apiVersion: monitoring.kneutral.io/v1alpha1
/// kind: AlertRule
/// metadata:
///   name: cpu-monitoring
///   namespace: monitoring
/// spec:
///   groups:
///     - name: cpu.rules
///       interval: 30s
///       rules:
///         - alert: HighCPUUsage
///           expr: 100 - (avg by(instance) (irate(node_cpu_seconds_total{mode="idle"}[5m])) * 100) > 80
///           for: 5m
///           labels:
///             severity: warning
/// ```
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "AlertRule",
    group = "monitoring.kneutral.io",
    version = "v1alpha1",
    namespaced,
    status = "AlertRuleStatus",
    shortname = "ar",
    derive = "PartialEq",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}, {"name":"PrometheusRule", "type":"string", "jsonPath":".status.prometheusRuleName"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleSpec {
    /// Alert groups, evaluated in order
    pub groups: Vec<AlertGroup>,
    /// Labels added to the generated PrometheusRule
    /// Operator-identity labels (app.kubernetes.io/managed-by, instance, name) always win
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A named group of alert rules sharing an evaluation interval
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup {
    /// Name of the alert group
    #[schemars(length(min = 1))]
    pub name: String,
    /// How often rules in the group are evaluated (e.g. "30s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Alert rules in this group
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A single alerting rule
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Alert name
    pub alert: String,
    /// PromQL expression to evaluate
    pub expr: String,
    /// How long the expression must hold before the alert fires (e.g. "5m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#for: Option<String>,
    /// Labels to add or override on the alert
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations to add to the alert
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Identity of a namespaced resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl AlertRule {
    /// Identity of this AlertRule, if both name and namespace are set
    pub fn key(&self) -> Option<ResourceKey> {
        Some(ResourceKey::new(
            self.metadata.namespace.clone()?,
            self.metadata.name.clone()?,
        ))
    }

    /// Whether deletion has been requested
    pub fn is_terminating(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Whether the controller finalizer is present
    pub fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == constants::FINALIZER)
    }

    /// Add the controller finalizer; returns false if it was already present
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.finalizers_mut().push(constants::FINALIZER.to_string());
        true
    }

    /// Remove every copy of the controller finalizer; returns false if none was present
    pub fn remove_finalizer(&mut self) -> bool {
        let finalizers = self.finalizers_mut();
        let before = finalizers.len();
        finalizers.retain(|f| f != constants::FINALIZER);
        finalizers.len() != before
    }
}
