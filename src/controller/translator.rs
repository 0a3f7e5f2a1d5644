//! # Translator
//!
//! Pure translation of an AlertRule spec into the PrometheusRule the
//! controller owns.
//!
//! The naming and labelling rules live here so the reconciler, the HTTP
//! facade and the tests all derive the same names.

use crate::constants;
use crate::crd::{AlertRuleSpec, PrometheusRule, PrometheusRuleSpec, ResourceKey, RuleGroup, RuleSpec};
use std::collections::BTreeMap;

/// Name of the PrometheusRule generated for an AlertRule
pub fn generated_rule_name(source_name: &str) -> String {
    format!("{}{}", constants::GENERATED_RULE_PREFIX, source_name)
}

/// Identity of the PrometheusRule generated for an AlertRule
pub fn generated_rule_key(source: &ResourceKey) -> ResourceKey {
    ResourceKey::new(source.namespace.clone(), generated_rule_name(&source.name))
}

/// Operator-identity labels placed on every generated PrometheusRule
pub fn operator_identity_labels(source_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            constants::LABEL_MANAGED_BY.to_string(),
            constants::MANAGED_BY_VALUE.to_string(),
        ),
        (
            constants::LABEL_INSTANCE.to_string(),
            constants::INSTANCE_VALUE.to_string(),
        ),
        (constants::LABEL_NAME.to_string(), source_name.to_string()),
    ])
}

/// Translate an AlertRule into its PrometheusRule
///
/// Total and deterministic. The owner reference is left to the caller since it
/// needs the stored AlertRule's uid. Expressions are not validated.
pub fn translate(source: &ResourceKey, spec: &AlertRuleSpec) -> PrometheusRule {
    let mut labels = spec.labels.clone();
    // Operator-identity labels are inserted last so user labels cannot override them
    labels.extend(operator_identity_labels(&source.name));

    let groups = spec
        .groups
        .iter()
        .map(|group| RuleGroup {
            name: group.name.clone(),
            interval: non_empty(group.interval.as_deref()),
            rules: group
                .rules
                .iter()
                .map(|rule| RuleSpec {
                    alert: rule.alert.clone(),
                    expr: rule.expr.clone(),
                    r#for: non_empty(rule.r#for.as_deref()),
                    labels: rule.labels.clone(),
                    annotations: rule.annotations.clone(),
                })
                .collect(),
        })
        .collect();

    let mut generated = PrometheusRule::new(
        &generated_rule_name(&source.name),
        PrometheusRuleSpec { groups },
    );
    generated.metadata.namespace = Some(source.namespace.clone());
    generated.metadata.labels = Some(labels);
    generated
}

/// Empty durations are absent, never emitted as ""
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
