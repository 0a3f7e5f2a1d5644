//! # Request Validation
//!
//! Checks applied to AlertRules submitted through the HTTP facade before they
//! reach the store. The reconciler itself never validates expressions.

use crate::crd::AlertRuleSpec;
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a DNS-1123 subdomain
const MAX_NAME_LEN: usize = 253;

static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("Failed to compile DNS subdomain regex - this should never happen")
});

// Prometheus duration grammar, units in descending order, e.g. "1h30m", "15s", "500ms"
static PROMETHEUS_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([0-9]+)y)?(([0-9]+)w)?(([0-9]+)d)?(([0-9]+)h)?(([0-9]+)m)?(([0-9]+)s)?(([0-9]+)ms)?$")
        .expect("Failed to compile duration regex - this should never happen")
});

/// Whether `name` is a valid DNS-1123 subdomain
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && DNS_SUBDOMAIN.is_match(name)
}

/// Whether `value` is a Prometheus duration; "0" is accepted
pub fn is_valid_duration(value: &str) -> bool {
    value == "0" || (!value.is_empty() && PROMETHEUS_DURATION.is_match(value))
}

/// Validate a submitted AlertRule, returning the first problem found
pub fn validate_alert_rule(name: Option<&str>, spec: &AlertRuleSpec) -> Result<(), String> {
    let name = name.ok_or_else(|| "metadata.name is required".to_string())?;
    if !is_valid_name(name) {
        return Err(format!(
            "metadata.name {name:?} must be a lowercase RFC 1123 subdomain"
        ));
    }

    if spec.groups.is_empty() {
        return Err("spec.groups must contain at least one group".to_string());
    }

    for (i, group) in spec.groups.iter().enumerate() {
        if group.name.trim().is_empty() {
            return Err(format!("spec.groups[{i}].name is required"));
        }
        if let Some(interval) = group.interval.as_deref().filter(|v| !v.is_empty()) {
            if !is_valid_duration(interval) {
                return Err(format!(
                    "spec.groups[{i}].interval {interval:?} is not a valid duration"
                ));
            }
        }
        for (j, rule) in group.rules.iter().enumerate() {
            if rule.alert.trim().is_empty() {
                return Err(format!("spec.groups[{i}].rules[{j}].alert is required"));
            }
            if let Some(pending) = rule.r#for.as_deref().filter(|v| !v.is_empty()) {
                if !is_valid_duration(pending) {
                    return Err(format!(
                        "spec.groups[{i}].rules[{j}].for {pending:?} is not a valid duration"
                    ));
                }
            }
        }
    }

    Ok(())
}
