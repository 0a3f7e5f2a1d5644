//! # Example AlertRules
//!
//! Sample AlertRules loaded into the in-memory store in standalone mode.

use crate::crd::{AlertGroup, AlertRule, AlertRuleSpec, Rule};
use crate::store::{ResourceStore, StoreError};
use std::collections::BTreeMap;
use tracing::info;

fn map<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn alert_rule(
    namespace: &str,
    name: &str,
    labels: BTreeMap<String, String>,
    spec: AlertRuleSpec,
) -> AlertRule {
    let mut rule = AlertRule::new(name, spec);
    rule.metadata.namespace = Some(namespace.to_string());
    rule.metadata.labels = Some(labels);
    rule
}

/// Basic CPU monitoring
pub fn cpu_monitoring() -> AlertRule {
    alert_rule(
        "monitoring",
        "cpu-monitoring",
        map([("category", "infrastructure"), ("team", "platform")]),
        AlertRuleSpec {
            groups: vec![AlertGroup {
                name: "cpu.rules".to_string(),
                interval: Some("30s".to_string()),
                rules: vec![
                    Rule {
                        alert: "HighCPUUsage".to_string(),
                        expr: r#"100 - (avg by(instance) (irate(node_cpu_seconds_total{mode="idle"}[5m])) * 100) > 80"#.to_string(),
                        r#for: Some("5m".to_string()),
                        labels: map([("severity", "warning")]),
                        annotations: map([
                            ("summary", "High CPU usage on {{ $labels.instance }}"),
                            (
                                "description",
                                r#"CPU usage is {{ $value | printf "%.2f" }}% for more than 5 minutes"#,
                            ),
                        ]),
                    },
                    Rule {
                        alert: "CriticalCPUUsage".to_string(),
                        expr: r#"100 - (avg by(instance) (irate(node_cpu_seconds_total{mode="idle"}[5m])) * 100) > 95"#.to_string(),
                        r#for: Some("2m".to_string()),
                        labels: map([("severity", "critical")]),
                        annotations: map([
                            ("summary", "Critical CPU usage on {{ $labels.instance }}"),
                            (
                                "description",
                                r#"CPU usage is {{ $value | printf "%.2f" }}% - immediate action required"#,
                            ),
                        ]),
                    },
                ],
            }],
            labels: BTreeMap::new(),
        },
    )
}

/// Application latency and error rate monitoring
pub fn app_performance() -> AlertRule {
    alert_rule(
        "production",
        "app-performance",
        map([("category", "application"), ("team", "backend")]),
        AlertRuleSpec {
            groups: vec![
                AlertGroup {
                    name: "app.response_time".to_string(),
                    interval: Some("15s".to_string()),
                    rules: vec![Rule {
                        alert: "HighResponseTime".to_string(),
                        expr: "histogram_quantile(0.95, rate(http_request_duration_seconds_bucket[5m])) > 2".to_string(),
                        r#for: Some("5m".to_string()),
                        labels: map([("severity", "warning"), ("service", "{{ $labels.service }}")]),
                        annotations: map([
                            ("summary", "High response time for {{ $labels.service }}"),
                            (
                                "description",
                                r#"95th percentile response time is {{ $value | printf "%.3f" }}s"#,
                            ),
                            ("grafana_url", "https://grafana.company.com/d/app-performance"),
                        ]),
                    }],
                },
                AlertGroup {
                    name: "app.error_rate".to_string(),
                    interval: Some("30s".to_string()),
                    rules: vec![Rule {
                        alert: "HighErrorRate".to_string(),
                        expr: r#"rate(http_requests_total{status=~"5.."}[5m]) / rate(http_requests_total[5m]) > 0.05"#.to_string(),
                        r#for: Some("3m".to_string()),
                        labels: map([("severity", "warning"), ("service", "{{ $labels.service }}")]),
                        annotations: map([
                            ("summary", "High error rate for {{ $labels.service }}"),
                            ("description", "Error rate is {{ $value | humanizePercentage }}"),
                        ]),
                    }],
                },
            ],
            labels: BTreeMap::new(),
        },
    )
}

const DOM_RX_POWER_EXPR: &str = r#"(
  10 * log10(arista_smnp_entSensorValue{entPhysicalDescr=~"DOM RX Power.*"} / 1000)
  < on(desc, entPhysicalDescr) group_left
  10 * log10(arista_smnp_aristaSensorThresholdLowCritical{entPhysicalDescr=~"DOM RX Power.*"} / 1000)
)
and
(
  10 * log10(arista_smnp_entSensorValue{entPhysicalDescr=~"DOM RX Power.*"} / 1000) != -30
)"#;

const DOM_RX_POWER_DESCRIPTION: &str = r#"DOM RX Power is below low critical threshold
Device: {{ $labels.desc }}
Site: {{ $labels.site }}
Role: {{ $labels.role }}
Location: {{ $labels.location }}
Interface: {{ $labels.entPhysicalDescr }}
Current Power: {{ $value | printf "%.2f" }} dBm"#;

/// Optical DOM receive power on Arista switches
pub fn arista_dom_monitoring() -> AlertRule {
    alert_rule(
        "network",
        "arista-dom-monitoring",
        map([("category", "network"), ("vendor", "arista"), ("type", "optical")]),
        AlertRuleSpec {
            groups: vec![AlertGroup {
                name: "kneutral.arista.dom".to_string(),
                interval: None,
                rules: vec![Rule {
                    alert: "LowDOMRXPowerCritical".to_string(),
                    expr: DOM_RX_POWER_EXPR.to_string(),
                    r#for: Some("5m".to_string()),
                    labels: map([("severity", "critical"), ("source", "kneutral")]),
                    annotations: map([
                        (
                            "summary",
                            "Critical: Low DOM RX Power on {{ $labels.entPhysicalDescr }} at {{ $labels.desc }}",
                        ),
                        ("description", DOM_RX_POWER_DESCRIPTION),
                        (
                            "grafanaUrl",
                            "https://mon.monitor.driveuc.com/d/arista-interfaces/arista-network-interfaces",
                        ),
                    ]),
                }],
            }],
            labels: map([("app.kubernetes.io/instance", "kneutral")]),
        },
    )
}

/// All example AlertRules
pub fn example_alert_rules() -> Vec<AlertRule> {
    vec![cpu_monitoring(), app_performance(), arista_dom_monitoring()]
}

/// Create the example AlertRules, skipping any that already exist
pub async fn populate(store: &dyn ResourceStore) -> Result<usize, StoreError> {
    let mut created = 0;
    for rule in example_alert_rules() {
        match store.create(rule.into()).await {
            Ok(_) => created += 1,
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e),
        }
    }
    info!("Loaded {} example AlertRules", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::validate_alert_rule;
    use crate::store::InMemoryStore;

    #[test]
    fn test_examples_pass_api_validation() {
        for rule in example_alert_rules() {
            assert_eq!(
                validate_alert_rule(rule.metadata.name.as_deref(), &rule.spec),
                Ok(()),
                "{:?}",
                rule.metadata.name
            );
        }
    }

    #[tokio::test]
    async fn test_populate_is_repeatable() {
        let store = InMemoryStore::new();
        assert_eq!(populate(&store).await.unwrap(), 3);
        assert_eq!(populate(&store).await.unwrap(), 0);
        assert_eq!(store.list_alert_rules(None).await.unwrap().len(), 3);
    }
}
