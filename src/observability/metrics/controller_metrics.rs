//! # Controller Metrics
//!
//! Metrics for controller operations: reconciliations, generated PrometheusRules
//! and requeues.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec};
use std::sync::LazyLock;

// Reconciliation metrics
static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "alertrule_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "alertrule_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "alertrule_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

// Generated PrometheusRule metrics
static GENERATED_RULES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "alertrule_generated_rules_total",
            "Operations on generated PrometheusRules",
        ),
        &["operation"],
    )
    .expect("Failed to create GENERATED_RULES_TOTAL metric - this should never happen")
});

// Requeue metrics
static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "alertrule_requeues_total",
            "Total number of reconciliation requeues",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register controller metrics with the registry
pub(crate) fn register_controller_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(GENERATED_RULES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

// Public functions for controller metrics

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// Count an operation (`created`, `updated`, `unchanged`, `deleted`) on a generated PrometheusRule
pub fn increment_generated_rules(operation: &str) {
    GENERATED_RULES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        let after = RECONCILIATIONS_TOTAL.get();
        assert!(after > before);
    }

    #[test]
    fn test_increment_reconciliation_errors_by_reason() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["test-reason"])
            .get();
        increment_reconciliation_errors("test-reason");
        let after = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["test-reason"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(0.02);
        assert!(RECONCILIATION_DURATION.get_sample_count() > before);
    }

    #[test]
    fn test_increment_generated_rules() {
        let before = GENERATED_RULES_TOTAL.with_label_values(&["test-op"]).get();
        increment_generated_rules("test-op");
        increment_generated_rules("test-op");
        let after = GENERATED_RULES_TOTAL.with_label_values(&["test-op"]).get();
        assert_eq!(after, before + 2u64);
    }

    #[test]
    fn test_increment_requeues_total() {
        let before = REQUEUES_TOTAL.with_label_values(&["test-requeue"]).get();
        increment_requeues_total("test-requeue");
        let after = REQUEUES_TOTAL.with_label_values(&["test-requeue"]).get();
        assert_eq!(after, before + 1u64);
    }
}
