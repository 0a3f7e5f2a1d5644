//! # Resync Loop
//!
//! Standalone trigger layer: periodically reconciles every AlertRule in the
//! store. Used with the in-memory store, where there is no watch stream.

use crate::observability;
use crate::runtime::context::ControllerContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconcile every AlertRule once, sequentially
///
/// Failures are logged and counted but never abort the sweep. Returns the
/// number of AlertRules that failed.
pub async fn resync_once(ctx: &ControllerContext) -> usize {
    let rules = match ctx
        .reconciler
        .store()
        .list_alert_rules(ctx.config.watch_namespace.as_deref())
        .await
    {
        Ok(rules) => rules,
        Err(e) => {
            warn!(error = %e, "Failed to list AlertRules for resync");
            return 0;
        }
    };

    let mut failed = 0;
    for rule in &rules {
        let Some(key) = rule.key() else {
            continue;
        };
        match ctx.reconciler.reconcile(&key).await {
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                observability::metrics::increment_requeues_total("resync");
                warn!(resource = %key, error = %e, "Reconcile failed, retrying on next resync");
            }
        }
    }

    debug!(total = rules.len(), failed, "Resync complete");
    failed
}

/// Resync every `RESYNC_INTERVAL_SECS` until ctrl-c
pub async fn run_resync_loop(ctx: Arc<ControllerContext>) {
    let mut interval = tokio::time::interval(ctx.config.resync_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(
        "Starting standalone resync loop (every {}s)",
        ctx.config.resync_interval().as_secs()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                resync_once(&ctx).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping resync loop");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::controller::Reconciler;
    use crate::crd::ResourceKey;
    use crate::fixtures;
    use crate::runtime::watch_loop::reconcile_alert_rule;
    use crate::store::{InMemoryStore, ResourceStore};
    use kube_runtime::controller::Action;

    async fn context(namespace: Option<&str>) -> (InMemoryStore, Arc<ControllerContext>) {
        let store = InMemoryStore::new();
        fixtures::populate(&store).await.unwrap();
        let config = ControllerConfig {
            watch_namespace: namespace.map(str::to_string),
            ..Default::default()
        };
        let ctx = ControllerContext::new(Reconciler::new(Arc::new(store.clone())), config);
        (store, Arc::new(ctx))
    }

    #[tokio::test]
    async fn test_resync_reconciles_every_alert_rule() {
        let (store, ctx) = context(None).await;
        assert_eq!(resync_once(&ctx).await, 0);

        for name in ["cpu-monitoring", "app-performance", "arista-dom-monitoring"] {
            let rules = store.list_alert_rules(None).await.unwrap();
            let rule = rules
                .iter()
                .find(|r| r.metadata.name.as_deref() == Some(name))
                .unwrap();
            let key = rule.key().unwrap();
            let generated = crate::controller::translator::generated_rule_key(&key);
            assert!(store.get_generated_rule(&generated).await.is_ok(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_resync_honours_watch_namespace() {
        let (store, ctx) = context(Some("network")).await;
        resync_once(&ctx).await;

        let network = ResourceKey::new("network", "kneutral-arista-dom-monitoring");
        let monitoring = ResourceKey::new("monitoring", "kneutral-cpu-monitoring");
        assert!(store.get_generated_rule(&network).await.is_ok());
        assert!(store.get_generated_rule(&monitoring).await.is_err());
    }

    #[tokio::test]
    async fn test_adapter_awaits_change_and_resets_backoff() {
        let (store, ctx) = context(None).await;
        let key = ResourceKey::new("monitoring", "cpu-monitoring");
        ctx.next_backoff(&key);
        ctx.next_backoff(&key);

        let rule = store.get_alert_rule(&key).await.unwrap();
        let action = reconcile_alert_rule(Arc::new(rule), Arc::clone(&ctx))
            .await
            .unwrap();

        assert_eq!(action, Action::await_change());
        assert!(ctx.backoff_states.lock().unwrap().is_empty());
    }
}
