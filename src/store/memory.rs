//! # In-Memory Resource Store
//!
//! API-server-like store used in standalone mode and in tests.
//!
//! Mirrors the parts of API server behaviour the reconciler depends on:
//! - server-assigned uid, creation timestamp, generation and resource version
//! - optimistic concurrency on `update` when a resource version is supplied
//! - status only changes through `update_status`
//! - finalizer-gated deletion: objects holding finalizers are only marked
//! - owner-reference garbage collection when an owner is physically removed

use super::{Kind, Object, ResourceStore, StoreError};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type StoreKey = (Kind, String, String);

/// In-memory resource store
///
/// Cloning is cheap and every clone shares the same objects.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    objects: Arc<RwLock<BTreeMap<StoreKey, Object>>>,
    revision: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_resource_version(&self) -> String {
        (self.revision.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Remove an object and garbage-collect everything it owns
    fn remove_with_dependents(objects: &mut BTreeMap<StoreKey, Object>, key: &StoreKey) {
        let Some(removed) = objects.remove(key) else {
            return;
        };
        let Some(uid) = removed.meta().uid.clone() else {
            return;
        };
        let dependents: Vec<StoreKey> = objects
            .iter()
            .filter(|(_, obj)| {
                obj.meta()
                    .owner_references
                    .as_ref()
                    .is_some_and(|refs| refs.iter().any(|r| r.uid == uid))
            })
            .map(|(k, _)| k.clone())
            .collect();
        for dependent in dependents {
            debug!(
                kind = %dependent.0,
                namespace = %dependent.1,
                name = %dependent.2,
                "Garbage-collecting dependent of removed owner"
            );
            Self::remove_with_dependents(objects, &dependent);
        }
    }
}

/// Current time as a Kubernetes `Time`
fn now() -> Result<Time, StoreError> {
    let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    Ok(serde_json::from_value(serde_json::Value::String(stamp))?)
}

fn store_key(object: &Object) -> Result<StoreKey, StoreError> {
    let key = object.key()?;
    Ok((object.kind(), key.namespace, key.name))
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get(&self, kind: Kind, namespace: &str, name: &str) -> Result<Object, StoreError> {
        let objects = self.objects.read().await;
        objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind, namespace, name))
    }

    async fn list(&self, kind: Kind, namespace: Option<&str>) -> Result<Vec<Object>, StoreError> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && namespace.is_none_or(|wanted| wanted == ns))
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(&self, mut object: Object) -> Result<Object, StoreError> {
        let key = store_key(&object)?;
        let mut objects = self.objects.write().await;
        if objects.contains_key(&key) {
            return Err(StoreError::already_exists(key.0, &key.1, &key.2));
        }

        let resource_version = self.next_resource_version();
        let meta = object.meta_mut();
        meta.uid = Some(uuid::Uuid::new_v4().to_string());
        meta.creation_timestamp = Some(now()?);
        meta.generation = Some(1);
        meta.resource_version = Some(resource_version);
        meta.deletion_timestamp = None;
        if let Object::AlertRule(rule) = &mut object {
            rule.status = None;
        }

        objects.insert(key, object.clone());
        Ok(object)
    }

    async fn update(&self, mut object: Object) -> Result<Object, StoreError> {
        let key = store_key(&object)?;
        let mut objects = self.objects.write().await;
        let existing = objects
            .get(&key)
            .ok_or_else(|| StoreError::not_found(key.0, &key.1, &key.2))?;

        let existing_meta = existing.meta();
        if let Some(expected) = object.meta().resource_version.as_deref() {
            if existing_meta.resource_version.as_deref() != Some(expected) {
                return Err(StoreError::Conflict {
                    kind: key.0,
                    namespace: key.1.clone(),
                    name: key.2.clone(),
                    message: format!(
                        "resource version {expected} is stale (current {})",
                        existing_meta.resource_version.as_deref().unwrap_or("none")
                    ),
                });
            }
        }

        let generation = existing_meta.generation.unwrap_or(1);
        let generation = if object.same_spec(existing) {
            generation
        } else {
            generation + 1
        };
        let terminating = existing_meta.deletion_timestamp.is_some();
        let uid = existing_meta.uid.clone();
        let creation_timestamp = existing_meta.creation_timestamp.clone();
        let deletion_timestamp = existing_meta.deletion_timestamp.clone();
        if let (Object::AlertRule(new), Object::AlertRule(old)) = (&mut object, existing) {
            new.status.clone_from(&old.status);
        }

        let resource_version = self.next_resource_version();
        let meta = object.meta_mut();
        meta.uid = uid;
        meta.creation_timestamp = creation_timestamp;
        meta.deletion_timestamp = deletion_timestamp;
        meta.generation = Some(generation);
        meta.resource_version = Some(resource_version);

        if terminating && meta.finalizers.as_ref().is_none_or(Vec::is_empty) {
            debug!(
                kind = %key.0,
                namespace = %key.1,
                name = %key.2,
                "Last finalizer removed from terminating object, removing"
            );
            Self::remove_with_dependents(&mut objects, &key);
        } else {
            objects.insert(key, object.clone());
        }
        Ok(object)
    }

    async fn delete(&self, kind: Kind, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = (kind, namespace.to_string(), name.to_string());
        let mut objects = self.objects.write().await;
        let has_finalizers = objects
            .get(&key)
            .ok_or_else(|| StoreError::not_found(kind, namespace, name))?
            .meta()
            .finalizers
            .as_ref()
            .is_some_and(|f| !f.is_empty());

        if has_finalizers {
            let resource_version = self.next_resource_version();
            let deletion_timestamp = now()?;
            if let Some(object) = objects.get_mut(&key) {
                let meta = object.meta_mut();
                if meta.deletion_timestamp.is_none() {
                    meta.deletion_timestamp = Some(deletion_timestamp);
                    meta.resource_version = Some(resource_version);
                }
            }
            debug!(%kind, namespace, name, "Object holds finalizers, marked for deletion");
        } else {
            Self::remove_with_dependents(&mut objects, &key);
        }
        Ok(())
    }

    async fn update_status(&self, object: Object) -> Result<Object, StoreError> {
        let key = store_key(&object)?;
        let Object::AlertRule(update) = object else {
            return Err(StoreError::KindMismatch {
                expected: Kind::AlertRule,
                actual: key.0,
            });
        };

        let resource_version = self.next_resource_version();
        let mut objects = self.objects.write().await;
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found(key.0, &key.1, &key.2))?;
        if let Object::AlertRule(stored) = stored {
            stored.status = update.status;
            stored.metadata.resource_version = Some(resource_version);
        }
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;
    use crate::crd::{AlertRule, AlertRuleSpec, AlertRuleStatus, PrometheusRule, PrometheusRuleSpec, RuleState};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    fn alert_rule(name: &str) -> AlertRule {
        let mut rule = AlertRule::new(name, AlertRuleSpec::default());
        rule.metadata.namespace = Some("monitoring".to_string());
        rule
    }

    #[tokio::test]
    async fn test_create_assigns_server_fields() {
        let store = InMemoryStore::new();
        let mut rule = alert_rule("a");
        rule.status = Some(AlertRuleStatus {
            state: Some(RuleState::Active),
            ..Default::default()
        });
        let created = store.create(rule.into()).await.unwrap().into_alert_rule().unwrap();
        assert!(created.metadata.uid.is_some());
        assert!(created.metadata.creation_timestamp.is_some());
        assert_eq!(created.metadata.generation, Some(1));
        assert!(created.status.is_none());

        let err = store.create(alert_rule("a").into()).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_get_returns_independent_copy() {
        let store = InMemoryStore::new();
        store.create(alert_rule("a").into()).await.unwrap();
        let key = crate::crd::ResourceKey::new("monitoring", "a");
        let mut copy = store.get_alert_rule(&key).await.unwrap();
        copy.spec.labels.insert("team".to_string(), "x".to_string());
        let again = store.get_alert_rule(&key).await.unwrap();
        assert!(again.spec.labels.is_empty());
    }

    #[tokio::test]
    async fn test_update_bumps_generation_only_on_spec_change() {
        let store = InMemoryStore::new();
        let created = store.create(alert_rule("a").into()).await.unwrap().into_alert_rule().unwrap();

        let mut same = created.clone();
        same.add_finalizer();
        let updated = store.update(same.into()).await.unwrap().into_alert_rule().unwrap();
        assert_eq!(updated.metadata.generation, Some(1));

        let mut changed = updated.clone();
        changed.spec.labels.insert("team".to_string(), "platform".to_string());
        let updated = store.update(changed.into()).await.unwrap().into_alert_rule().unwrap();
        assert_eq!(updated.metadata.generation, Some(2));
    }

    #[tokio::test]
    async fn test_update_rejects_stale_resource_version() {
        let store = InMemoryStore::new();
        let created = store.create(alert_rule("a").into()).await.unwrap().into_alert_rule().unwrap();
        store.update(created.clone().into()).await.unwrap();

        let err = store.update(created.into()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_update_preserves_status_and_update_status_preserves_spec() {
        let store = InMemoryStore::new();
        let created = store.create(alert_rule("a").into()).await.unwrap().into_alert_rule().unwrap();

        let mut with_status = created.clone();
        with_status.spec.labels.insert("ignored".to_string(), "yes".to_string());
        with_status.status = Some(AlertRuleStatus {
            state: Some(RuleState::Active),
            ..Default::default()
        });
        let stored = store
            .update_status(with_status.into())
            .await
            .unwrap()
            .into_alert_rule()
            .unwrap();
        assert!(stored.spec.labels.is_empty());
        assert_eq!(stored.status.as_ref().and_then(|s| s.state), Some(RuleState::Active));

        let mut spec_only = stored.clone();
        spec_only.status = None;
        let stored = store.update(spec_only.into()).await.unwrap().into_alert_rule().unwrap();
        assert_eq!(stored.status.and_then(|s| s.state), Some(RuleState::Active));
    }

    #[tokio::test]
    async fn test_delete_with_finalizer_marks_then_removes() {
        let store = InMemoryStore::new();
        let mut rule = alert_rule("a");
        rule.add_finalizer();
        store.create(rule.into()).await.unwrap();

        store.delete(Kind::AlertRule, "monitoring", "a").await.unwrap();
        let key = crate::crd::ResourceKey::new("monitoring", "a");
        let mut terminating = store.get_alert_rule(&key).await.unwrap();
        assert!(terminating.is_terminating());

        terminating.remove_finalizer();
        store.update(terminating.into()).await.unwrap();
        let err = store.get_alert_rule(&key).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .delete(Kind::GeneratedRule, "monitoring", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_owner_removal_collects_dependents() {
        let store = InMemoryStore::new();
        let owner = store.create(alert_rule("a").into()).await.unwrap();
        let uid = owner.meta().uid.clone().unwrap();

        let mut dependent = PrometheusRule::new("kneutral-a", PrometheusRuleSpec::default());
        dependent.metadata.namespace = Some("monitoring".to_string());
        dependent.metadata.owner_references = Some(vec![OwnerReference {
            api_version: format!("{}/{}", constants::ALERT_RULE_GROUP, constants::ALERT_RULE_VERSION),
            kind: "AlertRule".to_string(),
            name: "a".to_string(),
            uid,
            controller: Some(true),
            block_owner_deletion: Some(true),
        }]);
        store.create(dependent.into()).await.unwrap();

        store.delete(Kind::AlertRule, "monitoring", "a").await.unwrap();
        assert!(store
            .list(Kind::GeneratedRule, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = InMemoryStore::new();
        for (ns, name) in [("b", "y"), ("a", "z"), ("a", "x")] {
            let mut rule = AlertRule::new(name, AlertRuleSpec::default());
            rule.metadata.namespace = Some(ns.to_string());
            store.create(rule.into()).await.unwrap();
        }
        let all = store.list_alert_rules(None).await.unwrap();
        let keys: Vec<_> = all.iter().filter_map(AlertRule::key).map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a/x", "a/z", "b/y"]);
        assert_eq!(store.list_alert_rules(Some("b")).await.unwrap().len(), 1);
        assert!(store.list(Kind::GeneratedRule, None).await.unwrap().is_empty());
    }
}
