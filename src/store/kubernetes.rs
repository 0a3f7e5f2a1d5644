//! # Kubernetes Resource Store
//!
//! `ResourceStore` backed by the Kubernetes API server.

use super::{Kind, Object, ResourceStore, StoreError};
use crate::constants;
use crate::crd::{AlertRule, PrometheusRule};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use std::fmt;

/// Resource store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn alert_rules(&self, namespace: Option<&str>) -> Api<AlertRule> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    fn generated_rules(&self, namespace: Option<&str>) -> Api<PrometheusRule> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

/// Map a kube error onto the store taxonomy
fn map_error(kind: Kind, namespace: &str, name: &str, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(response) => match response.code {
            404 => StoreError::not_found(kind, namespace, name),
            409 if response.reason == "AlreadyExists" => {
                StoreError::already_exists(kind, namespace, name)
            }
            409 => StoreError::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: response.message.clone(),
            },
            429 | 500 | 503 | 504 => StoreError::Unavailable(format!(
                "{} ({}): {}",
                response.reason, response.code, response.message
            )),
            _ => StoreError::Internal(format!(
                "{} ({}): {}",
                response.reason, response.code, response.message
            )),
        },
        kube::Error::SerdeError(e) => StoreError::Serialization(e),
        other => StoreError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(&self, kind: Kind, namespace: &str, name: &str) -> Result<Object, StoreError> {
        let result = match kind {
            Kind::AlertRule => self.alert_rules(Some(namespace)).get(name).await.map(Object::from),
            Kind::GeneratedRule => self
                .generated_rules(Some(namespace))
                .get(name)
                .await
                .map(Object::from),
        };
        result.map_err(|e| map_error(kind, namespace, name, e))
    }

    async fn list(&self, kind: Kind, namespace: Option<&str>) -> Result<Vec<Object>, StoreError> {
        let params = ListParams::default();
        let scope = namespace.unwrap_or("*");
        let mut objects: Vec<Object> = match kind {
            Kind::AlertRule => self
                .alert_rules(namespace)
                .list(&params)
                .await
                .map_err(|e| map_error(kind, scope, "", e))?
                .items
                .into_iter()
                .map(Object::from)
                .collect(),
            Kind::GeneratedRule => self
                .generated_rules(namespace)
                .list(&params)
                .await
                .map_err(|e| map_error(kind, scope, "", e))?
                .items
                .into_iter()
                .map(Object::from)
                .collect(),
        };
        objects.sort_by(|a, b| {
            let (a, b) = (a.meta(), b.meta());
            (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name))
        });
        Ok(objects)
    }

    async fn create(&self, object: Object) -> Result<Object, StoreError> {
        let key = object.key()?;
        let params = PostParams::default();
        let result = match &object {
            Object::AlertRule(rule) => self
                .alert_rules(Some(&key.namespace))
                .create(&params, rule)
                .await
                .map(Object::from),
            Object::GeneratedRule(rule) => self
                .generated_rules(Some(&key.namespace))
                .create(&params, rule)
                .await
                .map(Object::from),
        };
        result.map_err(|e| map_error(object.kind(), &key.namespace, &key.name, e))
    }

    async fn update(&self, object: Object) -> Result<Object, StoreError> {
        let key = object.key()?;
        let params = PostParams::default();
        let result = match &object {
            Object::AlertRule(rule) => self
                .alert_rules(Some(&key.namespace))
                .replace(&key.name, &params, rule)
                .await
                .map(Object::from),
            Object::GeneratedRule(rule) => self
                .generated_rules(Some(&key.namespace))
                .replace(&key.name, &params, rule)
                .await
                .map(Object::from),
        };
        result.map_err(|e| map_error(object.kind(), &key.namespace, &key.name, e))
    }

    async fn delete(&self, kind: Kind, namespace: &str, name: &str) -> Result<(), StoreError> {
        let params = DeleteParams::default();
        let result = match kind {
            Kind::AlertRule => self
                .alert_rules(Some(namespace))
                .delete(name, &params)
                .await
                .map(|_| ()),
            Kind::GeneratedRule => self
                .generated_rules(Some(namespace))
                .delete(name, &params)
                .await
                .map(|_| ()),
        };
        result.map_err(|e| map_error(kind, namespace, name, e))
    }

    async fn update_status(&self, object: Object) -> Result<Object, StoreError> {
        let key = object.key()?;
        let Object::AlertRule(rule) = object else {
            return Err(StoreError::KindMismatch {
                expected: Kind::AlertRule,
                actual: Kind::GeneratedRule,
            });
        };

        let patch = serde_json::json!({
            "status": rule.status
        });

        self.alert_rules(Some(&key.namespace))
            .patch_status(
                &key.name,
                &PatchParams::apply(constants::FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await
            .map(Object::from)
            .map_err(|e| map_error(Kind::AlertRule, &key.namespace, &key.name, e))
    }
}
