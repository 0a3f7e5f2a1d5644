//! # Resource Store
//!
//! Object repository the reconciler and the HTTP facade work against.
//!
//! The domain has exactly two kinds, so objects travel as the closed
//! [`Object`] union and are addressed by [`Kind`] plus namespace and name.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`] - API-server-like fake used in standalone mode and tests
//! - [`kubernetes::KubeStore`] - Kubernetes API via `kube::Api`

pub mod kubernetes;
pub mod memory;

use crate::crd::{AlertRule, PrometheusRule, ResourceKey};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::fmt;
use thiserror::Error;

pub use kubernetes::KubeStore;
pub use memory::InMemoryStore;

/// Resource kinds handled by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Source resource
    AlertRule,
    /// Derived resource
    GeneratedRule,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::AlertRule => "AlertRule",
            Kind::GeneratedRule => "PrometheusRule",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object of one of the two kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    AlertRule(AlertRule),
    GeneratedRule(PrometheusRule),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::AlertRule(_) => Kind::AlertRule,
            Object::GeneratedRule(_) => Kind::GeneratedRule,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Object::AlertRule(o) => &o.metadata,
            Object::GeneratedRule(o) => &o.metadata,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Object::AlertRule(o) => &mut o.metadata,
            Object::GeneratedRule(o) => &mut o.metadata,
        }
    }

    /// Namespace and name; both are required by every store operation
    pub fn key(&self) -> Result<ResourceKey, StoreError> {
        let meta = self.meta();
        let namespace = meta
            .namespace
            .clone()
            .ok_or(StoreError::MissingMetadata("namespace"))?;
        let name = meta
            .name
            .clone()
            .ok_or(StoreError::MissingMetadata("name"))?;
        Ok(ResourceKey::new(namespace, name))
    }

    /// Whether the spec portion of two objects of the same kind is equal
    pub(crate) fn same_spec(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::AlertRule(a), Object::AlertRule(b)) => a.spec == b.spec,
            (Object::GeneratedRule(a), Object::GeneratedRule(b)) => a.spec == b.spec,
            _ => false,
        }
    }

    pub fn into_alert_rule(self) -> Result<AlertRule, StoreError> {
        match self {
            Object::AlertRule(o) => Ok(o),
            other => Err(StoreError::KindMismatch {
                expected: Kind::AlertRule,
                actual: other.kind(),
            }),
        }
    }

    pub fn into_generated_rule(self) -> Result<PrometheusRule, StoreError> {
        match self {
            Object::GeneratedRule(o) => Ok(o),
            other => Err(StoreError::KindMismatch {
                expected: Kind::GeneratedRule,
                actual: other.kind(),
            }),
        }
    }
}

impl From<AlertRule> for Object {
    fn from(value: AlertRule) -> Self {
        Object::AlertRule(value)
    }
}

impl From<PrometheusRule> for Object {
    fn from(value: PrometheusRule) -> Self {
        Object::GeneratedRule(value)
    }
}

/// Resource store errors
///
/// `NotFound`, `AlreadyExists` and `Canceled` are always distinguishable so
/// callers can absorb the expected ones and surface the rest.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: Kind,
        namespace: String,
        name: String,
    },
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: Kind,
        namespace: String,
        name: String,
    },
    #[error("conflict writing {kind} {namespace}/{name}: {message}")]
    Conflict {
        kind: Kind,
        namespace: String,
        name: String,
        message: String,
    },
    #[error("resource store unavailable: {0}")]
    Unavailable(String),
    #[error("resource store operation canceled")]
    Canceled,
    #[error("expected {expected}, got {actual}")]
    KindMismatch { expected: Kind, actual: Kind },
    #[error("object is missing metadata.{0}")]
    MissingMetadata(&'static str),
    #[error("failed to serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("resource store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: Kind, namespace: &str, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn already_exists(kind: Kind, namespace: &str, name: &str) -> Self {
        StoreError::AlreadyExists {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Errors worth retrying after a re-fetch or a backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::Unavailable(_) | StoreError::Canceled
        )
    }
}

/// Object repository keyed by (kind, namespace, name)
///
/// Every returned object is an independent value; mutating it never changes
/// stored state until it is written back. Writes are visible to the next read.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, kind: Kind, namespace: &str, name: &str) -> Result<Object, StoreError>;

    /// Objects of `kind`, ordered by namespace then name; `None` spans all namespaces
    async fn list(&self, kind: Kind, namespace: Option<&str>) -> Result<Vec<Object>, StoreError>;

    async fn create(&self, object: Object) -> Result<Object, StoreError>;

    /// Replace metadata and spec; status is left untouched
    async fn update(&self, object: Object) -> Result<Object, StoreError>;

    /// Request deletion; objects holding finalizers are only marked
    async fn delete(&self, kind: Kind, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Replace status only
    async fn update_status(&self, object: Object) -> Result<Object, StoreError>;

    async fn get_alert_rule(&self, key: &ResourceKey) -> Result<AlertRule, StoreError> {
        self.get(Kind::AlertRule, &key.namespace, &key.name)
            .await?
            .into_alert_rule()
    }

    async fn get_generated_rule(&self, key: &ResourceKey) -> Result<PrometheusRule, StoreError> {
        self.get(Kind::GeneratedRule, &key.namespace, &key.name)
            .await?
            .into_generated_rule()
    }

    async fn list_alert_rules(&self, namespace: Option<&str>) -> Result<Vec<AlertRule>, StoreError> {
        self.list(Kind::AlertRule, namespace)
            .await?
            .into_iter()
            .map(Object::into_alert_rule)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AlertRuleSpec, PrometheusRuleSpec};

    #[test]
    fn test_object_kind_and_conversion() {
        let obj = Object::from(AlertRule::new("a", AlertRuleSpec::default()));
        assert_eq!(obj.kind(), Kind::AlertRule);
        let err = obj.into_generated_rule().unwrap_err();
        assert!(matches!(
            err,
            StoreError::KindMismatch {
                expected: Kind::GeneratedRule,
                actual: Kind::AlertRule
            }
        ));
    }

    #[test]
    fn test_key_requires_namespace() {
        let obj = Object::from(PrometheusRule::new("kneutral-a", PrometheusRuleSpec::default()));
        assert!(matches!(
            obj.key(),
            Err(StoreError::MissingMetadata("namespace"))
        ));
    }

    #[test]
    fn test_error_classification() {
        let nf = StoreError::not_found(Kind::AlertRule, "ns", "a");
        assert!(nf.is_not_found());
        assert!(!nf.is_transient());
        assert_eq!(nf.to_string(), "AlertRule ns/a not found");
        assert!(StoreError::Canceled.is_transient());
        assert!(!StoreError::Canceled.is_not_found());
        assert!(StoreError::already_exists(Kind::GeneratedRule, "ns", "b").is_already_exists());
    }
}
