//! Shared test helpers: a recording, fault-injecting resource store and
//! AlertRule builders.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use alertrule_controller::crd::{AlertGroup, AlertRule, AlertRuleSpec, ResourceKey, Rule};
use alertrule_controller::store::{InMemoryStore, Kind, Object, ResourceStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Store operation, as recorded by [`RecordingStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    List,
    Create,
    Update,
    Delete,
    UpdateStatus,
}

impl Op {
    pub fn is_write(self) -> bool {
        !matches!(self, Op::Get | Op::List)
    }
}

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub kind: Kind,
    pub namespace: String,
    pub name: String,
}

struct Fault {
    op: Op,
    kind: Kind,
    error: fn() -> StoreError,
}

/// Wraps an [`InMemoryStore`], recording every call and failing on demand
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryStore,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Vec<Fault>>,
    strip_uid: Mutex<bool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `op` on `kind` with `error`; the call is not forwarded
    pub fn fail_next(&self, op: Op, kind: Kind, error: fn() -> StoreError) {
        self.faults.lock().unwrap().push(Fault { op, kind, error });
    }

    /// Hide uids on AlertRules handed to the caller
    pub fn strip_uids(&self, strip: bool) {
        *self.strip_uid.lock().unwrap() = strip;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Recorded writes, optionally restricted to one kind
    pub fn writes(&self, kind: Option<Kind>) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.op.is_write() && kind.is_none_or(|k| k == c.kind))
            .collect()
    }

    fn record(&self, op: Op, kind: Kind, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(Call {
            op,
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let mut faults = self.faults.lock().unwrap();
        if let Some(pos) = faults.iter().position(|f| f.op == op && f.kind == kind) {
            let fault = faults.remove(pos);
            return Err((fault.error)());
        }
        Ok(())
    }

    fn present(&self, mut object: Object) -> Object {
        if *self.strip_uid.lock().unwrap() {
            if let Object::AlertRule(rule) = &mut object {
                rule.metadata.uid = None;
            }
        }
        object
    }
}

fn names(object: &Object) -> (String, String) {
    let meta = object.meta();
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

#[async_trait]
impl ResourceStore for RecordingStore {
    async fn get(&self, kind: Kind, namespace: &str, name: &str) -> Result<Object, StoreError> {
        self.record(Op::Get, kind, namespace, name)?;
        self.inner.get(kind, namespace, name).await.map(|o| self.present(o))
    }

    async fn list(&self, kind: Kind, namespace: Option<&str>) -> Result<Vec<Object>, StoreError> {
        self.record(Op::List, kind, namespace.unwrap_or(""), "")?;
        self.inner.list(kind, namespace).await
    }

    async fn create(&self, object: Object) -> Result<Object, StoreError> {
        let (namespace, name) = names(&object);
        self.record(Op::Create, object.kind(), &namespace, &name)?;
        self.inner.create(object).await
    }

    async fn update(&self, object: Object) -> Result<Object, StoreError> {
        let (namespace, name) = names(&object);
        self.record(Op::Update, object.kind(), &namespace, &name)?;
        self.inner.update(object).await.map(|o| self.present(o))
    }

    async fn delete(&self, kind: Kind, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.record(Op::Delete, kind, namespace, name)?;
        self.inner.delete(kind, namespace, name).await
    }

    async fn update_status(&self, object: Object) -> Result<Object, StoreError> {
        let (namespace, name) = names(&object);
        self.record(Op::UpdateStatus, object.kind(), &namespace, &name)?;
        self.inner.update_status(object).await
    }
}

pub fn unavailable() -> StoreError {
    StoreError::Unavailable("injected outage".to_string())
}

pub fn conflict() -> StoreError {
    StoreError::Conflict {
        kind: Kind::AlertRule,
        namespace: "injected".to_string(),
        name: "injected".to_string(),
        message: "injected conflict".to_string(),
    }
}

fn labels<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The `monitoring/cpu-monitoring` AlertRule with a single warning rule
pub fn cpu_monitoring(threshold: u32) -> AlertRule {
    let mut rule = AlertRule::new(
        "cpu-monitoring",
        AlertRuleSpec {
            groups: vec![AlertGroup {
                name: "cpu.rules".to_string(),
                interval: Some("30s".to_string()),
                rules: vec![Rule {
                    alert: "HighCPUUsage".to_string(),
                    expr: format!(
                        r#"100 - (avg by(instance) (irate(node_cpu_seconds_total{{mode="idle"}}[5m])) * 100) > {threshold}"#
                    ),
                    r#for: Some("5m".to_string()),
                    labels: labels([("severity", "warning")]),
                    annotations: labels([("summary", "High CPU usage on {{ $labels.instance }}")]),
                }],
            }],
            labels: BTreeMap::new(),
        },
    );
    rule.metadata.namespace = Some("monitoring".to_string());
    rule
}

pub fn cpu_key() -> ResourceKey {
    ResourceKey::new("monitoring", "cpu-monitoring")
}

pub fn generated_cpu_key() -> ResourceKey {
    ResourceKey::new("monitoring", "kneutral-cpu-monitoring")
}
