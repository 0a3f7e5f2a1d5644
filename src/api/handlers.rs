//! # Handlers
//!
//! Request handlers for the AlertRule CRUD API, probes, metrics and the docs
//! page.
//!
//! Writes only touch the AlertRule; the generated PrometheusRule follows on
//! the next reconciliation.

use crate::api::error::ApiError;
use crate::api::openapi::ENDPOINTS;
use crate::api::validation::validate_alert_rule;
use crate::api::AppState;
use crate::constants;
use crate::crd::{AlertRule, AlertRuleSpec};
use crate::observability;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tracing::info;

/// AlertRule as submitted by API clients
///
/// `apiVersion`, `kind` and `status` are ignored; the namespace always comes
/// from the path.
#[derive(Debug, Deserialize)]
pub struct AlertRuleRequest {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: AlertRuleSpec,
}

fn parse_body(body: Result<Json<AlertRuleRequest>, JsonRejection>) -> Result<AlertRuleRequest, ApiError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn list_response(items: Vec<AlertRule>) -> Json<Value> {
    Json(json!({
        "apiVersion": format!("{}/{}", constants::ALERT_RULE_GROUP, constants::ALERT_RULE_VERSION),
        "kind": "AlertRuleList",
        "items": items,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn readyz(State(state): State<AppState>) -> Response {
    if state.server.is_ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

pub async fn metrics() -> Response {
    match observability::metrics::gather_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal(format!("failed to encode metrics: {e}")).into_response(),
    }
}

const EXAMPLE_RULE: &str = r#"{
    "metadata": {"name": "test-alert"},
    "spec": {
      "groups": [{
        "name": "test.rules",
        "rules": [{
          "alert": "TestAlert",
          "expr": "up == 0",
          "labels": {"severity": "warning"},
          "annotations": {"summary": "Test alert"}
        }]
      }]
    }
  }"#;

/// HTML quick start listing every endpoint
///
/// curl examples use the request's `Host` header.
pub async fn docs(headers: HeaderMap) -> Html<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8090");
    let base = format!("http://{host}");

    let endpoints: String = ENDPOINTS
        .iter()
        .map(|e| {
            format!(
                "<div class=\"endpoint\"><span class=\"method\">{}</span> {}<br><small>{}</small></div>\n",
                e.method, e.path, e.summary
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Kneutral AlertRule API</title>
<style>
body {{ font-family: sans-serif; margin: 40px; line-height: 1.6; }}
.endpoint {{ background: #f8f9fa; padding: 12px; margin: 8px 0; border-left: 4px solid #007bff; }}
.method {{ font-weight: bold; color: #007bff; }}
pre {{ background: #f1f1f1; padding: 10px; overflow-x: auto; }}
</style>
</head>
<body>
<h1>Kneutral AlertRule API</h1>
<p>REST API for managing Prometheus AlertRules</p>
<h2>Quick Start</h2>
<h3>1. Health Check</h3>
<pre>curl {base}/health</pre>
<h3>2. List AlertRules</h3>
<pre>curl {base}/api/v1/alertrules</pre>
<h3>3. Create AlertRule</h3>
<pre>curl -X POST {base}/api/v1/namespaces/monitoring/alertrules \
  -H 'Content-Type: application/json' \
  -d '{EXAMPLE_RULE}'</pre>
<h2>API Endpoints</h2>
{endpoints}<h2>OpenAPI</h2>
<p><a href="/openapi/v2">View OpenAPI JSON</a></p>
</body>
</html>
"#
    ))
}

pub async fn list_all(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let items = state.store.list_alert_rules(None).await?;
    Ok(list_response(items))
}

pub async fn list_namespaced(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let items = state.store.list_alert_rules(Some(&namespace)).await?;
    Ok(list_response(items))
}

pub async fn create(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    body: Result<Json<AlertRuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    let request = parse_body(body)?;
    validate_alert_rule(request.metadata.name.as_deref(), &request.spec)
        .map_err(ApiError::BadRequest)?;

    let mut rule = AlertRule {
        metadata: request.metadata,
        spec: request.spec,
        status: None,
    };
    rule.metadata.namespace = Some(namespace);
    rule.metadata.resource_version = None;

    let created = state.store.create(rule.into()).await?.into_alert_rule()?;
    info!(
        resource.namespace = created.metadata.namespace.as_deref().unwrap_or_default(),
        resource.name = created.metadata.name.as_deref().unwrap_or_default(),
        "AlertRule created via API"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<AlertRule>, ApiError> {
    let key = crate::crd::ResourceKey::new(namespace, name);
    Ok(Json(state.store.get_alert_rule(&key).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    body: Result<Json<AlertRuleRequest>, JsonRejection>,
) -> Result<Json<AlertRule>, ApiError> {
    let request = parse_body(body)?;
    validate_alert_rule(Some(&name), &request.spec).map_err(ApiError::BadRequest)?;

    let key = crate::crd::ResourceKey::new(namespace, name);
    let mut existing = state.store.get_alert_rule(&key).await?;
    existing.spec = request.spec;

    let updated = state.store.update(existing.into()).await?.into_alert_rule()?;
    info!(resource.namespace = %key.namespace, resource.name = %key.name, "AlertRule updated via API");
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete(crate::store::Kind::AlertRule, &namespace, &name)
        .await?;
    info!(resource.namespace = %namespace, resource.name = %name, "AlertRule deletion requested via API");
    Ok(StatusCode::NO_CONTENT)
}
