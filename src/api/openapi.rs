//! # OpenAPI
//!
//! Swagger 2.0 style document describing the AlertRule API, built from the
//! CRD's generated schema.

use crate::constants;
use crate::crd::AlertRule;
use axum::response::Json;
use kube::CustomResourceExt;
use serde_json::{json, Map, Value};

/// A documented HTTP endpoint
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
}

/// Every route served by the API, in display order
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint { method: "GET", path: "/health", summary: "Check API health status" },
    Endpoint { method: "GET", path: "/readyz", summary: "Check whether the server is ready" },
    Endpoint { method: "GET", path: "/metrics", summary: "Prometheus metrics" },
    Endpoint {
        method: "GET",
        path: "/api/v1/alertrules",
        summary: "List AlertRules in all namespaces",
    },
    Endpoint {
        method: "GET",
        path: "/api/v1/namespaces/{namespace}/alertrules",
        summary: "List AlertRules in a namespace",
    },
    Endpoint {
        method: "POST",
        path: "/api/v1/namespaces/{namespace}/alertrules",
        summary: "Create an AlertRule",
    },
    Endpoint {
        method: "GET",
        path: "/api/v1/namespaces/{namespace}/alertrules/{name}",
        summary: "Get an AlertRule",
    },
    Endpoint {
        method: "PUT",
        path: "/api/v1/namespaces/{namespace}/alertrules/{name}",
        summary: "Replace the spec of an AlertRule",
    },
    Endpoint {
        method: "DELETE",
        path: "/api/v1/namespaces/{namespace}/alertrules/{name}",
        summary: "Delete an AlertRule",
    },
    Endpoint { method: "GET", path: "/openapi/v2", summary: "This API document" },
    Endpoint { method: "GET", path: "/docs", summary: "HTML quick start" },
];

/// Build the API document
pub fn document() -> Value {
    let crd = AlertRule::crd();
    let schema = crd
        .spec
        .versions
        .iter()
        .find(|v| v.name == constants::ALERT_RULE_VERSION)
        .and_then(|v| v.schema.as_ref())
        .and_then(|s| s.open_api_v3_schema.as_ref())
        .map_or(Value::Null, |s| json!(s));

    let mut paths = Map::new();
    for endpoint in ENDPOINTS.iter().filter(|e| e.path.starts_with("/api/")) {
        let operations = paths
            .entry(endpoint.path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(operations) = operations {
            operations.insert(
                endpoint.method.to_ascii_lowercase(),
                json!({ "summary": endpoint.summary }),
            );
        }
    }

    json!({
        "swagger": "2.0",
        "info": {
            "title": "Kneutral AlertRule API",
            "version": constants::ALERT_RULE_VERSION,
        },
        "basePath": "/",
        "paths": paths,
        "definitions": {
            "AlertRule": schema,
        }
    })
}

pub async fn openapi() -> Json<Value> {
    Json(document())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_contains_alert_rule_schema() {
        let doc = document();
        assert_eq!(doc["swagger"], "2.0");
        let schema = &doc["definitions"]["AlertRule"];
        assert!(schema["properties"]["spec"]["properties"]["groups"].is_object());
        let item = &doc["paths"]["/api/v1/namespaces/{namespace}/alertrules/{name}"];
        assert_eq!(item["put"]["summary"], "Replace the spec of an AlertRule");
        assert!(item["delete"].is_object());
        assert!(doc["paths"]["/api/v1/namespaces/{namespace}/alertrules"]["post"].is_object());
        assert!(doc["paths"].get("/health").is_none());
    }
}
