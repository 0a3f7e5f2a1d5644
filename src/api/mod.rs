//! # HTTP Facade
//!
//! axum server exposing the AlertRule CRUD API, health and readiness probes,
//! Prometheus metrics, an OpenAPI document and an HTML docs page.
//!
//! ## Routes
//!
//! - `GET /health`, `GET /readyz` - probes
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /api/v1/alertrules` - list across namespaces
//! - `GET|POST /api/v1/namespaces/{namespace}/alertrules`
//! - `GET|PUT|DELETE /api/v1/namespaces/{namespace}/alertrules/{name}`
//! - `GET /openapi/v2`
//! - `GET /docs` - HTML quick start

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod validation;

use crate::store::ResourceStore;
use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

/// Server readiness, flipped once the listener is bound
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    pub is_ready: Arc<AtomicBool>,
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResourceStore>,
    pub server: ServerState,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// Build the router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .route("/openapi/v2", get(openapi::openapi))
        .route("/docs", get(handlers::docs))
        .route("/docs/", get(handlers::docs))
        .route("/api/v1/alertrules", get(handlers::list_all))
        .route(
            "/api/v1/namespaces/{namespace}/alertrules",
            get(handlers::list_namespaced).post(handlers::create),
        )
        .route(
            "/api/v1/namespaces/{namespace}/alertrules/{name}",
            get(handlers::get)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind `bind_address` and serve until the task is dropped
///
/// Marks the server ready as soon as the listener is bound.
pub async fn start_server(bind_address: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {bind_address}"))?;
    let local = listener.local_addr()?;

    let ready = Arc::clone(&state.server.is_ready);
    let app = router(state);

    ready.store(true, Ordering::Relaxed);
    info!("HTTP server listening on {}", local);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}
