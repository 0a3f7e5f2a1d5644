//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, HTTP server
//! startup, resource store selection and startup reconciliation.

use crate::api::{start_server, AppState, ServerState};
use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::Reconciler;
use crate::crd::AlertRule;
use crate::fixtures;
use crate::observability;
use crate::runtime::context::ControllerContext;
use crate::store::{InMemoryStore, KubeStore, ResourceStore};
use anyhow::{Context, Result};
use kube::Client;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

/// How the controller should run
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Use the in-memory store instead of a cluster
    pub standalone: bool,
    /// Pre-populate the in-memory store with example AlertRules
    pub mock_data: bool,
    pub server: ServerConfig,
    pub controller: ControllerConfig,
}

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client; `None` in standalone mode
    pub client: Option<Client>,
    /// Context shared by the trigger loops
    pub context: Arc<ControllerContext>,
    /// Server state for health checks
    pub server_state: ServerState,
    /// HTTP server task
    pub server_handle: JoinHandle<()>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("standalone", &self.client.is_none())
            .field("context", &self.context)
            .field("server_state", &self.server_state)
            .finish_non_exhaustive()
    }
}

/// Set up the tracing subscriber
///
/// Honours `RUST_LOG`, defaulting to `alertrule_controller=info`.
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alertrule_controller=info".into()),
        )
        .try_init()
    {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - Resource store selection (cluster or in-memory)
/// - HTTP server startup
/// - Reconcile existing resources
pub async fn initialize(options: RuntimeOptions) -> Result<InitializationResult> {
    // Must happen before any client opens a TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    init_tracing();

    info!("Starting AlertRule Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let (client, store): (Option<Client>, Arc<dyn ResourceStore>) = if options.standalone {
        info!("Running standalone against the in-memory store");
        let store = InMemoryStore::new();
        if options.mock_data {
            fixtures::populate(&store)
                .await
                .context("Failed to load example AlertRules")?;
        }
        (None, Arc::new(store))
    } else {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        (Some(client.clone()), Arc::new(KubeStore::new(client)))
    };

    let server_state = ServerState::default();
    let app_state = AppState {
        store: Arc::clone(&store),
        server: server_state.clone(),
    };
    let bind_address = options.server.socket_address();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(&bind_address, app_state).await {
            error!("HTTP server error: {:#}", e);
        }
    });

    // Readiness probes should pass before the first reconciliation
    wait_for_server_ready(&server_state, &server_handle, &options.server).await?;
    info!("API documentation at http://{}/docs", options.server.socket_address());

    let context = Arc::new(ControllerContext::new(
        Reconciler::new(store),
        options.controller,
    ));

    // Resources created before the controller started get one pass up front
    reconcile_existing_resources(&context).await;

    info!("Controller initialized, starting trigger loop...");

    Ok(InitializationResult {
        client,
        context,
        server_state,
        server_handle,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &JoinHandle<()>,
    config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let start_time = Instant::now();

    loop {
        // Server task exits early only on bind failure
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Reconcile existing AlertRules before starting the trigger loop
async fn reconcile_existing_resources(ctx: &ControllerContext) {
    let existing_resources_span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.reconcile_existing",
        operation = "reconcile_existing_resources"
    );
    reconcile_existing(ctx).instrument(existing_resources_span).await;
}

async fn reconcile_existing(ctx: &ControllerContext) {
    let items = match ctx
        .reconciler
        .store()
        .list_alert_rules(ctx.config.watch_namespace.as_deref())
        .await
    {
        Ok(items) => items,
        Err(e) => {
            error!("AlertRule CRD is not queryable: {}. Is the CRD installed?", e);
            warn!("Continuing despite CRD queryability check failure - the watch loop will retry");
            return;
        }
    };

    if items.is_empty() {
        info!("No existing AlertRule resources found, the trigger loop will pick up new resources");
        return;
    }

    log_startup_summary(&items);

    let mut failed = 0usize;
    for item in &items {
        let Some(key) = item.key() else {
            continue;
        };
        match ctx.reconciler.reconcile(&key).await {
            Ok(_) => info!(resource.name = %key.name, resource.namespace = %key.namespace, "reconciliation.success"),
            Err(e) => {
                // Continue with other resources even if one fails
                failed += 1;
                error!(resource.name = %key.name, resource.namespace = %key.namespace, error = %e, "reconciliation.error");
            }
        }
    }

    info!(
        "Completed reconciliation of {} existing resources ({} failed)",
        items.len(),
        failed
    );
}

/// Tabulate AlertRules by namespace for operations visibility
fn log_startup_summary(items: &[AlertRule]) {
    let mut by_namespace: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for item in items {
        by_namespace
            .entry(item.metadata.namespace.as_deref().unwrap_or("default"))
            .or_default()
            .push(item.metadata.name.as_deref().unwrap_or("unknown"));
    }

    info!("AlertRule Controller - Startup Resource Summary");
    info!("Total Resources: {}", items.len());
    info!("Namespaces: {}", by_namespace.len());

    for (namespace, names) in &mut by_namespace {
        names.sort_unstable();
        let listed = if names.len() <= 3 {
            names.join(", ")
        } else {
            format!("{}, ... ({} total)", names[..3].join(", "), names.len())
        };
        info!("Namespace: {}", namespace);
        info!("  Resources ({}): {}", names.len(), listed);
    }
}
