//! # AlertRule Controller
//!
//! Entry point. Runs against the cluster by default, or against an in-memory
//! store with `--standalone`.
//!
//! ## Usage
//!
//! ```bash
//! # Reconcile AlertRules in the current cluster context
//! alertrule-controller
//!
//! # Local API and reconciler with example data, no cluster needed
//! alertrule-controller --standalone --api-bind-address :8090
//! ```

use alertrule_controller::config::{ControllerConfig, ServerConfig};
use alertrule_controller::constants;
use alertrule_controller::runtime::{
    initialize, run_resync_loop, run_watch_loop, RuntimeOptions,
};
use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "alertrule-controller")]
#[command(about = "Reconciles AlertRule resources into PrometheusRules", long_about = None)]
#[command(version)]
struct Args {
    /// Address the HTTP API, probes and metrics bind to
    #[arg(long, env = "API_BIND_ADDRESS", default_value = constants::DEFAULT_API_BIND_ADDRESS)]
    api_bind_address: String,

    /// Run against an in-memory store instead of a Kubernetes cluster
    #[arg(long)]
    standalone: bool,

    /// Load example AlertRules into the in-memory store (standalone only)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    mock_data: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let server = ServerConfig {
        bind_address: args.api_bind_address,
        ..ServerConfig::from_env()
    };
    let options = RuntimeOptions {
        standalone: args.standalone,
        mock_data: args.mock_data,
        server,
        controller: ControllerConfig::from_env(),
    };

    let init_result = initialize(options).await?;

    match init_result.client {
        Some(client) => run_watch_loop(client, init_result.context).await,
        None => run_resync_loop(init_result.context).await,
    }

    init_result.server_handle.abort();
    info!("AlertRule Controller stopped");
    Ok(())
}
