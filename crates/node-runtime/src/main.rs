//! # Tunnel-Market Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, optional TOML file, environment, CLI)
//! 2. Initialize telemetry (logs and Prometheus registry)
//! 3. Join the pub/sub topic
//! 4. Build adapters and subsystems, spawn tasks
//! 5. Run until Ctrl+C, then shut down and log a metrics summary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use uuid::Uuid;

use market_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use node_runtime::{Collaborators, NodeConfig, NodeRuntime};
use shared_bus::{InMemoryPubSub, DEFAULT_CHANNEL_CAPACITY};
use shared_types::NodeRole;

/// Tunnel-market node.
#[derive(Parser, Debug)]
#[command(name = "node-runtime", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured role (provider or client).
    #[arg(long)]
    role: Option<NodeRole>,

    /// Print the effective configuration as JSON and continue.
    #[arg(long)]
    print_config: bool,
}

/// Defaults, then file, then environment, then CLI flags.
fn load_config(cli: &Cli) -> Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;

    if let Some(role) = cli.role {
        config.identity.role = role;
    }
    if cli.print_config {
        config.runtime.print_config = true;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("Failed to load configuration")?;

    let telemetry = TelemetryConfig::from_env().for_run_mode(config.runtime.run_mode.is_debug());
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    if config.runtime.print_config {
        println!("{}", config.to_json()?);
    }

    let hub = InMemoryPubSub::with_topic(config.network.topic.clone(), DEFAULT_CHANNEL_CAPACITY);
    let host_id = format!("{}-{}", config.identity.role, Uuid::new_v4());
    let transport = hub.join(host_id);

    let collaborators = Collaborators::from_config(&config)?;
    let mut runtime = NodeRuntime::new(Arc::new(config), transport, collaborators);
    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let summary = runtime.shutdown().await;
    if let Some(sync) = summary.sync {
        info!(
            notified = sync.notifications_sent,
            failed = sync.notifications_failed,
            restarts = sync.restarts,
            "Order sync summary"
        );
    }
    match encode_metrics() {
        Ok(text) => debug!("Final metrics:\n{}", text),
        Err(e) => warn!(error = %e, "Could not encode metrics"),
    }

    Ok(())
}
