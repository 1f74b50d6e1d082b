//! tally daemon — runs the election sync engine against a contract node.
//!
//! Bootstraps the local tally from the configured endpoint, folds ballot
//! events as they arrive, and logs a snapshot on an interval until the
//! process is told to stop. Retry policy for a failed bootstrap belongs
//! here, not in the engine; the current policy is to exit with the error.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_gateway::RpcGateway;
use tally_sync::SyncEngine;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "tally-daemon", about = "On-chain election tally sync daemon")]
struct Cli {
    /// JSON-RPC endpoint of the contract node.
    #[arg(long, env = "TALLY_RPC_URL")]
    rpc_url: Option<String>,

    /// WebSocket endpoint for the ballot-cast event feed.
    #[arg(long, env = "TALLY_WS_URL")]
    ws_url: Option<String>,

    /// Seconds between snapshot log lines.
    #[arg(long, env = "TALLY_SNAPSHOT_INTERVAL")]
    snapshot_interval: Option<u64>,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(ws_url) = cli.ws_url {
        config.ws_url = ws_url;
    }
    if let Some(secs) = cli.snapshot_interval {
        config.snapshot_interval_secs = secs;
    }

    init_tracing(&config.log_level);
    info!(rpc_url = %config.rpc_url, ws_url = %config.ws_url, "starting tally daemon");

    let gateway = Arc::new(RpcGateway::new(
        config.rpc_url.as_str(),
        config.ws_url.as_str(),
    )?);
    let mut engine = SyncEngine::new(gateway);
    engine.bootstrap().await.context("bootstrap failed")?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.snapshot_interval_secs));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                for election in engine.snapshot().await {
                    info!(
                        id = %election.id,
                        name = %election.name,
                        votes = election.vote_count,
                        "election",
                    );
                }
            }
        }
    }

    engine.shutdown().await;
    info!("sync engine stopped");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
