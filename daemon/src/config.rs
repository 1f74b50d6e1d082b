//! Daemon configuration with TOML file support.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the tally daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`];
/// CLI flags override individual fields afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// JSON-RPC endpoint of the contract node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// WebSocket endpoint for the ballot-cast event feed.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Seconds between snapshot log lines.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,

    /// Log level filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:9545".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:9546/ws".to_string()
}

fn default_snapshot_interval() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            ws_url: default_ws_url(),
            snapshot_interval_secs: default_snapshot_interval(),
            log_level: default_log_level(),
        }
    }
}
