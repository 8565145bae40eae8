//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for the casebook service.
///
/// Loaded from an optional YAML file, then overridden by environment
/// variables and command-line flags. Unknown YAML fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Listener
    // =========================================================================
    /// Interface to bind (default: "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on (default: 4000).
    #[serde(default = "default_port")]
    pub port: u16,

    // =========================================================================
    // Storage
    // =========================================================================
    /// Directory holding `patients.json` and `locks.json` (default: "data").
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Seconds an unrenewed lock stays live (default: 180).
    #[serde(default = "default_lock_ttl_seconds")]
    pub lock_ttl_seconds: u64,

    /// Seconds between client heartbeats, advertised to clients (default: 60).
    #[serde(default = "default_heartbeat_interval_seconds")]
    pub heartbeat_interval_seconds: u64,

    /// Seconds between background expiry sweeps (default: 5).
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,

    // =========================================================================
    // Logging
    // =========================================================================
    /// `tracing` filter directive (default: "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            lock_ttl_seconds: default_lock_ttl_seconds(),
            heartbeat_interval_seconds: default_heartbeat_interval_seconds(),
            purge_interval_seconds: default_purge_interval_seconds(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
        }
    }
}
