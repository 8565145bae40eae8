//! Configuration types and defaults for casebook.
//!
//! Enums, constants, and default value functions used by the Config struct.

use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line human-readable output (default).
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a log format from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Timing parameters clients need to keep their locks alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub lock_ttl_seconds: u64,
    pub heartbeat_interval_seconds: u64,
}

/// Overrides layered over the config file, highest precedence first being
/// the caller's concern. `None` keeps the file's (or default) value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<String>,
    pub lock_ttl_seconds: Option<u64>,
    pub heartbeat_interval_seconds: Option<u64>,
    pub purge_interval_seconds: Option<u64>,
    pub log_filter: Option<String>,
    pub log_format: Option<LogFormat>,
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    4000
}

pub(crate) fn default_data_dir() -> String {
    "data".to_string()
}

pub(crate) fn default_lock_ttl_seconds() -> u64 {
    180
}

pub(crate) fn default_heartbeat_interval_seconds() -> u64 {
    60
}

pub(crate) fn default_purge_interval_seconds() -> u64 {
    5
}

pub(crate) fn default_log_filter() -> String {
    "info".to_string()
}

/// File name of the record list inside the data directory.
pub const RECORDS_FILE: &str = "patients.json";

/// File name of the lock table inside the data directory.
pub const LOCKS_FILE: &str = "locks.json";
