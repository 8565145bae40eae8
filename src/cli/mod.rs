//! CLI argument parsing for casebook.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::config::{ConfigOverrides, LogFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Casebook: shared case records with expiring edit locks.
///
/// One server holds the record list and the lock table, persists both as
/// JSON files, and pushes every change to connected clients.
#[derive(Parser, Debug)]
#[command(name = "casebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for casebook.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and WebSocket server.
    ///
    /// Loads records and locks from the data directory, starts the
    /// background expiry sweep, and serves until interrupted.
    Serve(ServeArgs),

    /// Lock maintenance commands.
    ///
    /// Inspect or clear edit locks in the data directory without a
    /// running server.
    Locks(LocksCommand),
}

/// Settings shared by every command. Flags win over environment
/// variables, which win over the `--config` file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// YAML config file.
    #[arg(long, env = "CASEBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding patients.json and locks.json.
    #[arg(long, env = "DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Seconds an unrenewed lock stays live.
    #[arg(long, env = "LOCK_TTL_SECONDS", global = true)]
    pub lock_ttl: Option<u64>,

    /// Log filter directive.
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_filter: Option<String>,

    /// Log output format (compact or json).
    #[arg(long, env = "LOG_FORMAT", global = true, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
}

impl ConfigArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_dir: self.data_dir.clone(),
            lock_ttl_seconds: self.lock_ttl,
            log_filter: self.log_filter.clone(),
            log_format: self.log_format,
            ..ConfigOverrides::default()
        }
    }
}

/// Arguments for the `serve` command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Interface to bind.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(long, short, env = "PORT")]
    pub port: Option<u16>,

    /// Heartbeat interval advertised to clients, in seconds.
    #[arg(long, env = "HEARTBEAT_INTERVAL")]
    pub heartbeat_interval: Option<u64>,

    /// Seconds between background expiry sweeps.
    #[arg(long, env = "PURGE_INTERVAL_SECONDS")]
    pub purge_interval: Option<u64>,

    /// Keep records and locks in memory only; nothing is read or written.
    #[arg(long)]
    pub in_memory: bool,
}

impl ServeArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            heartbeat_interval_seconds: self.heartbeat_interval,
            purge_interval_seconds: self.purge_interval,
            ..self.config.overrides()
        }
    }
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LocksCommand {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub action: LocksAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LocksAction {
    /// List live locks.
    ///
    /// Expired entries are purged from the file first.
    List,

    /// Clear the lock on one case.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(LocksClearArgs),
}

/// Arguments for the `locks clear` command.
#[derive(Parser, Debug)]
pub struct LocksClearArgs {
    /// Case id whose lock should be cleared.
    pub case_id: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::from_str(s).ok_or_else(|| format!("unknown log format '{}' (compact, json)", s))
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
