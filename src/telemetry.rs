//! Structured logging initialisation for the service.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::{Config, LogFormat};
use crate::error::{CasebookError, Result};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber on first call.
///
/// Later calls are no-ops, so commands and tests can call this freely.
/// Output goes to stderr; stdout is left for command output such as
/// `locks list`.
pub fn initialise(config: &Config) -> Result<()> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| ())
}

fn install_subscriber(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| CasebookError::Config(format!("invalid log filter: {}", e)))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        CasebookError::Config(format!("failed to install log subscriber: {}", e))
    })
}
