//! `serve`: load state, start the sweep, and run the HTTP/WebSocket server.

use crate::cli::ServeArgs;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Result;
use crate::fanout::Fanout;
use crate::locks::{LockManager, LockTable, Sweeper};
use crate::records::{Record, RecordBook};
use crate::server::{self, AppState};
use crate::service::CaseService;
use crate::store::{JsonFileStore, MemoryStore, SnapshotStore};
use crate::telemetry;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(super) fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = Config::resolve(args.config.config.as_deref(), args.overrides())?;
    telemetry::initialise(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(config, args.in_memory))
}

struct Stores {
    records: Box<dyn SnapshotStore<Vec<Record>>>,
    locks: Box<dyn SnapshotStore<LockTable>>,
}

fn stores(config: &Config, in_memory: bool) -> Stores {
    if in_memory {
        Stores {
            records: Box::new(MemoryStore::<Vec<Record>>::new(Vec::new())),
            locks: Box::new(MemoryStore::new(LockTable::default())),
        }
    } else {
        Stores {
            records: Box::new(JsonFileStore::<Vec<Record>>::new(config.records_path())),
            locks: Box::new(JsonFileStore::<LockTable>::new(config.locks_path())),
        }
    }
}

/// Load both collections and wire them to one fanout.
fn open_service(config: &Config, in_memory: bool, fanout: &Fanout) -> Result<CaseService> {
    let Stores { records, locks } = stores(config, in_memory);
    let records = RecordBook::open(records, fanout.clone())?;
    let locks = LockManager::open(
        locks,
        Arc::new(SystemClock),
        fanout.clone(),
        config.lock_ttl(),
    )?;
    Ok(CaseService::new(Arc::new(records), Arc::new(locks)))
}

async fn run(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let fanout = Fanout::default();
    let service = Arc::new(open_service(&config, in_memory, &fanout)?);

    // Drop whatever expired while the server was down before taking requests.
    let purged = service.lock_manager().purge_expired()?;
    info!(
        records = service.list_cases()?.len(),
        locks = purged.len(),
        data_dir = %config.data_dir,
        in_memory,
        "state loaded"
    );

    let sweeper = Arc::new(Sweeper::new(
        Arc::clone(service.lock_manager()),
        Duration::from_secs(config.purge_interval_seconds),
    ))
    .spawn();

    let app = server::router(AppState {
        service,
        fanout,
        settings: config.client_settings(),
    });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, ttl_seconds = config.lock_ttl_seconds, "casebook listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    info!("casebook stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    #[test]
    fn test_file_backed_service_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        {
            let svc = open_service(&config, false, &Fanout::default()).unwrap();
            svc.create_case(json!({"name": "Ana"}).as_object().unwrap())
                .unwrap();
        }

        let svc = open_service(&config, false, &Fanout::default()).unwrap();
        assert_eq!(svc.list_cases().unwrap().len(), 1);
        assert!(config.records_path().exists());
    }

    #[test]
    fn test_in_memory_service_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let svc = open_service(&config, true, &Fanout::default()).unwrap();
        svc.create_case(json!({"name": "Ana"}).as_object().unwrap())
            .unwrap();

        assert!(!config.records_path().exists());
        assert!(!config.locks_path().exists());
    }
}
