//! Offline lock maintenance: `locks list` and `locks clear`.
//!
//! Both commands work directly on `locks.json` and are meant for a stopped
//! server; a running server keeps its own copy of the table in memory.

use crate::cli::{ConfigArgs, LocksClearArgs};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::{CasebookError, Result};
use crate::fanout::Fanout;
use crate::locks::{LockManager, LockTable};
use crate::store::JsonFileStore;
use crate::telemetry;
use std::sync::Arc;

pub(super) fn resolve_config(args: &ConfigArgs) -> Result<Config> {
    let config = Config::resolve(args.config.as_deref(), args.overrides())?;
    telemetry::initialise(&config)?;
    Ok(config)
}

fn open_manager(config: &Config) -> Result<LockManager> {
    LockManager::open(
        Box::new(JsonFileStore::<LockTable>::new(config.locks_path())),
        Arc::new(SystemClock),
        Fanout::default(),
        config.lock_ttl(),
    )
}

pub(super) fn cmd_locks_list(config: &Config) -> Result<()> {
    let manager = open_manager(config)?;
    let table = manager.purge_expired()?;

    if table.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    println!("Active locks ({}):", table.len());
    println!();
    for (_, lock) in table.iter() {
        println!("  {}", lock);
    }

    Ok(())
}

pub(super) fn cmd_locks_clear(config: &Config, args: LocksClearArgs) -> Result<()> {
    if !args.force {
        return Err(CasebookError::ValidationError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock lets someone else edit the case while its holder\n\
             may still have unsaved changes. Stop the server first.\n\n\
             To clear the lock, run:\n  casebook locks clear {} --force",
            args.case_id
        )));
    }

    let manager = open_manager(config)?;
    let cleared = manager.force_clear(&args.case_id)?;

    println!("Cleared lock: {}", cleared);
    Ok(())
}
