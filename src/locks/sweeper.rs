//! Background expiry sweep.

use super::guard::SweepGuard;
use super::manager::LockManager;
use super::types::LockTable;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

/// Purges expired locks on a fixed cadence, so locks abandoned by
/// disconnected clients expire even when no requests arrive.
///
/// Sweeps never overlap: a sweep that finds another one in progress is
/// skipped.
#[derive(Debug)]
pub struct Sweeper {
    manager: Arc<LockManager>,
    every: Duration,
    running: AtomicBool,
}

impl Sweeper {
    pub fn new(manager: Arc<LockManager>, every: Duration) -> Self {
        Self {
            manager,
            every,
            running: AtomicBool::new(false),
        }
    }

    /// Run one purge. Returns `None` when a sweep is already in progress.
    pub fn sweep(&self) -> Option<Result<LockTable>> {
        let Some(_guard) = SweepGuard::try_acquire(&self.running) else {
            debug!("sweep already running, skipped");
            return None;
        };
        Some(self.manager.purge_expired())
    }

    /// Start sweeping on the current tokio runtime.
    ///
    /// Each sweep runs on the blocking pool, since a purge may write the
    /// lock table.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so startup does not
            // race the first request for the table.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let sweeper = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || sweeper.sweep()).await {
                    Ok(Some(Err(e))) => {
                        warn!(error = %e, "expiry sweep failed, retrying next tick");
                    }
                    Err(e) => warn!(error = %e, "expiry sweep task did not complete"),
                    Ok(_) => {}
                }
            }
        })
    }
}
