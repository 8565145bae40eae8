//! Lock acquisition, renewal, release, and expiry.

use super::types::{Lock, LockTable, Owner};
use crate::clock::Clock;
use crate::error::{CasebookError, Result};
use crate::fanout::Fanout;
use crate::store::SnapshotStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// The only component allowed to mutate the lock table.
///
/// Each operation holds the table mutex from its expiry purge through its
/// durable write, so read-decide-write is atomic relative to every other
/// operation. The in-memory table only changes after the store accepted the
/// new snapshot; a failed write leaves both untouched and publishes nothing.
pub struct LockManager {
    table: Mutex<LockTable>,
    store: Box<dyn SnapshotStore<LockTable>>,
    clock: Arc<dyn Clock>,
    fanout: Fanout,
    ttl_seconds: i64,
}

impl LockManager {
    /// Load the committed table from `store`.
    pub fn open(
        store: Box<dyn SnapshotStore<LockTable>>,
        clock: Arc<dyn Clock>,
        fanout: Fanout,
        ttl_seconds: i64,
    ) -> Result<Self> {
        let table = store.load()?;
        debug!(entries = table.len(), ttl_seconds, "lock table loaded");
        Ok(Self {
            table: Mutex::new(table),
            store,
            clock,
            fanout,
            ttl_seconds,
        })
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Remove every expired or malformed entry and return the resulting table.
    ///
    /// Persists and publishes only when something was removed, so repeated
    /// calls without time passing publish at most once.
    pub fn purge_expired(&self) -> Result<LockTable> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;
        Ok(table.clone())
    }

    /// The live lock table.
    pub fn snapshot(&self) -> Result<LockTable> {
        self.purge_expired()
    }

    /// The live lock on `case_id`, if any.
    pub fn lock_for(&self, case_id: &str) -> Result<Option<Lock>> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;
        Ok(table.get(case_id).cloned())
    }

    /// Take the edit lock on `case_id` for `owner`.
    ///
    /// Fails with `Conflict` (carrying the existing lock) when a live lock is
    /// held by a different owner. Otherwise mints a brand-new lock, also when
    /// `owner` already held the previous one.
    pub fn acquire(&self, case_id: &str, owner: Owner) -> Result<Lock> {
        if case_id.trim().is_empty() {
            return Err(CasebookError::ValidationError(
                "case id is required".to_string(),
            ));
        }
        if owner.id.trim().is_empty() {
            return Err(CasebookError::ValidationError(
                "owner id is required".to_string(),
            ));
        }

        let mut table = self.table();
        self.purge_locked(&mut table)?;

        if let Some(existing) = table.get(case_id)
            && existing.is_held_by_other(&owner.id)
        {
            info!(
                case_id,
                requested_by = %owner.id,
                held_by = existing.owner_id().unwrap_or_default(),
                "lock denied"
            );
            return Err(CasebookError::conflict(existing.clone()));
        }

        let now = self.clock.now();
        let lock = Lock::new(case_id, owner, now, self.ttl_seconds);
        let mut next = table.clone();
        next.insert(lock.clone());
        self.commit(&mut table, next)?;

        info!(
            case_id,
            owner = lock.owner_id().unwrap_or_default(),
            lock_id = %lock.id,
            expires_at = lock.expires_at,
            "lock granted"
        );
        Ok(lock)
    }

    /// Extend the caller's lock on `case_id` to `now + ttl`.
    ///
    /// Fails with `NotOwner` both when there is no live lock and when it
    /// belongs to someone else.
    pub fn renew(&self, case_id: &str, owner_id: &str) -> Result<Lock> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;

        let held = table.get(case_id).is_some_and(|lock| lock.is_held_by(owner_id));
        if !held {
            debug!(case_id, owner_id, "renew refused");
            return Err(CasebookError::NotOwner);
        }

        let now = self.clock.now();
        let mut next = table.clone();
        let lock = next.get_mut(case_id).ok_or(CasebookError::NotOwner)?;
        lock.renew(now, self.ttl_seconds);
        let renewed = lock.clone();
        self.commit(&mut table, next)?;

        debug!(case_id, owner_id, expires_at = renewed.expires_at, "lock renewed");
        Ok(renewed)
    }

    /// Give up the lock on `case_id`.
    ///
    /// Fails with `Forbidden` when a live lock belongs to another owner.
    /// Releasing an absent lock succeeds.
    pub fn release(&self, case_id: &str, owner_id: &str) -> Result<()> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;

        if let Some(existing) = table.get(case_id)
            && existing.is_held_by_other(owner_id)
        {
            info!(
                case_id,
                owner_id,
                held_by = existing.owner_id().unwrap_or_default(),
                "release refused"
            );
            return Err(CasebookError::Forbidden);
        }

        self.remove_locked(&mut table, case_id)?;
        info!(case_id, owner_id, "lock released");
        Ok(())
    }

    /// Drop any lock on `case_id` regardless of owner.
    ///
    /// Used when the case itself goes away. Always publishes the table so
    /// subscribers see the lock side of the change.
    pub fn discard(&self, case_id: &str) -> Result<Option<Lock>> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;
        let removed = self.remove_locked(&mut table, case_id)?;
        if let Some(lock) = &removed {
            info!(
                case_id,
                held_by = lock.owner_id().unwrap_or_default(),
                "lock discarded with case"
            );
        }
        Ok(removed)
    }

    /// Administrative removal of a live lock regardless of owner.
    pub fn force_clear(&self, case_id: &str) -> Result<Lock> {
        let mut table = self.table();
        self.purge_locked(&mut table)?;

        if table.get(case_id).is_none() {
            return Err(CasebookError::NotFound(case_id.to_string()));
        }

        let cleared = self
            .remove_locked(&mut table, case_id)?
            .ok_or_else(|| CasebookError::NotFound(case_id.to_string()))?;
        warn!(
            case_id,
            held_by = cleared.owner_id().unwrap_or_default(),
            "lock force-cleared"
        );
        Ok(cleared)
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        // The guarded table only ever holds committed snapshots.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn purge_locked(&self, table: &mut LockTable) -> Result<()> {
        let now = self.clock.now();
        let mut next = table.clone();
        let removed = next.purge_expired(now);
        if removed.is_empty() {
            return Ok(());
        }

        self.commit(table, next)?;
        info!(cases = ?removed, "expired locks purged");
        Ok(())
    }

    /// Remove the entry for `case_id`, writing only if there was one.
    /// Publishes the table either way.
    fn remove_locked(&self, table: &mut LockTable, case_id: &str) -> Result<Option<Lock>> {
        if !table.contains(case_id) {
            self.fanout.publish_locks(table);
            return Ok(None);
        }

        let mut next = table.clone();
        let removed = next.remove(case_id);
        self.commit(table, next)?;
        Ok(removed)
    }

    fn commit(&self, current: &mut LockTable, next: LockTable) -> Result<()> {
        if let Err(e) = self.store.replace(&next) {
            warn!(error = %e, "lock table write failed");
            return Err(e);
        }
        *current = next;
        self.fanout.publish_locks(current);
        Ok(())
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
