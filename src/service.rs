//! Case service: the operations both transports expose.
//!
//! Couples the record book to the lock manager: listings are annotated with
//! lock state, record updates are refused while another owner holds the
//! case, and deleting a case also drops its lock.

use crate::error::{CasebookError, Result};
use crate::locks::{Lock, LockManager, LockTable, Owner};
use crate::records::{CaseView, Record, RecordBook, USER_ID_FIELD};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CaseService {
    records: Arc<RecordBook>,
    locks: Arc<LockManager>,
}

impl CaseService {
    pub fn new(records: Arc<RecordBook>, locks: Arc<LockManager>) -> Self {
        Self { records, locks }
    }

    pub fn lock_manager(&self) -> &Arc<LockManager> {
        &self.locks
    }

    /// All records, each annotated with its live lock.
    pub fn list_cases(&self) -> Result<Vec<CaseView>> {
        let locks = self.locks.snapshot()?;
        Ok(self
            .records
            .list()
            .into_iter()
            .map(|record| CaseView::annotate(record, &locks))
            .collect())
    }

    pub fn create_case(&self, draft: &Map<String, Value>) -> Result<Record> {
        self.records.create(draft)
    }

    /// Merge `patch` into a case.
    ///
    /// The caller identity travels in the patch's `userId` field. The update
    /// is refused with `Conflict` if a live lock on the case belongs to
    /// someone else; an unlocked case can be updated by anyone.
    pub fn update_case(&self, case_id: &str, patch: Map<String, Value>) -> Result<Record> {
        let caller = patch
            .get(USER_ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.records.update(case_id, patch, |_| {
            match self.locks.lock_for(case_id)? {
                Some(lock) if lock.is_held_by_other(&caller) => Err(CasebookError::conflict(lock)),
                _ => Ok(()),
            }
        })
    }

    /// Delete a case and any lock on it.
    ///
    /// Subscribers see the record list first, then the lock table.
    pub fn delete_case(&self, case_id: &str) -> Result<()> {
        self.records.remove(case_id)?;
        self.locks.discard(case_id)?;
        Ok(())
    }

    pub fn locks(&self) -> Result<LockTable> {
        self.locks.snapshot()
    }

    pub fn acquire(&self, case_id: &str, owner: Owner) -> Result<Lock> {
        self.locks.acquire(case_id, owner)
    }

    pub fn renew(&self, case_id: &str, owner_id: &str) -> Result<Lock> {
        self.locks.renew(case_id, owner_id)
    }

    pub fn release(&self, case_id: &str, owner_id: &str) -> Result<()> {
        self.locks.release(case_id, owner_id)
    }
}
