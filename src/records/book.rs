//! Record listing, creation, update, and removal.

use super::types::{Record, next_case_id};
use crate::error::{CasebookError, Result};
use crate::fanout::Fanout;
use crate::store::SnapshotStore;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// The shared list of case records.
///
/// Same discipline as the lock table: one mutex around the list, write
/// through to the store before the in-memory list changes, publish the
/// whole list after every committed change.
pub struct RecordBook {
    records: Mutex<Vec<Record>>,
    store: Box<dyn SnapshotStore<Vec<Record>>>,
    fanout: Fanout,
}

impl RecordBook {
    pub fn open(store: Box<dyn SnapshotStore<Vec<Record>>>, fanout: Fanout) -> Result<Self> {
        let records = store.load()?;
        Ok(Self {
            records: Mutex::new(records),
            store,
            fanout,
        })
    }

    pub fn list(&self) -> Vec<Record> {
        self.records().clone()
    }

    pub fn get(&self, case_id: &str) -> Result<Record> {
        self.records()
            .iter()
            .find(|r| r.case_id == case_id)
            .cloned()
            .ok_or_else(|| CasebookError::NotFound(case_id.to_string()))
    }

    /// Append a new record built from `draft` under the next free id.
    pub fn create(&self, draft: &Map<String, Value>) -> Result<Record> {
        let mut records = self.records();
        let record = Record::from_draft(next_case_id(&records), draft)?;

        let mut next = records.clone();
        next.push(record.clone());
        self.commit(&mut records, next)?;

        info!(case_id = %record.case_id, "record created");
        Ok(record)
    }

    /// Merge `patch` into the record for `case_id`.
    ///
    /// `admit` runs against the current record while the list is held, and
    /// can veto the update (the lock check).
    pub fn update<F>(&self, case_id: &str, patch: Map<String, Value>, admit: F) -> Result<Record>
    where
        F: FnOnce(&Record) -> Result<()>,
    {
        let mut records = self.records();
        let index = position(&records, case_id)?;
        admit(&records[index])?;

        let mut next = records.clone();
        next[index].merge(patch);
        let merged = next[index].clone();
        self.commit(&mut records, next)?;

        info!(case_id, "record updated");
        Ok(merged)
    }

    /// Remove the record for `case_id`.
    pub fn remove(&self, case_id: &str) -> Result<Record> {
        let mut records = self.records();
        let index = position(&records, case_id)?;

        let mut next = records.clone();
        let removed = next.remove(index);
        self.commit(&mut records, next)?;

        info!(case_id, "record deleted");
        Ok(removed)
    }

    fn records(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, current: &mut Vec<Record>, next: Vec<Record>) -> Result<()> {
        if let Err(e) = self.store.replace(&next) {
            warn!(error = %e, "record list write failed");
            return Err(e);
        }
        *current = next;
        self.fanout.publish_records(current);
        Ok(())
    }
}

fn position(records: &[Record], case_id: &str) -> Result<usize> {
    records
        .iter()
        .position(|r| r.case_id == case_id)
        .ok_or_else(|| CasebookError::NotFound(case_id.to_string()))
}

impl std::fmt::Debug for RecordBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBook")
            .field("records", &self.records().len())
            .finish_non_exhaustive()
    }
}
