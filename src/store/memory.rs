//! In-process backend, used by `serve --in-memory` and by tests.

use super::SnapshotStore;
use crate::error::{CasebookError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Keeps the committed snapshot in memory.
///
/// Replacement can be made to fail on demand, which lets callers exercise
/// their storage-error paths without touching a disk.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    snapshot: Mutex<T>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl<T> MemoryStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: Mutex::new(initial),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make every following `replace` fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful replacements so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<T: Clone> MemoryStore<T> {
    /// The committed snapshot.
    pub fn committed(&self) -> T {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone + Send> SnapshotStore<T> for MemoryStore<T> {
    fn load(&self) -> Result<T> {
        Ok(self.committed())
    }

    fn replace(&self, value: &T) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CasebookError::Storage(
                "memory store is refusing writes".to_string(),
            ));
        }

        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = value.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
