//! Snapshot persistence for the lock table and the record list.
//!
//! Both collections are small and always written whole: a store only has to
//! load the last committed snapshot and replace it with the next one. The
//! replace must be all-or-nothing; on error the previously committed
//! snapshot stays the durable one.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Durable home of one snapshot-valued collection.
pub trait SnapshotStore<T>: Send + Sync {
    /// Load the last committed snapshot.
    fn load(&self) -> Result<T>;

    /// Replace the committed snapshot with `value`.
    fn replace(&self, value: &T) -> Result<()>;
}
