//! JSON file backend.

use super::SnapshotStore;
use crate::error::{CasebookError, Result};
use crate::fs::atomic_write_json;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Stores a snapshot as one pretty-printed JSON document.
///
/// A missing or empty file loads as `T::default()`, so a fresh data
/// directory needs no seeding.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _snapshot: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            _snapshot: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> fmt::Debug for JsonFileStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> SnapshotStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(CasebookError::Storage(format!(
                    "failed to read '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            CasebookError::Storage(format!(
                "failed to parse '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn replace(&self, value: &T) -> Result<()> {
        atomic_write_json(&self.path, value)
    }
}
