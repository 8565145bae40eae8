//! Crash-safe replacement of data files.
//!
//! Every write of the lock table or the record list goes through here:
//! 1. Write the new content to `.{filename}.tmp` in the same directory
//! 2. fsync the temporary file
//! 3. Rename it over the target and fsync the directory
//!
//! A reader opening the target sees either the previous or the new content,
//! never a prefix of the new one. A crash before the rename leaves the
//! previous file intact and at most a stale temporary file behind, which the
//! next write truncates.
//!
//! `std::fs::rename` replaces an existing destination on both POSIX and
//! Windows, as long as source and target share a filesystem; creating the
//! temporary file next to the target guarantees that.

use crate::error::{CasebookError, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace `path` with `content`.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CasebookError::Storage(format!(
                "failed to create data directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    rename_over(&temp_path, path)
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn atomic_write_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let mut json = serde_json::to_vec_pretty(value).map_err(|e| {
        CasebookError::Storage(format!(
            "failed to serialize data for '{}': {}",
            path.display(),
            e
        ))
    })?;
    json.push(b'\n');
    atomic_write(path, &json)
}

/// Temporary sibling used while replacing `target`.
pub(crate) fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            CasebookError::Storage(format!("invalid data file path '{}'", target.display()))
        })?;

    let temp_name = format!(".{}.tmp", filename);
    Ok(match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        CasebookError::Storage(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let written = file.write_all(content).and_then(|()| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(CasebookError::Storage(format!(
            "failed to write temporary file '{}': {}",
            path.display(),
            e
        )));
    }

    Ok(())
}

fn rename_over(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        CasebookError::Storage(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Persist the directory entry as well. Not supported on every platform.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}
