//! Filesystem utilities for casebook.
//!
//! The data files are only ever replaced whole, through [`atomic_write`].

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_json;
