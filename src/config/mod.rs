//! Configuration model for casebook.
//!
//! This module defines the Config struct read from an optional YAML file.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for every field, overrides from flags and environment,
//! and validation of the resulting values.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub use types::{ClientSettings, ConfigOverrides, LogFormat};
