//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::{ClientSettings, ConfigOverrides, LOCKS_FILE, RECORDS_FILE};
use crate::error::{CasebookError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config.yaml file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(CasebookError::Config)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = Self::parse(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file without validating it.
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CasebookError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content)
    }

    fn parse(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml)
            .map_err(|e| CasebookError::Config(format!("failed to parse config YAML: {}", e)))
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            CasebookError::Config(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Build the effective config: optional file, then overrides on top.
    ///
    /// The result is validated after the overrides are applied, so a flag
    /// can repair a bad file value but cannot introduce one.
    pub fn resolve(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Replace every field whose override is set.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            host,
            port,
            data_dir,
            lock_ttl_seconds,
            heartbeat_interval_seconds,
            purge_interval_seconds,
            log_filter,
            log_format,
        } = overrides;

        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(ttl) = lock_ttl_seconds {
            self.lock_ttl_seconds = ttl;
        }
        if let Some(heartbeat) = heartbeat_interval_seconds {
            self.heartbeat_interval_seconds = heartbeat;
        }
        if let Some(purge) = purge_interval_seconds {
            self.purge_interval_seconds = purge;
        }
        if let Some(filter) = log_filter {
            self.log_filter = filter;
        }
        if let Some(format) = log_format {
            self.log_format = format;
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `port`, `lock_ttl_seconds`, `heartbeat_interval_seconds`, and
    ///   `purge_interval_seconds` must be positive
    /// - `heartbeat_interval_seconds` must be less than `lock_ttl_seconds`
    /// - `host`, `data_dir`, and `log_filter` must be non-empty
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("port", u64::from(self.port)),
            ("lock_ttl_seconds", self.lock_ttl_seconds),
            ("heartbeat_interval_seconds", self.heartbeat_interval_seconds),
            ("purge_interval_seconds", self.purge_interval_seconds),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(CasebookError::Config(format!(
                    "config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        if self.heartbeat_interval_seconds >= self.lock_ttl_seconds {
            return Err(CasebookError::Config(format!(
                "config validation failed: heartbeat_interval_seconds ({}) must be less than lock_ttl_seconds ({})",
                self.heartbeat_interval_seconds, self.lock_ttl_seconds
            )));
        }

        if i64::try_from(self.lock_ttl_seconds).is_err() {
            return Err(CasebookError::Config(
                "config validation failed: lock_ttl_seconds is too large".to_string(),
            ));
        }

        for (name, value) in [
            ("host", &self.host),
            ("data_dir", &self.data_dir),
            ("log_filter", &self.log_filter),
        ] {
            if value.trim().is_empty() {
                return Err(CasebookError::Config(format!(
                    "config validation failed: {} must be non-empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Path of the record list file.
    pub fn records_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(RECORDS_FILE)
    }

    /// Path of the lock table file.
    pub fn locks_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(LOCKS_FILE)
    }

    /// `host:port` suitable for binding a listener.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Lock TTL as the signed seconds the lock manager works in.
    pub fn lock_ttl(&self) -> i64 {
        i64::try_from(self.lock_ttl_seconds).unwrap_or(i64::MAX)
    }

    /// The timing values advertised to clients.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            lock_ttl_seconds: self.lock_ttl_seconds,
            heartbeat_interval_seconds: self.heartbeat_interval_seconds,
        }
    }
}
