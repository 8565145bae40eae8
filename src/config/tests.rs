//! Tests for config functionality.

use crate::config::{Config, ConfigOverrides, LogFormat};
use crate::error::CasebookError;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 4000);
    assert_eq!(config.data_dir, "data");
    assert_eq!(config.lock_ttl_seconds, 180);
    assert_eq!(config.heartbeat_interval_seconds, 60);
    assert_eq!(config.purge_interval_seconds, 5);
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.log_format, LogFormat::Compact);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
port: 8080
lock_ttl_seconds: 300
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.lock_ttl_seconds, 300);

    // Unspecified values should use defaults
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.heartbeat_interval_seconds, 60);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
host: 127.0.0.1
port: 5000
data_dir: /var/lib/casebook
lock_ttl_seconds: 120
heartbeat_interval_seconds: 30
purge_interval_seconds: 2
log_filter: casebook=debug
log_format: json
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 5000);
    assert_eq!(config.data_dir, "/var/lib/casebook");
    assert_eq!(config.lock_ttl_seconds, 120);
    assert_eq!(config.heartbeat_interval_seconds, 30);
    assert_eq!(config.purge_interval_seconds, 2);
    assert_eq!(config.log_filter, "casebook=debug");
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
port: 4100
cors_origin: "*"
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.port, 4100);
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let result = Config::from_yaml("port: [not a number");

    assert!(matches!(result, Err(CasebookError::Config(_))));
}

#[test]
fn test_zero_values_rejected() {
    for yaml in [
        "port: 0",
        "lock_ttl_seconds: 0",
        "heartbeat_interval_seconds: 0",
        "purge_interval_seconds: 0",
    ] {
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(
            err.to_string().contains("must be greater than 0"),
            "{yaml}: {err}"
        );
    }
}

#[test]
fn test_heartbeat_must_be_shorter_than_ttl() {
    let yaml = r#"
lock_ttl_seconds: 60
heartbeat_interval_seconds: 60
"#;
    let err = Config::from_yaml(yaml).unwrap_err();

    assert!(err.to_string().contains("must be less than lock_ttl_seconds"));
}

#[test]
fn test_blank_data_dir_rejected() {
    let result = Config::from_yaml("data_dir: '  '");

    assert!(matches!(result, Err(CasebookError::Config(_))));
}

#[test]
fn test_yaml_round_trip() {
    let config = Config {
        port: 4321,
        log_format: LogFormat::Json,
        ..Config::default()
    };

    let yaml = config.to_yaml().unwrap();

    assert!(yaml.contains("log_format: json"));
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_apply_overrides_only_set_fields() {
    let mut config = Config::default();

    config.apply(ConfigOverrides {
        port: Some(9000),
        data_dir: Some("/tmp/cases".to_string()),
        ..ConfigOverrides::default()
    });

    assert_eq!(config.port, 9000);
    assert_eq!(config.data_dir, "/tmp/cases");
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.lock_ttl_seconds, 180);
}

#[test]
fn test_resolve_layers_overrides_over_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("casebook.yaml");
    std::fs::write(&path, "port: 5000\nlock_ttl_seconds: 240\n").unwrap();

    let config = Config::resolve(
        Some(&path),
        ConfigOverrides {
            port: Some(6000),
            ..ConfigOverrides::default()
        },
    )
    .unwrap();

    assert_eq!(config.port, 6000);
    assert_eq!(config.lock_ttl_seconds, 240);
}

#[test]
fn test_resolve_validates_after_overrides() {
    let result = Config::resolve(
        None,
        ConfigOverrides {
            heartbeat_interval_seconds: Some(500),
            ..ConfigOverrides::default()
        },
    );

    assert!(matches!(result, Err(CasebookError::Config(_))));
}

#[test]
fn test_resolve_override_repairs_file_value() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("casebook.yaml");
    std::fs::write(
        &path,
        "lock_ttl_seconds: 30\nheartbeat_interval_seconds: 60\n",
    )
    .unwrap();

    // The file alone is invalid; the flag brings the TTL back above the heartbeat.
    assert!(matches!(
        Config::load(&path),
        Err(CasebookError::Config(_))
    ));

    let config = Config::resolve(
        Some(&path),
        ConfigOverrides {
            lock_ttl_seconds: Some(300),
            ..ConfigOverrides::default()
        },
    )
    .unwrap();

    assert_eq!(config.lock_ttl_seconds, 300);
    assert_eq!(config.heartbeat_interval_seconds, 60);
}

#[test]
fn test_resolve_still_rejects_unrepaired_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("casebook.yaml");
    std::fs::write(
        &path,
        "lock_ttl_seconds: 30\nheartbeat_interval_seconds: 60\n",
    )
    .unwrap();

    let result = Config::resolve(
        Some(&path),
        ConfigOverrides {
            port: Some(6000),
            ..ConfigOverrides::default()
        },
    );

    assert!(matches!(result, Err(CasebookError::Config(_))));
}

#[test]
fn test_load_missing_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.yaml");

    let err = Config::load(&missing).unwrap_err();

    assert!(matches!(err, CasebookError::Config(_)));
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn test_derived_paths_and_settings() {
    let config = Config {
        host: "127.0.0.1".to_string(),
        data_dir: "/srv/cases".to_string(),
        ..Config::default()
    };

    assert_eq!(
        config.records_path(),
        PathBuf::from("/srv/cases/patients.json")
    );
    assert_eq!(config.locks_path(), PathBuf::from("/srv/cases/locks.json"));
    assert_eq!(config.socket_addr(), "127.0.0.1:4000");
    assert_eq!(config.lock_ttl(), 180);

    let settings = serde_json::to_value(config.client_settings()).unwrap();
    assert_eq!(settings["lockTtlSeconds"], 180);
    assert_eq!(settings["heartbeatIntervalSeconds"], 60);
}

#[test]
fn test_log_format_from_str() {
    assert_eq!(LogFormat::from_str("json"), Some(LogFormat::Json));
    assert_eq!(LogFormat::from_str(" Compact "), Some(LogFormat::Compact));
    assert_eq!(LogFormat::from_str("pretty"), None);
}
