//! Unit tests for inspection tool configuration
//!
//! Tests the implementation of:
//! - Priority order: command line > environment > TOML file > defaults
//! - Missing TOML file falls back to defaults
//! - Malformed TOML file is a configuration error
//! - Atomic config writes
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate NAM_INSPECT_* variables are marked with #[serial].

use nam_metadata::config::{
    load_config_file, write_config, ConfigOverrides, InspectConfig, ENV_LOG_LEVEL, ENV_STRICT,
};
use nam_metadata::Error;
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_LOG_LEVEL);
    env::remove_var(ENV_STRICT);
}

fn overrides_for(path: std::path::PathBuf) -> ConfigOverrides {
    ConfigOverrides {
        config_file: Some(path),
        ..Default::default()
    }
}

#[test]
fn test_missing_file_returns_none() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config_file(&dir.path().join("config.toml")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "strict = [not toml").unwrap();

    let err = load_config_file(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_write_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = InspectConfig {
        log_level: "debug".to_string(),
        strict: true,
        pretty: false,
    };

    write_config(&config, &path).unwrap();
    assert!(!dir.path().join("nested").join("config.toml.tmp").exists());
    assert_eq!(load_config_file(&path).unwrap(), Some(config));
}

#[test]
#[serial]
fn test_file_values_used_without_overrides() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "log_level = \"warn\"\nstrict = true\n").unwrap();

    let config = InspectConfig::resolve(&overrides_for(path)).unwrap();
    assert_eq!(config.log_level, "warn");
    assert!(config.strict);
    assert!(config.pretty);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "log_level = \"warn\"\nstrict = true\n").unwrap();

    env::set_var(ENV_LOG_LEVEL, "trace");
    env::set_var(ENV_STRICT, "no");
    let config = InspectConfig::resolve(&overrides_for(path)).unwrap();
    clear_env();

    assert_eq!(config.log_level, "trace");
    assert!(!config.strict);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "pretty = true\n").unwrap();

    env::set_var(ENV_LOG_LEVEL, "trace");
    env::set_var(ENV_STRICT, "false");
    let overrides = ConfigOverrides {
        config_file: Some(path),
        log_level: Some("error".to_string()),
        strict: Some(true),
        pretty: Some(false),
    };
    let config = InspectConfig::resolve(&overrides).unwrap();
    clear_env();

    assert_eq!(config.log_level, "error");
    assert!(config.strict);
    assert!(!config.pretty);
}

#[test]
#[serial]
fn test_invalid_env_flag_ignored() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "strict = true\n").unwrap();

    env::set_var(ENV_STRICT, "sometimes");
    let config = InspectConfig::resolve(&overrides_for(path)).unwrap();
    clear_env();

    assert!(config.strict);
}

#[test]
#[serial]
fn test_explicit_missing_config_file_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let err = InspectConfig::resolve(&overrides_for(dir.path().join("nope.toml"))).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
