//! Tests for configuration path resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate FVR_CONFIG or RUST_LOG are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use fvr_common::config::{
    load_config, resolve_config_path, write_toml_config, ConfigSource, LoggingConfig, TomlConfig,
    CONFIG_ENV_VAR,
};
use fvr_common::logging::build_filter;
use fvr_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_beats_environment() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/fvr-env-config.toml");

    let cli = PathBuf::from("/tmp/fvr-cli-config.toml");
    let source = resolve_config_path(Some(&cli));
    assert_eq!(source, Some(ConfigSource::CommandLine(cli)));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/fvr-env-config.toml");

    let source = resolve_config_path(None);
    assert_eq!(
        source,
        Some(ConfigSource::Environment(PathBuf::from("/tmp/fvr-env-config.toml")))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_environment_variable_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let source = resolve_config_path(None);
    assert!(!matches!(source, Some(ConfigSource::Environment(_))));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let (config, source) = load_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
    assert_eq!(source, ConfigSource::MissingFile(missing.clone()));
    assert!(source.is_fallback());
    assert!(source.describe().contains("not found"));
}

#[test]
#[serial]
fn test_missing_environment_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("env-nope.toml");
    env::set_var(CONFIG_ENV_VAR, &missing);

    let (_, source) = load_config(None).unwrap();
    assert_eq!(source, ConfigSource::MissingFile(missing));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_loads_file_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fvr.toml");
    std::fs::write(
        &path,
        r#"
        [server]
        port = 6000

        [data]
        input = "survey.csv"
        "#,
    )
    .unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let (config, source) = load_config(None).unwrap();
    assert_eq!(config.server.port, 6000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.data.input, PathBuf::from("survey.csv"));
    assert_eq!(config.data.output, PathBuf::from("data/results.csv"));
    assert_eq!(source, ConfigSource::Environment(path));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_write_then_load_preserves_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.pipeline.clusters = 5;
    config.pipeline.cluster_labels = "fixed".to_string();
    config
        .fuzzy
        .entry("taste".to_string())
        .or_default()
        .insert("tasty".to_string(), vec![3.5, 4.2, 5.0, 5.0]);

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = TomlConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
#[serial]
fn test_log_level_from_config() {
    env::remove_var("RUST_LOG");

    let filter = build_filter(&LoggingConfig {
        level: "debug".to_string(),
    })
    .unwrap();
    assert_eq!(filter.to_string(), "debug");
}
