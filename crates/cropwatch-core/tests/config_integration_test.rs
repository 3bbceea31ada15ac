//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use cropwatch_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "CROPWATCH_API_URL",
    "CROPWATCH_GEOCODE_URL",
    "CROPWATCH_TILE_URL",
    "CROPWATCH_DEBOUNCE_MS",
    "CROPWATCH_MIN_QUERY_CHARS",
    "CROPWATCH_SUGGESTION_LIMIT",
    "CROPWATCH_POLL_INTERVAL_SECS",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("CROPWATCH_API_URL", "https://env.example.org");
    env::set_var("CROPWATCH_DEBOUNCE_MS", "200");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_base_url = "https://file.example.org"
debounce_ms = 500
min_query_chars = 4
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.api_base_url.value, "https://env.example.org");
    assert_eq!(config.api_base_url.source, ConfigSource::Environment);
    assert_eq!(config.debounce_ms.value, 200);
    assert_eq!(config.debounce_ms.source, ConfigSource::Environment);
    // Only in the file
    assert_eq!(config.min_query_chars.value, 4);
    assert_eq!(config.min_query_chars.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("CROPWATCH_DEBOUNCE_MS", "soon");
    env::set_var("CROPWATCH_POLL_INTERVAL_SECS", "0");
    env::set_var("CROPWATCH_SUGGESTION_LIMIT", "-2");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.debounce_ms.value, 350);
    assert_eq!(config.debounce_ms.source, ConfigSource::Default);
    assert_eq!(config.poll_interval_secs.value, 3);
    assert_eq!(config.suggestion_limit.value, 5);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_all() {
    clear_env();
    env::set_var("CROPWATCH_API_URL", "https://env.example.org");
    env::set_var("CROPWATCH_POLL_INTERVAL_SECS", "10");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "api_base_url = \"https://file.example.org\"").unwrap();

    let mut config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    config.update_from_cli(CliConfigOverrides {
        api_base_url: Some("http://localhost:9000".to_string()),
        poll_interval_secs: Some(1),
        ..Default::default()
    });

    assert_eq!(config.api_base_url.value, "http://localhost:9000");
    assert_eq!(config.api_base_url.source, ConfigSource::Cli);
    assert_eq!(config.poll_settings().interval, Duration::from_secs(1));

    // Verify precedence levels
    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "debounce_ms = \"fast\"").unwrap();

    let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration value for file"));
}

#[test]
fn test_configuration_source_tracking() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "geocode_endpoint = \"https://geo.example.org/search\"").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    let inspection_map = config.to_inspection_map();

    let (endpoint, source) = &inspection_map["geocode_endpoint"];
    assert_eq!(endpoint, "https://geo.example.org/search");
    assert_eq!(*source, ConfigSource::File);

    let (interval, source) = &inspection_map["poll_interval_secs"];
    assert_eq!(interval, "3s");
    assert_eq!(*source, ConfigSource::Default);
}
