//! Integration tests for configuration management
//!
//! Covers loading from a file, defaults for omitted sections and
//! validation failures.

use repopulse_engine::config::Config;
use sdk::errors::EngineError;
use sdk::types::Scenario;
use std::path::PathBuf;

const FULL_CONFIG: &str = r#"
[core]
log_level = "debug"
data_dir = "/var/lib/repopulse"

[executor]
base_url = "https://tasks.example.com"
model = "claude-sonnet-4-5"
max_iterations = 24
api_key_env = "REPOPULSE_TEST_KEY"

[executor.tool_server]
name = "github"
url = "https://tools.example.com/mcp"

[memory_service]
enabled = false
base_url = "http://localhost:8000"

[schedule]
enabled = true
repo = "acme/widgets"
scenario = "release"
hour_utc = 6
minute_utc = 30

[api]
bind = "0.0.0.0:9000"
"#;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_load_full_config_from_file() {
    let (_dir, path) = write_config(FULL_CONFIG);
    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.memory_dir(), PathBuf::from("/var/lib/repopulse/memory"));
    assert_eq!(config.executor.base_url, "https://tasks.example.com");
    assert_eq!(config.executor.tool_server.url, "https://tools.example.com/mcp");
    assert!(!config.memory_service.enabled);
    assert_eq!(config.schedule.scenario, Scenario::Release);
    assert_eq!(config.schedule.hour_utc, 6);
    assert_eq!(config.api.bind, "0.0.0.0:9000");
    assert_eq!(
        config.scheduled_repo().unwrap().unwrap().storage_key(),
        "acme__widgets"
    );
}

#[test]
fn test_tilde_data_dir_is_expanded() {
    let config = Config::from_toml_str(
        r#"
[core]
data_dir = "~/.repopulse"

[executor]
"#,
    )
    .unwrap();

    assert!(!config.core.data_dir.starts_with("~"));
    assert!(config.memory_dir().ends_with(".repopulse/memory"));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_validation_failures() {
    let cases = [
        FULL_CONFIG.replace("log_level = \"debug\"", "log_level = \"loud\""),
        FULL_CONFIG.replace("https://tasks.example.com", "ftp://tasks.example.com"),
        FULL_CONFIG.replace("max_iterations = 24", "max_iterations = 0"),
        FULL_CONFIG.replace("hour_utc = 6", "hour_utc = 24"),
        FULL_CONFIG.replace("minute_utc = 30", "minute_utc = 60"),
        FULL_CONFIG.replace("repo = \"acme/widgets\"", "repo = \"widgets\""),
        FULL_CONFIG.replace("0.0.0.0:9000", "not-an-address"),
        FULL_CONFIG.replace("scenario = \"release\"", "scenario = \"party\""),
        "this is not toml".to_string(),
    ];

    for contents in cases {
        let err = Config::from_toml_str(&contents).unwrap_err();
        assert!(
            matches!(err, EngineError::Config(_)),
            "expected config error, got {:?}",
            err
        );
    }
}

#[test]
fn test_executor_credential_from_environment() {
    let (_dir, path) = write_config(FULL_CONFIG);
    let config = Config::load_from_path(&path).unwrap();

    std::env::remove_var("REPOPULSE_TEST_KEY");
    assert!(matches!(
        config.executor_api_key(),
        Err(EngineError::MissingCredential(var)) if var == "REPOPULSE_TEST_KEY"
    ));

    std::env::set_var("REPOPULSE_TEST_KEY", "sk-test");
    assert_eq!(config.executor_api_key().unwrap(), "sk-test");
    std::env::remove_var("REPOPULSE_TEST_KEY");
}

#[test]
fn test_default_config_round_trips_through_toml() {
    let toml = toml::to_string_pretty(&Config::default_config()).unwrap();
    let config = Config::from_toml_str(&toml).unwrap();

    assert_eq!(config.executor.max_iterations, 24);
    assert_eq!(config.executor.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(config.api.bind, "127.0.0.1:8787");
    assert!(config.scheduled_repo().unwrap().is_none());
}
