//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Note that Config::from_env() also loads
//! from a .env file via dotenvy, so these tests focus on override behavior.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use mcp_research_graph::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

#[test]
#[serial]
fn test_config_from_env_defaults() {
    env::remove_var("GRAPH_FILE_PATH");
    env::remove_var("SESSION_FILE_PATH");
    env::remove_var("LOG_LEVEL");
    env::remove_var("LOG_FORMAT");

    let config = Config::from_env().unwrap();
    assert!(config
        .storage
        .graph_path
        .ends_with("data/research-graph.json"));
    assert!(config
        .storage
        .session_path
        .ends_with("data/research-sessions.json"));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
#[serial]
fn test_config_absolute_paths_used_as_is() {
    env::set_var("GRAPH_FILE_PATH", "/var/data/graph.json");
    env::set_var("SESSION_FILE_PATH", "/var/data/sessions.json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.storage.graph_path.to_str().unwrap(), "/var/data/graph.json");
    assert_eq!(
        config.storage.session_path.to_str().unwrap(),
        "/var/data/sessions.json"
    );

    env::remove_var("GRAPH_FILE_PATH");
    env::remove_var("SESSION_FILE_PATH");
}

#[test]
#[serial]
fn test_config_relative_paths_resolve_against_cwd() {
    env::set_var("GRAPH_FILE_PATH", "store/graph.json");

    let config = Config::from_env().unwrap();
    let expected = env::current_dir().unwrap().join("store/graph.json");
    assert_eq!(config.storage.graph_path, expected);

    env::remove_var("GRAPH_FILE_PATH");
}

#[test]
#[serial]
fn test_config_log_format_json() {
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    env::remove_var("LOG_FORMAT");
}

#[test]
#[serial]
fn test_config_unknown_log_format_falls_back_to_pretty() {
    env::set_var("LOG_FORMAT", "fancy");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Pretty);

    env::remove_var("LOG_FORMAT");
}
