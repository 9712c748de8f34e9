use std::env;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// File locations for the graph and session stores.
    pub storage: StorageConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Store file locations
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the knowledge graph JSON file.
    pub graph_path: PathBuf,
    /// Path of the session table JSON file.
    pub session_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug").
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable output.
    Pretty,
    /// Structured JSON output.
    Json,
}

const DEFAULT_GRAPH_PATH: &str = "./data/research-graph.json";
const DEFAULT_SESSION_PATH: &str = "./data/research-sessions.json";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base = env::current_dir().map_err(|e| AppError::Config {
            message: format!("cannot determine working directory: {}", e),
        })?;

        let storage = StorageConfig {
            graph_path: resolve_path(
                &base,
                env::var("GRAPH_FILE_PATH").unwrap_or_else(|_| DEFAULT_GRAPH_PATH.to_string()),
            ),
            session_path: resolve_path(
                &base,
                env::var("SESSION_FILE_PATH").unwrap_or_else(|_| DEFAULT_SESSION_PATH.to_string()),
            ),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config { storage, logging })
    }
}

/// Absolute paths are used as-is; relative paths resolve against `base`.
fn resolve_path(base: &Path, value: String) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
