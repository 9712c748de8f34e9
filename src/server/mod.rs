//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::graph::{GraphStore, StatusManager};
use crate::session::SessionMachine;
use crate::storage::FileStore;
use crate::views::ViewEngine;

/// Application state shared across handlers.
///
/// Each component re-loads the persisted files per call, so the state
/// carries no in-memory graph; it only wires the engines to the same
/// file locations.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// File-backed persistence.
    pub files: FileStore,
    /// Graph mutation and lookup API.
    pub graph: GraphStore,
    /// Read-only view queries.
    pub views: ViewEngine,
    /// Status/priority get/set operations.
    pub status: StatusManager,
    /// Session stage machine.
    pub sessions: SessionMachine,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, files: FileStore) -> Self {
        let graph = GraphStore::new(files.clone());
        let views = ViewEngine::new(files.clone());
        let status = StatusManager::new(files.clone());
        let sessions = SessionMachine::new(files.clone());

        Self {
            config,
            files,
            graph,
            views,
            status,
            sessions,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, LoggingConfig, StorageConfig};
    use tempfile::TempDir;

    fn create_test_state(dir: &TempDir) -> AppState {
        let storage = StorageConfig {
            graph_path: dir.path().join("graph.json"),
            session_path: dir.path().join("sessions.json"),
        };
        let config = Config {
            storage: storage.clone(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        };
        let files = FileStore::new(&storage);
        AppState::new(config, files)
    }

    #[tokio::test]
    async fn test_app_state_new() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);
        assert_eq!(state.config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_app_state_components_share_files() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);

        state
            .graph
            .create_entities(vec![crate::graph::EntityInput {
                name: "Proj".to_string(),
                entity_type: "project".to_string(),
                observations: Vec::new(),
            }])
            .await
            .unwrap();

        // The status manager sees the entity the graph store created.
        state.status.set_status("Proj", "active").await.unwrap();
        assert_eq!(
            state.status.get_status("Proj").await.unwrap(),
            Some("active".to_string())
        );
    }

    #[tokio::test]
    async fn test_shared_state_type() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);
        let shared: SharedState = Arc::new(state);

        let shared2 = Arc::clone(&shared);
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(shared2);
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
