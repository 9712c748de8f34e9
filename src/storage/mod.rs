//! Whole-file JSON persistence for the knowledge graph and session table.
//!
//! Both stores follow the same lifecycle: the file is read and parsed in
//! full at the start of an operation and written back in full at the end.
//! There is no partial write, no locking, and no caching across calls; a
//! missing file reads as an empty graph or empty session table.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{GraphResult, SessionResult};
use crate::graph::KnowledgeGraph;
use crate::session::SessionTable;

/// File-backed store for the graph and the session table.
#[derive(Debug, Clone)]
pub struct FileStore {
    graph_path: PathBuf,
    session_path: PathBuf,
}

impl FileStore {
    /// Create a store from configuration
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            graph_path: config.graph_path.clone(),
            session_path: config.session_path.clone(),
        }
    }

    /// Create a store with explicit paths
    pub fn with_paths(graph_path: PathBuf, session_path: PathBuf) -> Self {
        Self {
            graph_path,
            session_path,
        }
    }

    /// Path of the graph file
    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }

    /// Path of the session file
    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    /// Load the entire graph; a missing file is an empty graph.
    pub async fn load_graph(&self) -> GraphResult<KnowledgeGraph> {
        match tokio::fs::read_to_string(&self.graph_path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.graph_path.display(), "Graph file absent, starting empty");
                Ok(KnowledgeGraph::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the entire graph back, creating parent directories as needed.
    pub async fn save_graph(&self, graph: &KnowledgeGraph) -> GraphResult<()> {
        let contents = serde_json::to_string_pretty(graph)?;
        self.write_file(&self.graph_path, contents).await?;
        Ok(())
    }

    /// Load the session table; a missing file is an empty table.
    pub async fn load_sessions(&self) -> SessionResult<SessionTable> {
        match tokio::fs::read_to_string(&self.session_path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.session_path.display(), "Session file absent, starting empty");
                Ok(SessionTable::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the entire session table back.
    pub async fn save_sessions(&self, table: &SessionTable) -> SessionResult<()> {
        let contents = serde_json::to_string_pretty(table)?;
        self.write_file(&self.session_path, contents).await?;
        Ok(())
    }

    async fn write_file(&self, path: &Path, contents: String) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }
}
