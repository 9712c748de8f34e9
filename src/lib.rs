//! # MCP Research Graph Server
//!
//! A Model Context Protocol (MCP) server that maintains a persistent,
//! queryable knowledge graph for quantitative-research metadata: projects,
//! datasets, variables, hypotheses, statistical tests, models, and results.
//!
//! ## Features
//!
//! - **Graph Store**: typed entities and directed, labeled relations with
//!   referential integrity, de-duplication, and cascade deletes
//! - **Derived Views**: project overview, dataset analysis, hypothesis
//!   tests, variable relationships, statistical results, visualization
//!   gallery, model performance, research-question results, and variable
//!   distributions assembled by relation traversal
//! - **Session Staging**: multi-step analysis updates accumulated per
//!   session and committed to the graph in a single batch
//! - **Status/Priority**: status and priority modeled as graph relations
//!   with single-current-value semantics
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (Rust) → Graph Store / View Engine
//!                    ↓
//!              JSON files (graph + sessions)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mcp_research_graph::{Config, AppState, McpServer};
//! use mcp_research_graph::storage::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let files = FileStore::new(&config.storage);
//!     let state = Arc::new(AppState::new(config, files));
//!     state.status.initialize().await?;
//!     let server = McpServer::new(state);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management for the MCP server.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Knowledge graph domain model and mutation API.
pub mod graph;
/// MCP server implementation and request handling.
pub mod server;
/// Session stage machine for staged, batched graph updates.
pub mod session;
/// Whole-file JSON persistence for the graph and session table.
pub mod storage;
/// Read-only view queries assembled by relation traversal.
pub mod views;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
