use thiserror::Error;

use crate::graph::EntityType;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong.
        message: String,
    },

    /// Graph store or view error.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Session stage machine error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// MCP protocol error.
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

/// Graph store and view errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// Entity type outside the closed set.
    #[error("Invalid entity type: {value}")]
    InvalidEntityType {
        /// The rejected type string.
        value: String,
    },

    /// Relation type outside the closed set.
    #[error("Invalid relation type: {value}")]
    InvalidRelationType {
        /// The rejected type string.
        value: String,
    },

    /// A referenced entity name is absent from the graph.
    #[error("Entity not found: {name}")]
    EntityNotFound {
        /// The missing entity name.
        name: String,
    },

    /// A seed entity exists but has the wrong type for the requested view.
    #[error("Entity {name} has type {actual}, expected {expected}")]
    WrongType {
        /// The entity name.
        name: String,
        /// The type the operation requires.
        expected: EntityType,
        /// The type the entity actually has.
        actual: EntityType,
    },

    /// An expected containment edge is absent.
    #[error("Dataset {dataset} does not contain variable {variable}")]
    NotLinked {
        /// The dataset name.
        dataset: String,
        /// The variable name.
        variable: String,
    },

    /// Status value outside the closed set.
    #[error("Invalid status value: {value}")]
    InvalidStatus {
        /// The rejected value.
        value: String,
    },

    /// Priority value outside the closed set.
    #[error("Invalid priority value: {value}")]
    InvalidPriority {
        /// The rejected value.
        value: String,
    },

    /// Reading or writing the graph file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The graph file could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session stage machine errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session id is absent from the session table.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// The unknown session id.
        session_id: String,
    },

    /// Stage name outside the closed set.
    #[error("Invalid stage: {value}")]
    InvalidStage {
        /// The rejected stage name.
        value: String,
    },

    /// A revision targets a stage position that does not exist.
    #[error("Cannot revise stage {stage_number}: only {recorded} stages recorded")]
    InvalidRevision {
        /// The 1-based position requested.
        stage_number: u32,
        /// How many stages the session actually has.
        recorded: usize,
    },

    /// Stage data did not match the shape expected for its stage.
    #[error("Stage data error: {message}")]
    StageData {
        /// What went wrong.
        message: String,
    },

    /// The assembly stage did not name a project.
    #[error("Assembly stage data is missing the project name")]
    MissingProject,

    /// A graph operation failed during commit.
    #[error("Graph error during commit: {0}")]
    Graph(#[from] GraphError),

    /// Reading or writing the session file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    /// The request was not a valid JSON-RPC request.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What went wrong.
        message: String,
    },

    /// The requested tool is not registered.
    #[error("Unknown tool: {tool_name}")]
    UnknownTool {
        /// The unrecognized tool name.
        tool_name: String,
    },

    /// Tool arguments failed to deserialize.
    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters {
        /// The tool being called.
        tool_name: String,
        /// Why the parameters were rejected.
        message: String,
    },

    /// The tool ran but its operation failed.
    #[error("Tool execution failed: {message}")]
    ExecutionFailed {
        /// The underlying failure.
        message: String,
    },

    /// A result could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl From<GraphError> for McpError {
    fn from(err: GraphError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl From<SessionError> for McpError {
    fn from(err: SessionError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
