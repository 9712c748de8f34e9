//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! This module provides the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Stdio-based server communication

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null if notification, must always be present per spec).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// The server name identifier.
    pub name: String,
    /// The server version string.
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// The MCP protocol version supported.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: Capabilities,
    /// Server identification information.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// The name of the tool to invoke.
    pub name: String,
    /// Optional arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (e.g., "text").
    #[serde(rename = "type")]
    pub content_type: String,
    /// The text content of the result.
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// The result content items.
    pub content: Vec<ToolResultContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server running over stdio.
///
/// Handles JSON-RPC 2.0 messages over stdin/stdout for MCP protocol
/// communication with clients.
pub struct McpServer {
    /// Shared application state.
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        info!("MCP Research Graph Server starting...");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        -32700,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // Only send response if not a notification (per JSON-RPC 2.0 spec)
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request
    /// Returns None for notifications (requests without id) per JSON-RPC 2.0 spec
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Check if this is a notification (no id = no response required)
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" => {
                // Notification - no response per JSON-RPC 2.0
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                // Notification - no response
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                // For unknown methods, only respond if it's a request (has id)
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        -32601,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "mcp-research-graph".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");

        let tools = vec![
            // Graph store tools
            get_create_entities_tool(),
            get_create_relations_tool(),
            get_add_observations_tool(),
            get_delete_entities_tool(),
            get_delete_observations_tool(),
            get_delete_relations_tool(),
            get_read_graph_tool(),
            get_search_nodes_tool(),
            get_open_nodes_tool(),
            // View tools
            get_project_overview_tool(),
            get_dataset_analysis_tool(),
            get_hypothesis_tests_tool(),
            get_variable_relationships_tool(),
            get_statistical_results_tool(),
            get_visualization_gallery_tool(),
            get_model_performance_tool(),
            get_research_question_results_tool(),
            get_variable_distribution_tool(),
            // Status/priority tools
            get_entity_status_tool(),
            get_set_entity_status_tool(),
            get_entity_priority_tool(),
            get_set_entity_priority_tool(),
            // Session tools
            get_start_session_tool(),
            get_end_session_tool(),
        ];

        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "tools": tools
            }),
        )
    }

    /// Handle tools/call request
    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let (content, is_error) =
            match handle_tool_call(&self.state, &params.name, params.arguments).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                        error!(error = %e, "Failed to serialize tool result");
                        format!("{{\"error\": \"Serialization failed: {}\"}}", e)
                    });
                    (
                        ToolResultContent {
                            content_type: "text".to_string(),
                            text,
                        },
                        None,
                    )
                }
                Err(e) => (
                    ToolResultContent {
                        content_type: "text".to_string(),
                        text: format!("Error: {}", e),
                    },
                    Some(true),
                ),
            };

        let tool_result = ToolCallResult {
            content: vec![content],
            is_error,
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id.clone(), -32603, format!("Internal error: {}", e))
            }
        }
    }
}

// ============================================================================
// Graph store tool definitions
// ============================================================================

/// Get the create entities tool definition
fn get_create_entities_tool() -> Tool {
    Tool {
        name: "create_entities".to_string(),
        description: "Create new entities in the research knowledge graph. Entities whose name already exists are silently skipped.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {
                                "type": "string",
                                "description": "Unique entity name"
                            },
                            "entityType": {
                                "type": "string",
                                "enum": ["project", "dataset", "variable", "hypothesis", "statisticalTest", "result", "analysisScript", "visualization", "model", "literature", "researchQuestion", "finding", "participant", "status", "priority"],
                                "description": "Type of the entity"
                            },
                            "observations": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Free-text facts; use 'Key: value' prefixes for structured metadata"
                            }
                        },
                        "required": ["name", "entityType"]
                    },
                    "description": "Entities to create"
                }
            },
            "required": ["entities"],
            "additionalProperties": false
        }),
    }
}

/// Get the create relations tool definition
fn get_create_relations_tool() -> Tool {
    Tool {
        name: "create_relations".to_string(),
        description: "Create directed relations between existing entities. Both endpoints must exist; duplicate triples are silently skipped.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "relations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "from": { "type": "string", "description": "Source entity name" },
                            "to": { "type": "string", "description": "Target entity name" },
                            "relationType": {
                                "type": "string",
                                "description": "Relation type (e.g. contains, part_of, analyzes, correlates_with, predicts, tests, produces, visualizes)"
                            }
                        },
                        "required": ["from", "to", "relationType"]
                    },
                    "description": "Relations to create"
                }
            },
            "required": ["relations"],
            "additionalProperties": false
        }),
    }
}

/// Get the add observations tool definition
fn get_add_observations_tool() -> Tool {
    Tool {
        name: "add_observations".to_string(),
        description: "Append observations to existing entities. Observations already present are skipped; the response lists exactly what was added.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "observations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "entityName": { "type": "string", "description": "Target entity name" },
                            "contents": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Observation strings to add"
                            }
                        },
                        "required": ["entityName", "contents"]
                    },
                    "description": "Observations to add per entity"
                }
            },
            "required": ["observations"],
            "additionalProperties": false
        }),
    }
}

/// Get the delete entities tool definition
fn get_delete_entities_tool() -> Tool {
    Tool {
        name: "delete_entities".to_string(),
        description: "Delete entities by name, cascading to every relation that touches them. Unknown names are ignored.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entityNames": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Names of entities to delete"
                }
            },
            "required": ["entityNames"],
            "additionalProperties": false
        }),
    }
}

/// Get the delete observations tool definition
fn get_delete_observations_tool() -> Tool {
    Tool {
        name: "delete_observations".to_string(),
        description: "Remove specific observation strings from entities. Unknown entities and absent observations are ignored.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "deletions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "entityName": { "type": "string", "description": "Target entity name" },
                            "observations": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Observation strings to remove"
                            }
                        },
                        "required": ["entityName", "observations"]
                    },
                    "description": "Observations to remove per entity"
                }
            },
            "required": ["deletions"],
            "additionalProperties": false
        }),
    }
}

/// Get the delete relations tool definition
fn get_delete_relations_tool() -> Tool {
    Tool {
        name: "delete_relations".to_string(),
        description: "Delete relations matching exact (from, to, relationType) triples. Non-matching triples are ignored.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "relations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "from": { "type": "string" },
                            "to": { "type": "string" },
                            "relationType": { "type": "string" }
                        },
                        "required": ["from", "to", "relationType"]
                    },
                    "description": "Relations to delete"
                }
            },
            "required": ["relations"],
            "additionalProperties": false
        }),
    }
}

/// Get the read graph tool definition
fn get_read_graph_tool() -> Tool {
    Tool {
        name: "read_graph".to_string(),
        description: "Read the entire research knowledge graph: all entities and all relations.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

/// Get the search nodes tool definition
fn get_search_nodes_tool() -> Tool {
    Tool {
        name: "search_nodes".to_string(),
        description: "Search entities by whitespace-separated tokens. Every token must match the name, type, or an observation (case-insensitive). Returns matches plus the relations among them.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, e.g. 'income regression'"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

/// Get the open nodes tool definition
fn get_open_nodes_tool() -> Tool {
    Tool {
        name: "open_nodes".to_string(),
        description: "Look up entities by exact name. Returns the named entities plus the relations among them.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "names": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Entity names to open"
                }
            },
            "required": ["names"],
            "additionalProperties": false
        }),
    }
}

// ============================================================================
// View tool definitions
// ============================================================================

/// Get the project overview tool definition
fn get_project_overview_tool() -> Tool {
    Tool {
        name: "get_project_overview".to_string(),
        description: "Composite overview of a project: research questions, datasets with total variable count, hypotheses, models, findings, and derived methodology/participant notes.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectName": {
                    "type": "string",
                    "description": "Name of the project entity"
                }
            },
            "required": ["projectName"],
            "additionalProperties": false
        }),
    }
}

/// Get the dataset analysis tool definition
fn get_dataset_analysis_tool() -> Tool {
    Tool {
        name: "get_dataset_analysis".to_string(),
        description: "Analysis summary of a dataset: size/source/date/status metadata, contained variables classified as independent/dependent/control/other, and the tests, models, and visualizations touching it.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "datasetName": {
                    "type": "string",
                    "description": "Name of the dataset entity"
                }
            },
            "required": ["datasetName"],
            "additionalProperties": false
        }),
    }
}

/// Get the hypothesis tests tool definition
fn get_hypothesis_tests_tool() -> Tool {
    Tool {
        name: "get_hypothesis_tests".to_string(),
        description: "Hypotheses of a project with their statistical tests and each test's results. Optionally scoped to one hypothesis.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectName": {
                    "type": "string",
                    "description": "Name of the project entity"
                },
                "hypothesisName": {
                    "type": "string",
                    "description": "Optional: a single hypothesis to report on"
                }
            },
            "required": ["projectName"],
            "additionalProperties": false
        }),
    }
}

/// Get the variable relationships tool definition
fn get_variable_relationships_tool() -> Tool {
    Tool {
        name: "get_variable_relationships".to_string(),
        description: "Everything connected to a variable: containing datasets, correlations with parsed direction/strength, prediction edges both ways, moderation/mediation targets, and analyses.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "variableName": {
                    "type": "string",
                    "description": "Name of the variable entity"
                }
            },
            "required": ["variableName"],
            "additionalProperties": false
        }),
    }
}

/// Get the statistical results tool definition
fn get_statistical_results_tool() -> Tool {
    Tool {
        name: "get_statistical_results".to_string(),
        description: "A project's statistical tests grouped by test type, with resolved hypotheses, datasets, variables, results, and a per-test significance heuristic. Optionally filtered by test type.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectName": {
                    "type": "string",
                    "description": "Name of the project entity"
                },
                "testType": {
                    "type": "string",
                    "description": "Optional substring filter against test observations (e.g. 'regression')"
                }
            },
            "required": ["projectName"],
            "additionalProperties": false
        }),
    }
}

/// Get the visualization gallery tool definition
fn get_visualization_gallery_tool() -> Tool {
    Tool {
        name: "get_visualization_gallery".to_string(),
        description: "Visualizations of a project grouped by type. With a dataset, only that dataset's visualizations; otherwise the union over every project dataset and model.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectName": {
                    "type": "string",
                    "description": "Name of the project entity"
                },
                "datasetName": {
                    "type": "string",
                    "description": "Optional: restrict to one dataset's visualizations"
                }
            },
            "required": ["projectName"],
            "additionalProperties": false
        }),
    }
}

/// Get the model performance tool definition
fn get_model_performance_tool() -> Tool {
    Tool {
        name: "get_model_performance".to_string(),
        description: "One model's performance metrics (accuracy, RMSE, R2, ...), training datasets, predicted variables, and visualizations.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "modelName": {
                    "type": "string",
                    "description": "Name of the model entity"
                }
            },
            "required": ["modelName"],
            "additionalProperties": false
        }),
    }
}

/// Get the research question results tool definition
fn get_research_question_results_tool() -> Tool {
    Tool {
        name: "get_research_question_results".to_string(),
        description: "Hypotheses, findings, and results addressing a research question, with hypothesis support status and linked tests.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "questionName": {
                    "type": "string",
                    "description": "Name of the research question entity"
                }
            },
            "required": ["questionName"],
            "additionalProperties": false
        }),
    }
}

/// Get the variable distribution tool definition
fn get_variable_distribution_tool() -> Tool {
    Tool {
        name: "get_variable_distribution".to_string(),
        description: "Distribution statistics of a variable (mean, median, SD, range, ...) plus the tests and visualizations touching it. With a dataset, validates the dataset actually contains the variable.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "variableName": {
                    "type": "string",
                    "description": "Name of the variable entity"
                },
                "datasetName": {
                    "type": "string",
                    "description": "Optional: dataset expected to contain the variable"
                }
            },
            "required": ["variableName"],
            "additionalProperties": false
        }),
    }
}

// ============================================================================
// Status/priority tool definitions
// ============================================================================

/// Get the entity status tool definition
fn get_entity_status_tool() -> Tool {
    Tool {
        name: "get_entity_status".to_string(),
        description: "Current status of an entity, read from its has_status relation. Returns null when no status is set.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entityName": {
                    "type": "string",
                    "description": "Name of the entity"
                }
            },
            "required": ["entityName"],
            "additionalProperties": false
        }),
    }
}

/// Get the set entity status tool definition
fn get_set_entity_status_tool() -> Tool {
    Tool {
        name: "set_entity_status".to_string(),
        description: "Set an entity's status, replacing any previous has_status relation so exactly one current status remains.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entityName": {
                    "type": "string",
                    "description": "Name of the entity"
                },
                "status": {
                    "type": "string",
                    "enum": ["planning", "active", "paused", "completed", "abandoned"],
                    "description": "The new status value"
                }
            },
            "required": ["entityName", "status"],
            "additionalProperties": false
        }),
    }
}

/// Get the entity priority tool definition
fn get_entity_priority_tool() -> Tool {
    Tool {
        name: "get_entity_priority".to_string(),
        description: "Current priority of an entity, read from its has_priority relation. Returns null when no priority is set.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entityName": {
                    "type": "string",
                    "description": "Name of the entity"
                }
            },
            "required": ["entityName"],
            "additionalProperties": false
        }),
    }
}

/// Get the set entity priority tool definition
fn get_set_entity_priority_tool() -> Tool {
    Tool {
        name: "set_entity_priority".to_string(),
        description: "Set an entity's priority, replacing any previous has_priority relation so exactly one current priority remains.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "entityName": {
                    "type": "string",
                    "description": "Name of the entity"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low"],
                    "description": "The new priority value"
                }
            },
            "required": ["entityName", "priority"],
            "additionalProperties": false
        }),
    }
}

// ============================================================================
// Session tool definitions
// ============================================================================

/// Get the start session tool definition
fn get_start_session_tool() -> Tool {
    Tool {
        name: "startsession".to_string(),
        description: "Start a new analysis session. Returns a fresh session id and the canonical stage order (summary, datasetUpdates, newAnalyses, newVisualizations, hypothesisResults, modelUpdates, projectStatus, assembly).".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

/// Get the end session tool definition
fn get_end_session_tool() -> Tool {
    Tool {
        name: "endsession".to_string(),
        description: "Record one stage of an analysis session. Stages may arrive in any order; isRevision with revisesStage overwrites a prior record by 1-based position. Submitting the 'assembly' stage with nextStageNeeded=false commits all staged data to the graph in one batch.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "sessionId": {
                    "type": "string",
                    "description": "The session id from startsession"
                },
                "stage": {
                    "type": "string",
                    "enum": ["summary", "datasetUpdates", "newAnalyses", "newVisualizations", "hypothesisResults", "modelUpdates", "projectStatus", "assembly"],
                    "description": "Which stage this call records"
                },
                "stageNumber": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "1-based stage number"
                },
                "analysis": {
                    "type": "string",
                    "description": "Free-text analysis narrative for the stage"
                },
                "stageData": {
                    "description": "Stage-specific payload; either the bare value/list or an object keyed by the stage name"
                },
                "nextStageNeeded": {
                    "type": "boolean",
                    "description": "True while more stages are coming; false on the final call"
                },
                "isRevision": {
                    "type": "boolean",
                    "description": "Whether this call revises a previously recorded stage"
                },
                "revisesStage": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "1-based position of the record being revised"
                }
            },
            "required": ["sessionId", "stage", "stageNumber", "nextStageNeeded"],
            "additionalProperties": false
        }),
    }
}
