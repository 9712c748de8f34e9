//! Integration tests for MCP tool routing.
//!
//! Drives `handle_tool_call` with JSON arguments the way the protocol
//! layer does, checking success payloads and error results.

use std::sync::Arc;

use mcp_research_graph::config::{Config, LogFormat, LoggingConfig, StorageConfig};
use mcp_research_graph::error::McpError;
use mcp_research_graph::server::{handle_tool_call, AppState, SharedState};
use mcp_research_graph::storage::FileStore;
use serde_json::json;
use tempfile::TempDir;

fn create_test_state(dir: &TempDir) -> SharedState {
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
    Arc::new(AppState::new(config, files))
}

#[tokio::test]
async fn test_unknown_tool() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    let err = handle_tool_call(&state, "nonexistent_tool", None)
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::UnknownTool { .. }));
    assert!(err.to_string().contains("nonexistent_tool"));
}

#[tokio::test]
async fn test_create_entities_through_tool_boundary() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    let result = handle_tool_call(
        &state,
        "create_entities",
        Some(json!({
            "entities": [
                {"name": "Wellbeing", "entityType": "project"},
                {"name": "Panel2024", "entityType": "dataset", "observations": ["Size: 500"]}
            ]
        })),
    )
    .await
    .unwrap();

    let created = result.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[1]["entityType"], json!("dataset"));

    let graph = handle_tool_call(&state, "read_graph", None).await.unwrap();
    assert_eq!(graph["entities"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_entity_type_is_failure_result_and_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    handle_tool_call(
        &state,
        "create_entities",
        Some(json!({"entities": [{"name": "Keep", "entityType": "project"}]})),
    )
    .await
    .unwrap();
    let before = handle_tool_call(&state, "read_graph", None).await.unwrap();

    let err = handle_tool_call(
        &state,
        "create_entities",
        Some(json!({"entities": [{"name": "Bad", "entityType": "not_a_type"}]})),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, McpError::ExecutionFailed { .. }));
    assert!(err.to_string().contains("Invalid entity type"));

    let after = handle_tool_call(&state, "read_graph", None).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_missing_arguments_name_the_tool() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    let err = handle_tool_call(&state, "search_nodes", None)
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::InvalidParameters { .. }));
    assert!(err.to_string().contains("search_nodes"));
}

#[tokio::test]
async fn test_search_nodes_through_tool_boundary() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    handle_tool_call(
        &state,
        "create_entities",
        Some(json!({
            "entities": [
                {"name": "Age_Income_Regression", "entityType": "statisticalTest",
                 "observations": ["tests income vs age"]},
                {"name": "unrelated", "entityType": "variable"}
            ]
        })),
    )
    .await
    .unwrap();

    let result = handle_tool_call(
        &state,
        "search_nodes",
        Some(json!({"query": "income regression"})),
    )
    .await
    .unwrap();

    let entities = result["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["name"], json!("Age_Income_Regression"));
}

#[tokio::test]
async fn test_status_tools_round_trip() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    handle_tool_call(
        &state,
        "create_entities",
        Some(json!({"entities": [{"name": "P1", "entityType": "project"}]})),
    )
    .await
    .unwrap();

    let set = handle_tool_call(
        &state,
        "set_entity_status",
        Some(json!({"entityName": "P1", "status": "active"})),
    )
    .await
    .unwrap();
    assert_eq!(set["status"], json!("active"));

    let get = handle_tool_call(
        &state,
        "get_entity_status",
        Some(json!({"entityName": "P1"})),
    )
    .await
    .unwrap();
    assert_eq!(get["status"], json!("active"));

    let err = handle_tool_call(
        &state,
        "set_entity_status",
        Some(json!({"entityName": "P1", "status": "nope"})),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Invalid status value"));
}

#[tokio::test]
async fn test_session_tools_through_tool_boundary() {
    let dir = TempDir::new().unwrap();
    let state = create_test_state(&dir);

    handle_tool_call(
        &state,
        "create_entities",
        Some(json!({"entities": [{"name": "Wellbeing", "entityType": "project"}]})),
    )
    .await
    .unwrap();

    let started = handle_tool_call(&state, "startsession", None).await.unwrap();
    let session_id = started["sessionId"].as_str().unwrap().to_string();
    assert_eq!(started["stages"].as_array().unwrap().len(), 8);

    let ended = handle_tool_call(
        &state,
        "endsession",
        Some(json!({
            "sessionId": session_id,
            "stage": "assembly",
            "stageNumber": 1,
            "stageData": {"project": "Wellbeing", "projectStatus": "active"},
            "nextStageNeeded": false
        })),
    )
    .await
    .unwrap();

    assert_eq!(ended["commit"]["project"], json!("Wellbeing"));
    assert_eq!(ended["commit"]["status"], json!("active"));

    let graph = handle_tool_call(&state, "read_graph", None).await.unwrap();
    let relations = graph["relations"].as_array().unwrap();
    assert!(relations.iter().any(|r| {
        r["from"] == json!("Wellbeing")
            && r["to"] == json!("status:active")
            && r["relationType"] == json!("has_status")
    }));
}
