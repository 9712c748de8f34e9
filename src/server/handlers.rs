use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::graph::{EntityInput, ObservationDeletion, ObservationInput, RelationInput};
use crate::session::EndSessionParams;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        // Graph store tools
        "create_entities" => handle_create_entities(state, arguments).await,
        "create_relations" => handle_create_relations(state, arguments).await,
        "add_observations" => handle_add_observations(state, arguments).await,
        "delete_entities" => handle_delete_entities(state, arguments).await,
        "delete_observations" => handle_delete_observations(state, arguments).await,
        "delete_relations" => handle_delete_relations(state, arguments).await,
        "read_graph" => handle_read_graph(state).await,
        "search_nodes" => handle_search_nodes(state, arguments).await,
        "open_nodes" => handle_open_nodes(state, arguments).await,
        // View tools
        "get_project_overview" => handle_project_overview(state, arguments).await,
        "get_dataset_analysis" => handle_dataset_analysis(state, arguments).await,
        "get_hypothesis_tests" => handle_hypothesis_tests(state, arguments).await,
        "get_variable_relationships" => handle_variable_relationships(state, arguments).await,
        "get_statistical_results" => handle_statistical_results(state, arguments).await,
        "get_visualization_gallery" => handle_visualization_gallery(state, arguments).await,
        "get_model_performance" => handle_model_performance(state, arguments).await,
        "get_research_question_results" => handle_question_results(state, arguments).await,
        "get_variable_distribution" => handle_variable_distribution(state, arguments).await,
        // Status/priority tools
        "get_entity_status" => handle_get_status(state, arguments).await,
        "set_entity_status" => handle_set_status(state, arguments).await,
        "get_entity_priority" => handle_get_priority(state, arguments).await,
        "set_entity_priority" => handle_set_priority(state, arguments).await,
        // Session tools
        "startsession" => handle_start_session(state).await,
        "endsession" => handle_end_session(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

// ============================================================================
// Graph store handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateEntitiesParams {
    entities: Vec<EntityInput>,
}

async fn handle_create_entities(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "create_entities",
        arguments,
        |params: CreateEntitiesParams| state.graph.create_entities(params.entities),
    )
    .await
}

#[derive(Debug, Deserialize)]
struct CreateRelationsParams {
    relations: Vec<RelationInput>,
}

async fn handle_create_relations(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "create_relations",
        arguments,
        |params: CreateRelationsParams| state.graph.create_relations(params.relations),
    )
    .await
}

#[derive(Debug, Deserialize)]
struct AddObservationsParams {
    observations: Vec<ObservationInput>,
}

async fn handle_add_observations(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "add_observations",
        arguments,
        |params: AddObservationsParams| state.graph.add_observations(params.observations),
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEntitiesParams {
    entity_names: Vec<String>,
}

async fn handle_delete_entities(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "delete_entities",
        arguments,
        |params: DeleteEntitiesParams| async move {
            state.graph.delete_entities(params.entity_names).await?;
            Ok::<_, crate::error::GraphError>(Deleted { success: true })
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
struct DeleteObservationsParams {
    deletions: Vec<ObservationDeletion>,
}

async fn handle_delete_observations(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "delete_observations",
        arguments,
        |params: DeleteObservationsParams| async move {
            state.graph.delete_observations(params.deletions).await?;
            Ok::<_, crate::error::GraphError>(Deleted { success: true })
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
struct DeleteRelationsParams {
    relations: Vec<RelationInput>,
}

async fn handle_delete_relations(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "delete_relations",
        arguments,
        |params: DeleteRelationsParams| async move {
            state.graph.delete_relations(params.relations).await?;
            Ok::<_, crate::error::GraphError>(Deleted { success: true })
        },
    )
    .await
}

/// Minimal acknowledgement for delete operations.
#[derive(Debug, Serialize)]
struct Deleted {
    success: bool,
}

async fn handle_read_graph(state: &SharedState) -> McpResult<Value> {
    let graph = state.graph.read_graph().await?;
    serde_json::to_value(graph).map_err(McpError::Json)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

async fn handle_search_nodes(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("search_nodes", arguments, |params: SearchParams| async move {
        state.graph.search_nodes(&params.query).await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct OpenNodesParams {
    names: Vec<String>,
}

async fn handle_open_nodes(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("open_nodes", arguments, |params: OpenNodesParams| {
        state.graph.open_nodes(params.names)
    })
    .await
}

// ============================================================================
// View handlers
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectParams {
    project_name: String,
}

async fn handle_project_overview(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_project_overview",
        arguments,
        |params: ProjectParams| async move {
            state.views.project_overview(&params.project_name).await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetParams {
    dataset_name: String,
}

async fn handle_dataset_analysis(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_dataset_analysis",
        arguments,
        |params: DatasetParams| async move {
            state.views.dataset_analysis(&params.dataset_name).await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HypothesisTestsParams {
    project_name: String,
    #[serde(default)]
    hypothesis_name: Option<String>,
}

async fn handle_hypothesis_tests(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_hypothesis_tests",
        arguments,
        |params: HypothesisTestsParams| async move {
            state
                .views
                .hypothesis_tests(&params.project_name, params.hypothesis_name.as_deref())
                .await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableParams {
    variable_name: String,
}

async fn handle_variable_relationships(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_variable_relationships",
        arguments,
        |params: VariableParams| async move {
            state
                .views
                .variable_relationships(&params.variable_name)
                .await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatisticalResultsParams {
    project_name: String,
    #[serde(default)]
    test_type: Option<String>,
}

async fn handle_statistical_results(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_statistical_results",
        arguments,
        |params: StatisticalResultsParams| async move {
            state
                .views
                .statistical_results(&params.project_name, params.test_type.as_deref())
                .await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryParams {
    project_name: String,
    #[serde(default)]
    dataset_name: Option<String>,
}

async fn handle_visualization_gallery(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_visualization_gallery",
        arguments,
        |params: GalleryParams| async move {
            state
                .views
                .visualization_gallery(&params.project_name, params.dataset_name.as_deref())
                .await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelParams {
    model_name: String,
}

async fn handle_model_performance(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_model_performance",
        arguments,
        |params: ModelParams| async move {
            state.views.model_performance(&params.model_name).await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionParams {
    question_name: String,
}

async fn handle_question_results(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_research_question_results",
        arguments,
        |params: QuestionParams| async move {
            state
                .views
                .research_question_results(&params.question_name)
                .await
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DistributionParams {
    variable_name: String,
    #[serde(default)]
    dataset_name: Option<String>,
}

async fn handle_variable_distribution(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "get_variable_distribution",
        arguments,
        |params: DistributionParams| async move {
            state
                .views
                .variable_distribution(&params.variable_name, params.dataset_name.as_deref())
                .await
        },
    )
    .await
}

// ============================================================================
// Status/priority handlers
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityNameParams {
    entity_name: String,
}

/// Status of one entity, as returned to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResult {
    entity_name: String,
    status: Option<String>,
}

/// Priority of one entity, as returned to the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityResult {
    entity_name: String,
    priority: Option<String>,
}

async fn handle_get_status(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "get_entity_status",
        arguments,
        |params: EntityNameParams| async move {
            let status = state.status.get_status(&params.entity_name).await?;
            Ok::<_, crate::error::GraphError>(StatusResult {
                entity_name: params.entity_name,
                status,
            })
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStatusParams {
    entity_name: String,
    status: String,
}

async fn handle_set_status(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "set_entity_status",
        arguments,
        |params: SetStatusParams| async move {
            state
                .status
                .set_status(&params.entity_name, &params.status)
                .await?;
            Ok::<_, crate::error::GraphError>(StatusResult {
                entity_name: params.entity_name,
                status: Some(params.status),
            })
        },
    )
    .await
}

async fn handle_get_priority(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "get_entity_priority",
        arguments,
        |params: EntityNameParams| async move {
            let priority = state.status.get_priority(&params.entity_name).await?;
            Ok::<_, crate::error::GraphError>(PriorityResult {
                entity_name: params.entity_name,
                priority,
            })
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPriorityParams {
    entity_name: String,
    priority: String,
}

async fn handle_set_priority(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "set_entity_priority",
        arguments,
        |params: SetPriorityParams| async move {
            state
                .status
                .set_priority(&params.entity_name, &params.priority)
                .await?;
            Ok::<_, crate::error::GraphError>(PriorityResult {
                entity_name: params.entity_name,
                priority: Some(params.priority),
            })
        },
    )
    .await
}

// ============================================================================
// Session handlers
// ============================================================================

async fn handle_start_session(state: &SharedState) -> McpResult<Value> {
    let result = state.sessions.start_session().await?;
    serde_json::to_value(result).map_err(McpError::Json)
}

async fn handle_end_session(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("endsession", arguments, |params: EndSessionParams| {
        state.sessions.end_session(params)
    })
    .await
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Generic handler that executes an operation with consistent error
/// handling: argument parsing with typed deserialization, error conversion
/// to McpError, and result serialization to a JSON value.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: std::fmt::Display,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    let result = operation(params)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    serde_json::to_value(result).map_err(McpError::Json)
}
