//! Session lifecycle and the terminal assembly commit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::graph::{
    status::{ensure_value_entities, set_status_edge},
    Entity, EntityType, KnowledgeGraph, RelationType, StatusValue,
};
use crate::session::{AssemblyData, Stage, StageRecord, STAGE_ORDER};
use crate::storage::FileStore;

/// Result of starting a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResult {
    /// The generated session id.
    pub session_id: String,
    /// The canonical stage order, as caller guidance.
    pub stages: Vec<String>,
}

/// Parameters of an `endsession` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionParams {
    /// The session to record against.
    pub session_id: String,
    /// Stage name (one of the eight stages).
    pub stage: String,
    /// Caller-supplied 1-based stage number.
    pub stage_number: u32,
    /// Free-text analysis narrative.
    #[serde(default)]
    pub analysis: Option<String>,
    /// Stage-specific payload.
    #[serde(default)]
    pub stage_data: Value,
    /// Whether the caller intends to submit further stages.
    pub next_stage_needed: bool,
    /// Whether this call revises a previously recorded stage.
    #[serde(default)]
    pub is_revision: bool,
    /// 1-based position of the record being revised.
    #[serde(default)]
    pub revises_stage: Option<u32>,
}

/// Result of an `endsession` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResult {
    /// The session id.
    pub session_id: String,
    /// The stage that was recorded.
    pub stage: Stage,
    /// How many stage records the session now has.
    pub total_stages: usize,
    /// Whether the caller signalled more stages are coming.
    pub next_stage_needed: bool,
    /// Present when this call triggered the assembly commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitSummary>,
}

/// What an assembly commit changed in the graph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    /// The project the commit targeted.
    pub project: String,
    /// Datasets created or updated.
    pub datasets_updated: usize,
    /// Statistical tests created.
    pub analyses_created: usize,
    /// Visualizations created.
    pub visualizations_created: usize,
    /// Hypotheses created or updated.
    pub hypotheses_updated: usize,
    /// Models created or updated.
    pub models_updated: usize,
    /// The status set on the project, if any.
    pub status: Option<String>,
}

/// The session stage machine.
///
/// Accumulates stage records per session id and, on the terminal assembly
/// stage, translates the staged data into one batch of graph mutations.
/// The commit runs as a single in-memory transform persisted once, so a
/// failed commit leaves the graph file unchanged.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    files: FileStore,
}

impl SessionMachine {
    /// Create a machine over the given files
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Start a new session and persist its (empty) stage list.
    ///
    /// The id combines a millisecond timestamp with a random suffix, so ids
    /// never collide with entries already in the table.
    pub async fn start_session(&self) -> SessionResult<StartSessionResult> {
        let mut table = self.files.load_sessions().await?;

        let mut session_id = new_session_id();
        while table.contains_key(&session_id) {
            session_id = new_session_id();
        }
        table.insert(session_id.clone(), Vec::new());
        self.files.save_sessions(&table).await?;

        info!(session = %session_id, "Session started");
        Ok(StartSessionResult {
            session_id,
            stages: STAGE_ORDER.iter().map(Stage::to_string).collect(),
        })
    }

    /// Record (or revise) a stage; commit when the terminal assembly stage
    /// arrives with `next_stage_needed = false`.
    pub async fn end_session(&self, params: EndSessionParams) -> SessionResult<EndSessionResult> {
        let stage: Stage = params.stage.parse()?;

        let mut table = self.files.load_sessions().await?;
        let records =
            table
                .get_mut(&params.session_id)
                .ok_or_else(|| SessionError::SessionNotFound {
                    session_id: params.session_id.clone(),
                })?;

        let record = StageRecord::new(
            stage,
            params.stage_number,
            params.analysis.unwrap_or_default(),
            params.stage_data,
        )
        .completed(!params.next_stage_needed);

        if params.is_revision {
            let position = params.revises_stage.unwrap_or(params.stage_number);
            let index = position.checked_sub(1).map(|i| i as usize);
            match index {
                Some(i) if i < records.len() => records[i] = record,
                _ => {
                    return Err(SessionError::InvalidRevision {
                        stage_number: position,
                        recorded: records.len(),
                    })
                }
            }
        } else {
            records.push(record);
        }

        let total_stages = records.len();
        let snapshot = records.clone();
        self.files.save_sessions(&table).await?;

        let commit = if stage == Stage::Assembly && !params.next_stage_needed {
            Some(self.commit(&params.session_id, &snapshot).await?)
        } else {
            None
        };

        Ok(EndSessionResult {
            session_id: params.session_id,
            stage,
            total_stages,
            next_stage_needed: params.next_stage_needed,
            commit,
        })
    }

    /// Translate the session's staged data into one batch of graph
    /// mutations, persisted with a single save.
    async fn commit(
        &self,
        session_id: &str,
        records: &[StageRecord],
    ) -> SessionResult<CommitSummary> {
        let mut data = AssemblyData::default();
        for record in records {
            data.absorb(record)?;
        }

        let project = data.project.clone().ok_or(SessionError::MissingProject)?;

        // Validate before touching the graph so a bad status cannot leave a
        // half-applied commit behind.
        let status: Option<StatusValue> = match &data.project_status {
            Some(value) => Some(value.parse()?),
            None => None,
        };

        let mut graph = self.files.load_graph().await?;
        if !graph.has_entity(&project) {
            graph
                .entities
                .push(Entity::new(project.clone(), EntityType::Project));
        }

        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let mut summary = CommitSummary {
            project: project.clone(),
            datasets_updated: 0,
            analyses_created: 0,
            visualizations_created: 0,
            hypotheses_updated: 0,
            models_updated: 0,
            status: data.project_status.clone(),
        };

        for update in &data.dataset_updates {
            apply_dataset_update(&mut graph, &project, update);
            summary.datasets_updated += 1;
        }

        for (i, analysis) in data.new_analyses.iter().enumerate() {
            let name = analysis
                .name
                .clone()
                .unwrap_or_else(|| format!("Analysis_{}_{}", timestamp, i));
            let mut entity = Entity::new(name.clone(), EntityType::StatisticalTest);
            if let Some(kind) = &analysis.analysis_type {
                entity.replace_keyed_observation("Type", kind);
            }
            if let Some(result) = &analysis.result {
                entity.replace_keyed_observation("Result", result);
            }
            graph.insert_entities(vec![entity]);
            graph.link(&name, &project, RelationType::PartOf);
            for variable in &analysis.variables {
                if graph.has_entity(variable) {
                    graph.link(&name, variable, RelationType::Analyzes);
                } else {
                    warn!(session = %session_id, variable = %variable, "Skipping analyzes link to unknown variable");
                }
            }
            summary.analyses_created += 1;
        }

        for (i, viz) in data.new_visualizations.iter().enumerate() {
            let name = viz
                .name
                .clone()
                .unwrap_or_else(|| format!("Visualization_{}_{}", timestamp, i));
            let mut entity = Entity::new(name.clone(), EntityType::Visualization);
            if let Some(kind) = &viz.viz_type {
                entity.replace_keyed_observation("Type", kind);
            }
            if let Some(description) = &viz.description {
                entity.replace_keyed_observation("Description", description);
            }
            graph.insert_entities(vec![entity]);
            graph.link(&name, &project, RelationType::PartOf);
            if let Some(dataset) = &viz.dataset {
                if graph.has_entity(dataset) {
                    graph.link(&name, dataset, RelationType::Visualizes);
                }
            }
            summary.visualizations_created += 1;
        }

        for result in &data.hypothesis_results {
            apply_hypothesis_result(&mut graph, &project, result);
            summary.hypotheses_updated += 1;
        }

        for update in &data.model_updates {
            graph
                .insert_entities(vec![Entity::new(update.name.clone(), EntityType::Model)]);
            if let Some(entity) = graph.find_entity_mut(&update.name) {
                if let Some(performance) = &update.performance {
                    entity.replace_keyed_observation("Performance", performance);
                }
            }
            graph.link(&update.name, &project, RelationType::PartOf);
            if let Some(dataset) = &update.dataset {
                if graph.has_entity(dataset) {
                    graph.link(&update.name, dataset, RelationType::TrainedOn);
                }
            }
            summary.models_updated += 1;
        }

        if let Some(status) = status {
            ensure_value_entities(&mut graph);
            set_status_edge(&mut graph, &project, status);
        }
        if let Some(observation) = &data.status_observation {
            graph.append_observations(&project, std::slice::from_ref(observation))?;
        }
        if let Some(text) = &data.summary {
            graph.append_observations(&project, &[format!("Summary: {}", text)])?;
        }

        self.files.save_graph(&graph).await?;
        info!(
            session = %session_id,
            project = %summary.project,
            analyses = summary.analyses_created,
            "Session committed to graph"
        );
        Ok(summary)
    }
}

fn new_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}

fn apply_dataset_update(
    graph: &mut KnowledgeGraph,
    project: &str,
    update: &crate::session::DatasetUpdate,
) {
    let created = graph
        .insert_entities(vec![Entity::new(update.name.clone(), EntityType::Dataset)])
        .len()
        == 1;
    if let Some(entity) = graph.find_entity_mut(&update.name) {
        if let Some(size) = &update.size {
            entity.replace_keyed_observation("Size", size);
        }
        if let Some(variables) = update.variables {
            entity.replace_keyed_observation("Variables", &variables.to_string());
        }
        if let Some(status) = &update.status {
            entity.replace_keyed_observation("Status", status);
        }
    }
    if created {
        graph.link(&update.name, project, RelationType::PartOf);
    }
}

fn apply_hypothesis_result(
    graph: &mut KnowledgeGraph,
    project: &str,
    result: &crate::session::HypothesisResult,
) {
    let created = graph
        .insert_entities(vec![Entity::new(
            result.hypothesis.clone(),
            EntityType::Hypothesis,
        )])
        .len()
        == 1;
    if let Some(entity) = graph.find_entity_mut(&result.hypothesis) {
        if let Some(supported) = result.supported {
            let status = if supported { "supported" } else { "rejected" };
            entity.replace_keyed_observation("Status", status);
        }
        if let Some(evidence) = &result.evidence {
            entity.replace_keyed_observation("Evidence", evidence);
        }
    }
    if created {
        graph.link(&result.hypothesis, project, RelationType::PartOf);
    }
    if let Some(test) = &result.test {
        if graph.has_entity(test) {
            graph.link(&result.hypothesis, test, RelationType::TestedBy);
        }
    }
}
