//! Session stage machine types.
//!
//! A session accumulates staged analysis updates across multiple calls.
//! Each call records a [`StageRecord`]; the terminal `assembly` stage turns
//! the accumulated records into one batch of graph mutations (see
//! [`machine`]). The persisted session table is a mapping from session id
//! to the ordered list of records and is independent of the graph file.

mod machine;

pub use machine::{
    CommitSummary, EndSessionParams, EndSessionResult, SessionMachine, StartSessionResult,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// Persisted session table: session id to ordered stage records.
pub type SessionTable = BTreeMap<String, Vec<StageRecord>>;

/// The record tag stored with every stage record.
pub const STAGE_RECORD_TYPE: &str = "analysis_stage";

/// A stage of the analysis session workflow.
///
/// The caller supplies the stage on every call; ordering is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Narrative summary of the session.
    Summary,
    /// Dataset size/variables/status updates.
    DatasetUpdates,
    /// Newly run statistical analyses.
    NewAnalyses,
    /// Newly created visualizations.
    NewVisualizations,
    /// Hypothesis support outcomes.
    HypothesisResults,
    /// Model training or performance updates.
    ModelUpdates,
    /// New project status.
    ProjectStatus,
    /// Terminal stage: assemble and commit everything to the graph.
    Assembly,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Summary => write!(f, "summary"),
            Stage::DatasetUpdates => write!(f, "datasetUpdates"),
            Stage::NewAnalyses => write!(f, "newAnalyses"),
            Stage::NewVisualizations => write!(f, "newVisualizations"),
            Stage::HypothesisResults => write!(f, "hypothesisResults"),
            Stage::ModelUpdates => write!(f, "modelUpdates"),
            Stage::ProjectStatus => write!(f, "projectStatus"),
            Stage::Assembly => write!(f, "assembly"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(Stage::Summary),
            "datasetUpdates" => Ok(Stage::DatasetUpdates),
            "newAnalyses" => Ok(Stage::NewAnalyses),
            "newVisualizations" => Ok(Stage::NewVisualizations),
            "hypothesisResults" => Ok(Stage::HypothesisResults),
            "modelUpdates" => Ok(Stage::ModelUpdates),
            "projectStatus" => Ok(Stage::ProjectStatus),
            "assembly" => Ok(Stage::Assembly),
            _ => Err(SessionError::InvalidStage {
                value: s.to_string(),
            }),
        }
    }
}

/// The canonical stage order, used for caller guidance only.
pub const STAGE_ORDER: [Stage; 8] = [
    Stage::Summary,
    Stage::DatasetUpdates,
    Stage::NewAnalyses,
    Stage::NewVisualizations,
    Stage::HypothesisResults,
    Stage::ModelUpdates,
    Stage::ProjectStatus,
    Stage::Assembly,
];

/// One recorded stage of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    /// Record tag, always `"analysis_stage"` when embedded in session state.
    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,
    /// Which stage this record belongs to.
    pub stage: Stage,
    /// Caller-supplied 1-based stage number.
    pub stage_number: u32,
    /// Free-text analysis narrative for the stage.
    #[serde(default)]
    pub analysis: String,
    /// Stage-specific payload, parsed at commit time.
    #[serde(default)]
    pub stage_data: Value,
    /// Whether the caller considers the session complete after this stage.
    pub completed: bool,
}

fn default_record_type() -> String {
    STAGE_RECORD_TYPE.to_string()
}

impl StageRecord {
    /// Create a new stage record
    pub fn new(stage: Stage, stage_number: u32, analysis: String, stage_data: Value) -> Self {
        Self {
            record_type: default_record_type(),
            stage,
            stage_number,
            analysis,
            stage_data,
            completed: false,
        }
    }

    /// Mark the record completed
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

// ============================================================================
// Stage data shapes, parsed out of StageRecord::stage_data at commit time
// ============================================================================

/// A dataset upsert staged in `datasetUpdates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetUpdate {
    /// Dataset entity name.
    pub name: String,
    /// New size description, replaces any `Size:` observation.
    #[serde(default)]
    pub size: Option<String>,
    /// New variable count, replaces any `Variables:` observation.
    #[serde(default)]
    pub variables: Option<u64>,
    /// New status text, replaces any `Status:` observation.
    #[serde(default)]
    pub status: Option<String>,
}

/// A statistical analysis staged in `newAnalyses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisUpdate {
    /// Test entity name; derived (`Analysis_<timestamp>_<i>`) when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Kind of test (e.g. "regression", "t-test").
    #[serde(rename = "type", default)]
    pub analysis_type: Option<String>,
    /// Variables the analysis covers, linked via `analyzes`.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Free-text result summary.
    #[serde(default)]
    pub result: Option<String>,
}

/// A visualization staged in `newVisualizations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationUpdate {
    /// Visualization entity name; derived when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Kind of visualization (e.g. "scatter", "histogram").
    #[serde(rename = "type", default)]
    pub viz_type: Option<String>,
    /// Dataset the visualization depicts, linked via `visualizes`.
    #[serde(default)]
    pub dataset: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A hypothesis outcome staged in `hypothesisResults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisResult {
    /// Hypothesis entity name (created if absent from the graph).
    pub hypothesis: String,
    /// Whether the hypothesis was supported.
    #[serde(default)]
    pub supported: Option<bool>,
    /// Free-text evidence summary.
    #[serde(default)]
    pub evidence: Option<String>,
    /// Test that produced the outcome, linked via `tested_by`.
    #[serde(default)]
    pub test: Option<String>,
}

/// A model update staged in `modelUpdates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUpdate {
    /// Model entity name.
    pub name: String,
    /// Performance summary, replaces any `Performance:` observation.
    #[serde(default)]
    pub performance: Option<String>,
    /// Training dataset, linked via `trained_on`.
    #[serde(default)]
    pub dataset: Option<String>,
}

/// Everything a terminal assembly commit operates on, merged from the
/// session's stage records (later records of the same stage win) and the
/// assembly record's own payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssemblyData {
    /// Project the commit targets. Required.
    pub project: Option<String>,
    /// Session summary appended to the project as an observation.
    pub summary: Option<String>,
    /// Dataset upserts.
    pub dataset_updates: Vec<DatasetUpdate>,
    /// Analyses to create.
    pub new_analyses: Vec<AnalysisUpdate>,
    /// Visualizations to create.
    pub new_visualizations: Vec<VisualizationUpdate>,
    /// Hypothesis outcomes to apply.
    pub hypothesis_results: Vec<HypothesisResult>,
    /// Model upserts.
    pub model_updates: Vec<ModelUpdate>,
    /// New project status, set via the status subsystem.
    pub project_status: Option<String>,
    /// Free-text project observation appended alongside the status.
    pub status_observation: Option<String>,
}

impl AssemblyData {
    /// Merge one stage record's payload into the accumulating assembly.
    ///
    /// Callers stage data loosely; each stage accepts either the bare
    /// payload (a string or a list) or an object keyed by the stage name.
    pub fn absorb(&mut self, record: &StageRecord) -> SessionResult<()> {
        match record.stage {
            Stage::Summary => {
                if let Some(text) = extract_text(&record.stage_data, "summary") {
                    self.summary = Some(text);
                }
            }
            Stage::DatasetUpdates => {
                self.dataset_updates =
                    extract_list(&record.stage_data, "datasetUpdates", record.stage)?;
            }
            Stage::NewAnalyses => {
                self.new_analyses = extract_list(&record.stage_data, "newAnalyses", record.stage)?;
            }
            Stage::NewVisualizations => {
                self.new_visualizations =
                    extract_list(&record.stage_data, "newVisualizations", record.stage)?;
            }
            Stage::HypothesisResults => {
                self.hypothesis_results =
                    extract_list(&record.stage_data, "hypothesisResults", record.stage)?;
            }
            Stage::ModelUpdates => {
                self.model_updates =
                    extract_list(&record.stage_data, "modelUpdates", record.stage)?;
            }
            Stage::ProjectStatus => {
                if let Some(text) = extract_text(&record.stage_data, "projectStatus") {
                    self.project_status = Some(text);
                }
                if let Some(obs) = extract_text(&record.stage_data, "observation") {
                    self.status_observation = Some(obs);
                }
            }
            Stage::Assembly => {
                let assembled: AssemblyData = serde_json::from_value(record.stage_data.clone())
                    .map_err(|e| SessionError::StageData {
                        message: format!("assembly data: {}", e),
                    })?;
                self.overlay(assembled);
            }
        }
        Ok(())
    }

    /// Overlay a parsed assembly payload, taking its non-empty fields.
    fn overlay(&mut self, other: AssemblyData) {
        if other.project.is_some() {
            self.project = other.project;
        }
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        if !other.dataset_updates.is_empty() {
            self.dataset_updates = other.dataset_updates;
        }
        if !other.new_analyses.is_empty() {
            self.new_analyses = other.new_analyses;
        }
        if !other.new_visualizations.is_empty() {
            self.new_visualizations = other.new_visualizations;
        }
        if !other.hypothesis_results.is_empty() {
            self.hypothesis_results = other.hypothesis_results;
        }
        if !other.model_updates.is_empty() {
            self.model_updates = other.model_updates;
        }
        if other.project_status.is_some() {
            self.project_status = other.project_status;
        }
        if other.status_observation.is_some() {
            self.status_observation = other.status_observation;
        }
    }
}

/// Pull a string out of stage data: either the bare string or `{key: ...}`.
fn extract_text(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Pull a typed list out of stage data: either the bare array or `{key: [...]}`.
fn extract_list<T: serde::de::DeserializeOwned>(
    value: &Value,
    key: &str,
    stage: Stage,
) -> SessionResult<Vec<T>> {
    let list = match value {
        Value::Array(_) => value.clone(),
        Value::Object(map) => match map.get(key) {
            Some(inner) => inner.clone(),
            None => return Ok(Vec::new()),
        },
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(SessionError::StageData {
                message: format!("{} data must be a list or an object with `{}`", stage, key),
            })
        }
    };
    serde_json::from_value(list).map_err(|e| SessionError::StageData {
        message: format!("{} data: {}", stage, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_stage_serde_strings() {
        assert_eq!(
            serde_json::to_string(&Stage::DatasetUpdates).unwrap(),
            "\"datasetUpdates\""
        );
        let parsed: Stage = serde_json::from_str("\"hypothesisResults\"").unwrap();
        assert_eq!(parsed, Stage::HypothesisResults);
    }

    #[test]
    fn test_stage_from_str_rejects_unknown() {
        let err = "cleanup".parse::<Stage>().unwrap_err();
        assert!(err.to_string().contains("cleanup"));
    }

    #[test]
    fn test_stage_record_carries_type_tag() {
        let record = StageRecord::new(Stage::Summary, 1, "notes".to_string(), json!("text"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], json!("analysis_stage"));
        assert_eq!(value["stage"], json!("summary"));
        assert_eq!(value["stageNumber"], json!(1));
    }

    #[test]
    fn test_absorb_summary_from_bare_string_and_object() {
        let mut data = AssemblyData::default();
        let record = StageRecord::new(Stage::Summary, 1, String::new(), json!("ran the models"));
        data.absorb(&record).unwrap();
        assert_eq!(data.summary.as_deref(), Some("ran the models"));

        let record = StageRecord::new(
            Stage::Summary,
            1,
            String::new(),
            json!({"summary": "revised"}),
        );
        data.absorb(&record).unwrap();
        assert_eq!(data.summary.as_deref(), Some("revised"));
    }

    #[test]
    fn test_absorb_dataset_updates_both_shapes() {
        let bare = json!([{"name": "Survey", "size": "300 rows"}]);
        let keyed = json!({"datasetUpdates": [{"name": "Survey", "variables": 12}]});

        let mut data = AssemblyData::default();
        data.absorb(&StageRecord::new(
            Stage::DatasetUpdates,
            2,
            String::new(),
            bare,
        ))
        .unwrap();
        assert_eq!(data.dataset_updates[0].size.as_deref(), Some("300 rows"));

        data.absorb(&StageRecord::new(
            Stage::DatasetUpdates,
            2,
            String::new(),
            keyed,
        ))
        .unwrap();
        assert_eq!(data.dataset_updates[0].variables, Some(12));
    }

    #[test]
    fn test_absorb_rejects_malformed_list() {
        let mut data = AssemblyData::default();
        let record = StageRecord::new(Stage::ModelUpdates, 6, String::new(), json!(42));
        let err = data.absorb(&record).unwrap_err();
        assert!(matches!(err, SessionError::StageData { .. }));
    }

    #[test]
    fn test_assembly_overlay_takes_latest() {
        let mut data = AssemblyData::default();
        data.absorb(&StageRecord::new(
            Stage::ProjectStatus,
            7,
            String::new(),
            json!({"projectStatus": "active", "observation": "mid-study"}),
        ))
        .unwrap();
        data.absorb(&StageRecord::new(
            Stage::Assembly,
            8,
            String::new(),
            json!({"project": "Proj", "projectStatus": "completed"}),
        ))
        .unwrap();

        assert_eq!(data.project.as_deref(), Some("Proj"));
        assert_eq!(data.project_status.as_deref(), Some("completed"));
        // assembly did not restate the observation, so the staged one stays
        assert_eq!(data.status_observation.as_deref(), Some("mid-study"));
    }

    #[test]
    fn test_session_table_round_trip() {
        let mut table = SessionTable::default();
        table.insert(
            "session_1".to_string(),
            vec![StageRecord::new(
                Stage::Summary,
                1,
                "notes".to_string(),
                json!("text"),
            )],
        );
        let json = serde_json::to_string(&table).unwrap();
        let parsed: SessionTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["session_1"].len(), 1);
        assert_eq!(parsed["session_1"][0].record_type, STAGE_RECORD_TYPE);
    }
}
