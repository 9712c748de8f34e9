//! Read-only view queries.
//!
//! Each view loads the graph, locates a seed entity by name and required
//! type, then assembles a denormalized report by following relation edges
//! one or two hops out. Views never persist anything; every call is a pure
//! function of the current snapshot. Traversal is a linear scan over the
//! relation list, which is fine at the single-researcher scale this store
//! targets.

mod dataset;
mod hypothesis;
mod project;
mod variable;
mod visualization;

pub use dataset::{
    DatasetAnalysis, DatasetMetadata, VariableClassification, VariableDistribution,
};
pub use hypothesis::{
    HypothesisTestSummary, HypothesisTestsReport, StatisticalResultsReport, StatisticalTestDetail,
    TestWithResults,
};
pub use project::{
    DataCollectionSummary, HypothesisSummary, ProjectOverview, QuestionHypothesis,
    ResearchQuestionResults,
};
pub use variable::{CorrelationInfo, VariableRelationships};
pub use visualization::{ModelPerformance, VisualizationGallery, VisualizationInfo};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{observation_value, Entity};
use crate::storage::FileStore;

/// A named entity with its observations, as embedded in view reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    /// Entity name.
    pub name: String,
    /// The entity's observations.
    pub observations: Vec<String>,
}

impl From<&Entity> for EntitySummary {
    fn from(entity: &Entity) -> Self {
        Self {
            name: entity.name.clone(),
            observations: entity.observations.clone(),
        }
    }
}

/// Collect `key: value` observations for the given keys into a map.
///
/// Map keys are lowercased; observations without a match are skipped.
pub(crate) fn metric_map(observations: &[String], keys: &[&str]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for key in keys {
        if let Some(value) = observation_value(observations, key) {
            map.insert(key.to_lowercase(), value);
        }
    }
    map
}

/// Push a name if not already present, preserving insertion order.
pub(crate) fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// The view query engine.
///
/// Holds the file store and re-loads the graph for every call; there is no
/// cached index, so views always see the latest persisted snapshot.
#[derive(Debug, Clone)]
pub struct ViewEngine {
    files: FileStore,
}

impl ViewEngine {
    /// Create an engine over the given files
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Overview of a project: questions, datasets, hypotheses, models,
    /// findings, and derived methodology/participant notes.
    pub async fn project_overview(&self, project: &str) -> GraphResult<ProjectOverview> {
        let graph = self.files.load_graph().await?;
        project::build_overview(&graph, project)
    }

    /// Analysis summary of one dataset: metadata, classified variables,
    /// and the tests, models, and visualizations touching it.
    pub async fn dataset_analysis(&self, dataset: &str) -> GraphResult<DatasetAnalysis> {
        let graph = self.files.load_graph().await?;
        dataset::build_analysis(&graph, dataset)
    }

    /// Hypotheses of a project (or one named hypothesis) with their tests
    /// and each test's results.
    pub async fn hypothesis_tests(
        &self,
        project: &str,
        hypothesis: Option<&str>,
    ) -> GraphResult<HypothesisTestsReport> {
        let graph = self.files.load_graph().await?;
        hypothesis::build_tests(&graph, project, hypothesis)
    }

    /// Everything connected to one variable: containing datasets,
    /// correlations, prediction edges, moderation/mediation, analyses.
    pub async fn variable_relationships(
        &self,
        variable: &str,
    ) -> GraphResult<VariableRelationships> {
        let graph = self.files.load_graph().await?;
        variable::build_relationships(&graph, variable)
    }

    /// A project's statistical tests grouped by test type, with the
    /// significance heuristic applied per test.
    pub async fn statistical_results(
        &self,
        project: &str,
        test_type: Option<&str>,
    ) -> GraphResult<StatisticalResultsReport> {
        let graph = self.files.load_graph().await?;
        hypothesis::build_statistical_results(&graph, project, test_type)
    }

    /// Visualizations of a project (or one of its datasets) grouped by type.
    pub async fn visualization_gallery(
        &self,
        project: &str,
        dataset: Option<&str>,
    ) -> GraphResult<VisualizationGallery> {
        let graph = self.files.load_graph().await?;
        visualization::build_gallery(&graph, project, dataset)
    }

    /// One model's metrics, training data, and prediction targets.
    pub async fn model_performance(&self, model: &str) -> GraphResult<ModelPerformance> {
        let graph = self.files.load_graph().await?;
        visualization::build_model_performance(&graph, model)
    }

    /// Hypotheses, findings, and results addressing a research question.
    pub async fn research_question_results(
        &self,
        question: &str,
    ) -> GraphResult<ResearchQuestionResults> {
        let graph = self.files.load_graph().await?;
        project::build_question_results(&graph, question)
    }

    /// Distribution statistics of a variable, optionally validated against
    /// a containing dataset.
    pub async fn variable_distribution(
        &self,
        variable: &str,
        dataset: Option<&str>,
    ) -> GraphResult<VariableDistribution> {
        let graph = self.files.load_graph().await?;
        dataset::build_distribution(&graph, variable, dataset)
    }
}
