//! Dataset analysis and variable distribution views.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    any_observation_contains, observation_value, EntityType, KnowledgeGraph, Relation,
    RelationType,
};
use crate::views::metric_map;

/// Composite analysis of one dataset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetAnalysis {
    /// Dataset name.
    pub name: String,
    /// Metadata extracted from observation prefixes.
    pub metadata: DatasetMetadata,
    /// Contained variables classified by role.
    pub variables: VariableClassification,
    /// Statistical tests analyzing this dataset.
    pub analyses: Vec<String>,
    /// Models analyzing this dataset.
    pub models: Vec<String>,
    /// Visualizations of this dataset.
    pub visualizations: Vec<String>,
}

/// Dataset metadata from `Key:`-prefixed observations, first match wins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    /// `Size:` observation value.
    pub size: Option<String>,
    /// `Source:` observation value.
    pub source: Option<String>,
    /// `Date:` observation value.
    pub date: Option<String>,
    /// `Status:` observation value.
    pub status: Option<String>,
}

/// Contained variables bucketed by role keywords; one bucket per variable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableClassification {
    /// Variables whose observations mention independent/predictor.
    pub independent: Vec<String>,
    /// Variables whose observations mention dependent/outcome.
    pub dependent: Vec<String>,
    /// Variables whose observations mention control/covariate.
    pub control: Vec<String>,
    /// Everything else.
    pub other: Vec<String>,
    /// Total contained variables.
    pub total: usize,
}

/// Assemble the dataset analysis from the graph snapshot.
pub(crate) fn build_analysis(
    graph: &KnowledgeGraph,
    dataset_name: &str,
) -> GraphResult<DatasetAnalysis> {
    let dataset = graph.require_typed(dataset_name, EntityType::Dataset)?;

    let mut classification = VariableClassification {
        independent: Vec::new(),
        dependent: Vec::new(),
        control: Vec::new(),
        other: Vec::new(),
        total: 0,
    };
    for target in graph.targets_of(dataset_name, RelationType::Contains) {
        let Some(variable) = graph.find_entity(target) else {
            continue;
        };
        if variable.entity_type != EntityType::Variable {
            continue;
        }
        classification.total += 1;
        let name = variable.name.clone();
        let obs = &variable.observations;
        if any_observation_contains(obs, "independent") || any_observation_contains(obs, "predictor")
        {
            classification.independent.push(name);
        } else if any_observation_contains(obs, "dependent")
            || any_observation_contains(obs, "outcome")
        {
            classification.dependent.push(name);
        } else if any_observation_contains(obs, "control")
            || any_observation_contains(obs, "covariate")
        {
            classification.control.push(name);
        } else {
            classification.other.push(name);
        }
    }

    let names_analyzing = |entity_type: EntityType| -> Vec<String> {
        graph
            .typed_sources(dataset_name, RelationType::Analyzes, entity_type)
            .map(|e| e.name.clone())
            .collect()
    };

    Ok(DatasetAnalysis {
        name: dataset.name.clone(),
        metadata: DatasetMetadata {
            size: observation_value(&dataset.observations, "Size"),
            source: observation_value(&dataset.observations, "Source"),
            date: observation_value(&dataset.observations, "Date"),
            status: observation_value(&dataset.observations, "Status"),
        },
        variables: classification,
        analyses: names_analyzing(EntityType::StatisticalTest),
        models: names_analyzing(EntityType::Model),
        visualizations: graph
            .typed_sources(dataset_name, RelationType::Visualizes, EntityType::Visualization)
            .map(|e| e.name.clone())
            .collect(),
    })
}

/// Distribution statistics of one variable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDistribution {
    /// Variable name.
    pub variable: String,
    /// Dataset the lookup was scoped to, if any.
    pub dataset: Option<String>,
    /// Statistics extracted from observation prefixes, keyed lowercase.
    pub statistics: BTreeMap<String, String>,
    /// Statistical tests analyzing this variable.
    pub tests: Vec<String>,
    /// Visualizations of this variable.
    pub visualizations: Vec<String>,
}

const DISTRIBUTION_KEYS: [&str; 14] = [
    "Distribution",
    "Mean",
    "Median",
    "Mode",
    "SD",
    "StdDev",
    "Variance",
    "Min",
    "Max",
    "Range",
    "Skewness",
    "Kurtosis",
    "N",
    "Missing",
];

/// Assemble the distribution view, validating dataset containment when a
/// dataset is supplied.
pub(crate) fn build_distribution(
    graph: &KnowledgeGraph,
    variable_name: &str,
    dataset_name: Option<&str>,
) -> GraphResult<VariableDistribution> {
    let variable = graph.require_typed(variable_name, EntityType::Variable)?;

    if let Some(dataset) = dataset_name {
        graph.require_typed(dataset, EntityType::Dataset)?;
        let contained = graph.has_relation(&Relation::new(
            dataset,
            variable_name,
            RelationType::Contains,
        ));
        if !contained {
            return Err(GraphError::NotLinked {
                dataset: dataset.to_string(),
                variable: variable_name.to_string(),
            });
        }
    }

    Ok(VariableDistribution {
        variable: variable.name.clone(),
        dataset: dataset_name.map(str::to_string),
        statistics: metric_map(&variable.observations, &DISTRIBUTION_KEYS),
        tests: graph
            .typed_sources(variable_name, RelationType::Analyzes, EntityType::StatisticalTest)
            .map(|e| e.name.clone())
            .collect(),
        visualizations: graph
            .typed_sources(variable_name, RelationType::Visualizes, EntityType::Visualization)
            .map(|e| e.name.clone())
            .collect(),
    })
}
