//! Variable relationship view.

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{EntityType, KnowledgeGraph, RelationType};
use crate::views::push_unique;

/// Everything connected to one variable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRelationships {
    /// Variable name.
    pub variable: String,
    /// Datasets containing this variable.
    pub datasets: Vec<String>,
    /// Correlated variables, with parsed direction/strength where stated.
    pub correlations: Vec<CorrelationInfo>,
    /// Variables this variable predicts.
    pub predicts: Vec<String>,
    /// Variables predicting this variable.
    pub predicted_by: Vec<String>,
    /// Relationships this variable moderates (target of any type).
    pub moderates: Vec<String>,
    /// Relationships this variable mediates (target of any type).
    pub mediates: Vec<String>,
    /// Statistical tests analyzing this variable.
    pub analyses: Vec<String>,
}

/// One correlation edge, enriched from free-text observations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationInfo {
    /// The correlated variable.
    pub variable: String,
    /// "positive" or "negative" when the note states it.
    pub direction: Option<String>,
    /// "strong", "moderate", or "weak" when the note states it.
    pub strength: Option<String>,
    /// The observation the direction/strength were parsed from.
    pub note: Option<String>,
}

/// Assemble the relationship view for one variable.
pub(crate) fn build_relationships(
    graph: &KnowledgeGraph,
    variable_name: &str,
) -> GraphResult<VariableRelationships> {
    let variable = graph.require_typed(variable_name, EntityType::Variable)?;

    let mut datasets = Vec::new();
    for dataset in graph.typed_sources(variable_name, RelationType::Contains, EntityType::Dataset) {
        push_unique(&mut datasets, &dataset.name);
    }

    // correlates_with is read symmetrically: either endpoint counts.
    let mut partners: Vec<String> = Vec::new();
    for relation in &graph.relations {
        if relation.relation_type != RelationType::CorrelatesWith {
            continue;
        }
        if relation.from == variable_name {
            push_unique(&mut partners, &relation.to);
        } else if relation.to == variable_name {
            push_unique(&mut partners, &relation.from);
        }
    }
    let correlations = partners
        .into_iter()
        .map(|partner| correlation_info(graph, variable_name, partner))
        .collect();

    Ok(VariableRelationships {
        variable: variable.name.clone(),
        datasets,
        correlations,
        predicts: graph
            .targets_of(variable_name, RelationType::Predicts)
            .map(str::to_string)
            .collect(),
        predicted_by: graph
            .sources_of(variable_name, RelationType::Predicts)
            .map(str::to_string)
            .collect(),
        moderates: graph
            .targets_of(variable_name, RelationType::Moderates)
            .map(str::to_string)
            .collect(),
        mediates: graph
            .targets_of(variable_name, RelationType::Mediates)
            .map(str::to_string)
            .collect(),
        analyses: graph
            .typed_sources(variable_name, RelationType::Analyzes, EntityType::StatisticalTest)
            .map(|e| e.name.clone())
            .collect(),
    })
}

/// Parse direction/strength for a correlation from whichever endpoint's
/// observations mention "correlation with <other>"; first match wins.
fn correlation_info(graph: &KnowledgeGraph, variable: &str, partner: String) -> CorrelationInfo {
    let note = find_correlation_note(graph, &partner, variable)
        .or_else(|| find_correlation_note(graph, variable, &partner));

    let (direction, strength) = match &note {
        Some(text) => {
            let lower = text.to_lowercase();
            let direction = if lower.contains("positive") {
                Some("positive".to_string())
            } else if lower.contains("negative") {
                Some("negative".to_string())
            } else {
                None
            };
            let strength = ["strong", "moderate", "weak"]
                .iter()
                .find(|s| lower.contains(*s))
                .map(|s| s.to_string());
            (direction, strength)
        }
        None => (None, None),
    };

    CorrelationInfo {
        variable: partner,
        direction,
        strength,
        note,
    }
}

/// An observation on `holder` containing the phrase `correlation with
/// <other>`, case-insensitive.
fn find_correlation_note(graph: &KnowledgeGraph, holder: &str, other: &str) -> Option<String> {
    let needle = format!("correlation with {}", other.to_lowercase());
    graph
        .find_entity(holder)?
        .observations
        .iter()
        .find(|obs| obs.to_lowercase().contains(&needle))
        .cloned()
}
