//! Visualization gallery and model performance views.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{observation_value, EntityType, KnowledgeGraph, RelationType};
use crate::views::{metric_map, push_unique};

/// Visualizations of a project or dataset, grouped by type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationGallery {
    /// Project name.
    pub project: String,
    /// Dataset scope, when supplied.
    pub dataset: Option<String>,
    /// Number of visualizations in the gallery.
    pub total: usize,
    /// Visualizations grouped by their `Type:` value ("other" when absent).
    pub by_type: BTreeMap<String, Vec<VisualizationInfo>>,
}

/// One visualization entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationInfo {
    /// Visualization name.
    pub name: String,
    /// Everything this visualization depicts.
    pub visualizes: Vec<String>,
    /// `Description:` observation value, if any.
    pub description: Option<String>,
}

/// Assemble the gallery.
///
/// With a dataset, only its visualizations are shown; otherwise the union
/// of visualizations over every project dataset and model, deduplicated.
pub(crate) fn build_gallery(
    graph: &KnowledgeGraph,
    project_name: &str,
    dataset_name: Option<&str>,
) -> GraphResult<VisualizationGallery> {
    graph.require_typed(project_name, EntityType::Project)?;

    let mut viz_names: Vec<String> = Vec::new();
    match dataset_name {
        Some(dataset) => {
            graph.require_typed(dataset, EntityType::Dataset)?;
            for viz in
                graph.typed_sources(dataset, RelationType::Visualizes, EntityType::Visualization)
            {
                push_unique(&mut viz_names, &viz.name);
            }
        }
        None => {
            let mut targets: Vec<String> = Vec::new();
            for entity_type in [EntityType::Dataset, EntityType::Model] {
                for member in
                    graph.typed_sources(project_name, RelationType::PartOf, entity_type)
                {
                    push_unique(&mut targets, &member.name);
                }
            }
            for target in targets {
                for viz in
                    graph.typed_sources(&target, RelationType::Visualizes, EntityType::Visualization)
                {
                    push_unique(&mut viz_names, &viz.name);
                }
            }
        }
    }

    let mut by_type: BTreeMap<String, Vec<VisualizationInfo>> = BTreeMap::new();
    let mut total = 0;
    for name in viz_names {
        let Some(viz) = graph.find_entity(&name) else {
            continue;
        };
        let group = observation_value(&viz.observations, "Type")
            .unwrap_or_else(|| "other".to_string());
        total += 1;
        by_type.entry(group).or_default().push(VisualizationInfo {
            name: viz.name.clone(),
            visualizes: graph
                .targets_of(&viz.name, RelationType::Visualizes)
                .map(str::to_string)
                .collect(),
            description: observation_value(&viz.observations, "Description"),
        });
    }

    Ok(VisualizationGallery {
        project: project_name.to_string(),
        dataset: dataset_name.map(str::to_string),
        total,
        by_type,
    })
}

/// One model's performance and connections.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPerformance {
    /// Model name.
    pub name: String,
    /// `Type:` observation value, if any.
    pub model_type: Option<String>,
    /// Metric observations keyed lowercase (accuracy, rmse, r2, ...).
    pub metrics: BTreeMap<String, String>,
    /// Datasets the model was trained on or analyzes.
    pub trained_on: Vec<String>,
    /// Variables the model predicts.
    pub predicts: Vec<String>,
    /// Visualizations of this model.
    pub visualizations: Vec<String>,
    /// The model's observations.
    pub observations: Vec<String>,
}

const METRIC_KEYS: [&str; 9] = [
    "Accuracy",
    "Precision",
    "Recall",
    "F1",
    "AUC",
    "RMSE",
    "MAE",
    "R2",
    "Performance",
];

/// Assemble the model performance view.
pub(crate) fn build_model_performance(
    graph: &KnowledgeGraph,
    model_name: &str,
) -> GraphResult<ModelPerformance> {
    let model = graph.require_typed(model_name, EntityType::Model)?;

    let mut trained_on = Vec::new();
    for target in graph.targets_of(model_name, RelationType::TrainedOn) {
        push_unique(&mut trained_on, target);
    }
    for target in graph.targets_of(model_name, RelationType::Analyzes) {
        let is_dataset = graph
            .find_entity(target)
            .is_some_and(|e| e.entity_type == EntityType::Dataset);
        if is_dataset {
            push_unique(&mut trained_on, target);
        }
    }

    Ok(ModelPerformance {
        name: model.name.clone(),
        model_type: observation_value(&model.observations, "Type"),
        metrics: metric_map(&model.observations, &METRIC_KEYS),
        trained_on,
        predicts: graph
            .targets_of(model_name, RelationType::Predicts)
            .map(str::to_string)
            .collect(),
        visualizations: graph
            .typed_sources(model_name, RelationType::Visualizes, EntityType::Visualization)
            .map(|e| e.name.clone())
            .collect(),
        observations: model.observations.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::{Entity, Relation};
    use pretty_assertions::assert_eq;

    fn viz_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        graph.insert_entities(vec![
            Entity::new("Proj", EntityType::Project),
            Entity::new("Survey", EntityType::Dataset),
            Entity::new("M1", EntityType::Model).with_observations(vec![
                "Type: random forest".to_string(),
                "Accuracy: 0.87".to_string(),
                "RMSE: 3.2".to_string(),
            ]),
            Entity::new("income", EntityType::Variable),
            Entity::new("V_scatter", EntityType::Visualization).with_observations(vec![
                "Type: scatter".to_string(),
                "Description: income vs age".to_string(),
            ]),
            Entity::new("V_resid", EntityType::Visualization)
                .with_observations(vec!["Type: residual".to_string()]),
            Entity::new("V_untyped", EntityType::Visualization),
        ]);
        graph
            .insert_relations(vec![
                Relation::new("Survey", "Proj", RelationType::PartOf),
                Relation::new("M1", "Proj", RelationType::PartOf),
                Relation::new("M1", "Survey", RelationType::TrainedOn),
                Relation::new("M1", "income", RelationType::Predicts),
                Relation::new("V_scatter", "Survey", RelationType::Visualizes),
                Relation::new("V_untyped", "Survey", RelationType::Visualizes),
                Relation::new("V_resid", "M1", RelationType::Visualizes),
            ])
            .unwrap();
        graph
    }

    #[test]
    fn test_gallery_for_whole_project_unions_datasets_and_models() {
        let graph = viz_graph();
        let gallery = build_gallery(&graph, "Proj", None).unwrap();
        assert_eq!(gallery.total, 3);
        assert_eq!(gallery.by_type["scatter"].len(), 1);
        assert_eq!(gallery.by_type["residual"].len(), 1);
        assert_eq!(gallery.by_type["other"].len(), 1);
        assert_eq!(
            gallery.by_type["scatter"][0].description.as_deref(),
            Some("income vs age")
        );
    }

    #[test]
    fn test_gallery_scoped_to_dataset() {
        let graph = viz_graph();
        let gallery = build_gallery(&graph, "Proj", Some("Survey")).unwrap();
        assert_eq!(gallery.total, 2, "model-only viz is out of scope");
        assert!(!gallery.by_type.contains_key("residual"));
    }

    #[test]
    fn test_gallery_unknown_dataset() {
        let graph = viz_graph();
        let err = build_gallery(&graph, "Proj", Some("Nope")).unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { .. }));
    }

    #[test]
    fn test_model_performance_metrics_and_links() {
        let graph = viz_graph();
        let perf = build_model_performance(&graph, "M1").unwrap();
        assert_eq!(perf.model_type.as_deref(), Some("random forest"));
        assert_eq!(perf.metrics.get("accuracy").map(String::as_str), Some("0.87"));
        assert_eq!(perf.metrics.get("rmse").map(String::as_str), Some("3.2"));
        assert_eq!(perf.trained_on, vec!["Survey".to_string()]);
        assert_eq!(perf.predicts, vec!["income".to_string()]);
        assert_eq!(perf.visualizations, vec!["V_resid".to_string()]);
    }
}
