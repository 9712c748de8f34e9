//! Project overview and research-question views.

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{
    first_matching_observation, observation_value, EntityType, KnowledgeGraph, RelationType,
};
use crate::views::EntitySummary;

/// Composite overview of one project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    /// Project name.
    pub name: String,
    /// First project observation mentioning method/approach/design.
    pub methodology: Option<String>,
    /// First project observation mentioning participants/sample/subjects.
    pub participants: Option<String>,
    /// Research questions linked `part_of` this project.
    pub research_questions: Vec<String>,
    /// Dataset counts and names.
    pub data_collection: DataCollectionSummary,
    /// Hypothesis counts and names.
    pub hypotheses: HypothesisSummary,
    /// Models linked to this project.
    pub models: Vec<String>,
    /// Findings linked to this project.
    pub key_findings: Vec<String>,
}

/// Dataset summary within a project overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollectionSummary {
    /// Names of datasets linked to the project.
    pub datasets: Vec<String>,
    /// Number of linked datasets.
    pub total_datasets: usize,
    /// Number of variables contained across all linked datasets.
    pub total_variables: usize,
}

/// Hypothesis summary within a project overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisSummary {
    /// Number of linked hypotheses.
    pub total: usize,
    /// Names of linked hypotheses.
    pub hypotheses: Vec<String>,
}

/// Assemble a project overview from the graph snapshot.
pub(crate) fn build_overview(
    graph: &KnowledgeGraph,
    project_name: &str,
) -> GraphResult<ProjectOverview> {
    let project = graph.require_typed(project_name, EntityType::Project)?;

    let names_of = |entity_type: EntityType| -> Vec<String> {
        graph
            .typed_sources(project_name, RelationType::PartOf, entity_type)
            .map(|e| e.name.clone())
            .collect()
    };

    let datasets = names_of(EntityType::Dataset);
    let total_variables = datasets
        .iter()
        .map(|dataset| {
            graph
                .targets_of(dataset, RelationType::Contains)
                .filter_map(|target| graph.find_entity(target))
                .filter(|e| e.entity_type == EntityType::Variable)
                .count()
        })
        .sum();

    let hypotheses = names_of(EntityType::Hypothesis);

    Ok(ProjectOverview {
        name: project.name.clone(),
        methodology: first_matching_observation(
            &project.observations,
            &["method", "approach", "design"],
        ),
        participants: first_matching_observation(
            &project.observations,
            &["participant", "sample", "subject"],
        ),
        research_questions: names_of(EntityType::ResearchQuestion),
        data_collection: DataCollectionSummary {
            total_datasets: datasets.len(),
            total_variables,
            datasets,
        },
        hypotheses: HypothesisSummary {
            total: hypotheses.len(),
            hypotheses,
        },
        models: names_of(EntityType::Model),
        key_findings: names_of(EntityType::Finding),
    })
}

/// Hypothesis as it appears in a research-question report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionHypothesis {
    /// Hypothesis name.
    pub name: String,
    /// `Status:` observation value, if any.
    pub status: Option<String>,
    /// Whether the status equals "supported".
    pub supported: bool,
    /// Tests linked to the hypothesis.
    pub tests: Vec<String>,
}

/// Everything addressing one research question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchQuestionResults {
    /// The research question.
    pub question: String,
    /// Projects this question belongs to.
    pub projects: Vec<String>,
    /// Hypotheses addressing the question.
    pub hypotheses: Vec<QuestionHypothesis>,
    /// Findings addressing the question.
    pub findings: Vec<EntitySummary>,
    /// Results addressing the question.
    pub results: Vec<EntitySummary>,
}

/// Assemble the entities addressing a research question.
pub(crate) fn build_question_results(
    graph: &KnowledgeGraph,
    question_name: &str,
) -> GraphResult<ResearchQuestionResults> {
    let question = graph.require_typed(question_name, EntityType::ResearchQuestion)?;

    let projects = graph
        .targets_of(question_name, RelationType::PartOf)
        .filter_map(|target| graph.find_entity(target))
        .filter(|e| e.entity_type == EntityType::Project)
        .map(|e| e.name.clone())
        .collect();

    let mut hypotheses = Vec::new();
    let mut findings = Vec::new();
    let mut results = Vec::new();

    for source in graph.sources_of(question_name, RelationType::Addresses) {
        let Some(entity) = graph.find_entity(source) else {
            continue;
        };
        match entity.entity_type {
            EntityType::Hypothesis => {
                let status = observation_value(&entity.observations, "Status");
                let supported = status
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("supported"));
                hypotheses.push(QuestionHypothesis {
                    name: entity.name.clone(),
                    status,
                    supported,
                    tests: tests_of_hypothesis(graph, &entity.name),
                });
            }
            EntityType::Finding => findings.push(EntitySummary::from(entity)),
            EntityType::Result => results.push(EntitySummary::from(entity)),
            _ => {}
        }
    }

    Ok(ResearchQuestionResults {
        question: question.name.clone(),
        projects,
        hypotheses,
        findings,
        results,
    })
}

/// Tests linked to a hypothesis via `tests` (incoming) or `tested_by`
/// (outgoing), deduplicated.
pub(crate) fn tests_of_hypothesis(graph: &KnowledgeGraph, hypothesis: &str) -> Vec<String> {
    let mut tests: Vec<String> = Vec::new();
    for test in graph
        .typed_sources(hypothesis, RelationType::Tests, EntityType::StatisticalTest)
        .map(|e| e.name.clone())
    {
        if !tests.contains(&test) {
            tests.push(test);
        }
    }
    for target in graph.targets_of(hypothesis, RelationType::TestedBy) {
        let is_test = graph
            .find_entity(target)
            .is_some_and(|e| e.entity_type == EntityType::StatisticalTest);
        if is_test && !tests.iter().any(|t| t == target) {
            tests.push(target.to_string());
        }
    }
    tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::{Entity, Relation};
    use pretty_assertions::assert_eq;

    fn research_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        graph.insert_entities(vec![
            Entity::new("Proj", EntityType::Project).with_observations(vec![
                "Longitudinal design over two years".to_string(),
                "Sample of 240 adults".to_string(),
            ]),
            Entity::new("Survey", EntityType::Dataset),
            Entity::new("age", EntityType::Variable),
            Entity::new("income", EntityType::Variable),
            Entity::new("RQ1", EntityType::ResearchQuestion),
            Entity::new("H1", EntityType::Hypothesis)
                .with_observations(vec!["Status: supported".to_string()]),
            Entity::new("T1", EntityType::StatisticalTest),
            Entity::new("F1", EntityType::Finding)
                .with_observations(vec!["Income rises with age".to_string()]),
        ]);
        graph
            .insert_relations(vec![
                Relation::new("Survey", "Proj", RelationType::PartOf),
                Relation::new("RQ1", "Proj", RelationType::PartOf),
                Relation::new("H1", "Proj", RelationType::PartOf),
                Relation::new("F1", "Proj", RelationType::PartOf),
                Relation::new("Survey", "age", RelationType::Contains),
                Relation::new("Survey", "income", RelationType::Contains),
                Relation::new("T1", "H1", RelationType::Tests),
                Relation::new("H1", "RQ1", RelationType::Addresses),
                Relation::new("F1", "RQ1", RelationType::Addresses),
            ])
            .unwrap();
        graph
    }

    #[test]
    fn test_overview_counts_variables_two_hops_out() {
        let graph = research_graph();
        let overview = build_overview(&graph, "Proj").unwrap();
        assert_eq!(overview.data_collection.total_datasets, 1);
        assert_eq!(overview.data_collection.total_variables, 2);
        assert_eq!(overview.hypotheses.total, 1);
        assert_eq!(overview.key_findings, vec!["F1".to_string()]);
    }

    #[test]
    fn test_overview_derives_methodology_and_participants() {
        let graph = research_graph();
        let overview = build_overview(&graph, "Proj").unwrap();
        assert_eq!(
            overview.methodology.as_deref(),
            Some("Longitudinal design over two years")
        );
        assert_eq!(overview.participants.as_deref(), Some("Sample of 240 adults"));
    }

    #[test]
    fn test_overview_wrong_type() {
        let graph = research_graph();
        let err = build_overview(&graph, "Survey").unwrap_err();
        assert!(matches!(err, GraphError::WrongType { .. }));
    }

    #[test]
    fn test_overview_missing_project() {
        let graph = research_graph();
        let err = build_overview(&graph, "Nope").unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { .. }));
    }

    #[test]
    fn test_question_results_buckets_by_type() {
        let graph = research_graph();
        let report = build_question_results(&graph, "RQ1").unwrap();
        assert_eq!(report.projects, vec!["Proj".to_string()]);
        assert_eq!(report.hypotheses.len(), 1);
        assert!(report.hypotheses[0].supported);
        assert_eq!(report.hypotheses[0].tests, vec!["T1".to_string()]);
        assert_eq!(report.findings.len(), 1);
        assert!(report.results.is_empty());
    }
}
