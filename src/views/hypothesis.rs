//! Hypothesis-test and statistical-result views.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::GraphResult;
use crate::graph::{observation_value, Entity, EntityType, KnowledgeGraph, RelationType};
use crate::views::project::tests_of_hypothesis;
use crate::views::{push_unique, EntitySummary};

/// A project's hypotheses with their tests and results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisTestsReport {
    /// Project name.
    pub project: String,
    /// Number of hypotheses reported.
    pub total: usize,
    /// Per-hypothesis details.
    pub hypotheses: Vec<HypothesisTestSummary>,
}

/// One hypothesis with its tests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisTestSummary {
    /// Hypothesis name.
    pub name: String,
    /// `Status:` observation value, if any.
    pub status: Option<String>,
    /// Whether the status equals "supported".
    pub supported: bool,
    /// The hypothesis's observations.
    pub observations: Vec<String>,
    /// Tests of this hypothesis and what they produced.
    pub tests: Vec<TestWithResults>,
}

/// A test and the results it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWithResults {
    /// Test name.
    pub name: String,
    /// Result entities produced by the test.
    pub results: Vec<EntitySummary>,
}

/// Assemble hypothesis tests for a project, or for one named hypothesis.
pub(crate) fn build_tests(
    graph: &KnowledgeGraph,
    project_name: &str,
    hypothesis_name: Option<&str>,
) -> GraphResult<HypothesisTestsReport> {
    graph.require_typed(project_name, EntityType::Project)?;

    let hypotheses: Vec<&Entity> = match hypothesis_name {
        Some(name) => vec![graph.require_typed(name, EntityType::Hypothesis)?],
        None => graph
            .typed_sources(project_name, RelationType::PartOf, EntityType::Hypothesis)
            .collect(),
    };

    let summaries: Vec<HypothesisTestSummary> = hypotheses
        .into_iter()
        .map(|hypothesis| {
            let status = observation_value(&hypothesis.observations, "Status");
            let supported = status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("supported"));
            let tests = tests_of_hypothesis(graph, &hypothesis.name)
                .into_iter()
                .map(|test| TestWithResults {
                    results: results_of_test(graph, &test),
                    name: test,
                })
                .collect();
            HypothesisTestSummary {
                name: hypothesis.name.clone(),
                status,
                supported,
                observations: hypothesis.observations.clone(),
                tests,
            }
        })
        .collect();

    Ok(HypothesisTestsReport {
        project: project_name.to_string(),
        total: summaries.len(),
        hypotheses: summaries,
    })
}

fn results_of_test(graph: &KnowledgeGraph, test: &str) -> Vec<EntitySummary> {
    graph
        .targets_of(test, RelationType::Produces)
        .filter_map(|target| graph.find_entity(target))
        .filter(|e| e.entity_type == EntityType::Result)
        .map(EntitySummary::from)
        .collect()
}

/// One statistical test with everything resolved around it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalTestDetail {
    /// Test name.
    pub name: String,
    /// `Type:` observation value, if any.
    pub test_type: Option<String>,
    /// Whether the significance heuristic fired on any observation.
    pub is_significant: bool,
    /// Hypotheses this test tests.
    pub hypotheses: Vec<String>,
    /// Datasets this test analyzes.
    pub datasets: Vec<String>,
    /// Variables this test analyzes.
    pub variables: Vec<String>,
    /// Results this test produced.
    pub results: Vec<EntitySummary>,
}

/// A project's statistical tests, grouped by extracted test type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalResultsReport {
    /// Project name.
    pub project: String,
    /// Number of tests after filtering.
    pub total_tests: usize,
    /// Tests grouped by their `Type:` value ("unspecified" when absent).
    pub results_by_type: BTreeMap<String, Vec<StatisticalTestDetail>>,
}

/// Assemble the statistical results report.
///
/// The test set is the union of tests directly `part_of` the project and
/// tests analyzing any of the project's datasets, deduplicated by name.
/// `test_type_filter` keeps only tests with an observation containing the
/// filter string (case-insensitive).
pub(crate) fn build_statistical_results(
    graph: &KnowledgeGraph,
    project_name: &str,
    test_type_filter: Option<&str>,
) -> GraphResult<StatisticalResultsReport> {
    graph.require_typed(project_name, EntityType::Project)?;

    let mut test_names: Vec<String> = Vec::new();
    for test in graph.typed_sources(project_name, RelationType::PartOf, EntityType::StatisticalTest)
    {
        push_unique(&mut test_names, &test.name);
    }
    let datasets: Vec<&Entity> = graph
        .typed_sources(project_name, RelationType::PartOf, EntityType::Dataset)
        .collect();
    for dataset in datasets {
        for test in
            graph.typed_sources(&dataset.name, RelationType::Analyzes, EntityType::StatisticalTest)
        {
            push_unique(&mut test_names, &test.name);
        }
    }

    let mut results_by_type: BTreeMap<String, Vec<StatisticalTestDetail>> = BTreeMap::new();
    let mut total_tests = 0;

    for name in test_names {
        let Some(test) = graph.find_entity(&name) else {
            continue;
        };
        if let Some(filter) = test_type_filter {
            let filter = filter.to_lowercase();
            let matches = test
                .observations
                .iter()
                .any(|obs| obs.to_lowercase().contains(&filter));
            if !matches {
                continue;
            }
        }

        let test_type = observation_value(&test.observations, "Type");
        let group = test_type.clone().unwrap_or_else(|| "unspecified".to_string());

        let mut datasets = Vec::new();
        let mut variables = Vec::new();
        for target in graph.targets_of(&test.name, RelationType::Analyzes) {
            match graph.find_entity(target).map(|e| e.entity_type) {
                Some(EntityType::Dataset) => push_unique(&mut datasets, target),
                Some(EntityType::Variable) => push_unique(&mut variables, target),
                _ => {}
            }
        }

        total_tests += 1;
        results_by_type.entry(group).or_default().push(StatisticalTestDetail {
            name: test.name.clone(),
            test_type,
            is_significant: is_significant(&test.observations),
            hypotheses: graph
                .targets_of(&test.name, RelationType::Tests)
                .map(str::to_string)
                .collect(),
            datasets,
            variables,
            results: results_of_test(graph, &test.name),
        });
    }

    Ok(StatisticalResultsReport {
        project: project_name.to_string(),
        total_tests,
        results_by_type,
    })
}

/// Significance heuristic over free-text observations: an observation
/// mentions "significant", or carries "p", "<", and "0.05" all at once.
pub(crate) fn is_significant(observations: &[String]) -> bool {
    observations.iter().any(|obs| {
        let lower = obs.to_lowercase();
        lower.contains("significant")
            || (lower.contains('p') && lower.contains('<') && lower.contains("0.05"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::Relation;
    use pretty_assertions::assert_eq;

    fn test_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::default();
        graph.insert_entities(vec![
            Entity::new("Proj", EntityType::Project),
            Entity::new("Survey", EntityType::Dataset),
            Entity::new("H1", EntityType::Hypothesis).with_observations(vec![
                "Age predicts income".to_string(),
                "Status: supported".to_string(),
            ]),
            Entity::new("H2", EntityType::Hypothesis)
                .with_observations(vec!["Status: rejected".to_string()]),
            Entity::new("T_reg", EntityType::StatisticalTest).with_observations(vec![
                "Type: regression".to_string(),
                "p < 0.05 for age coefficient".to_string(),
            ]),
            Entity::new("T_anova", EntityType::StatisticalTest).with_observations(vec![
                "Type: anova".to_string(),
                "No group differences found".to_string(),
            ]),
            Entity::new("R1", EntityType::Result)
                .with_observations(vec!["beta = 0.41".to_string()]),
        ]);
        graph
            .insert_relations(vec![
                Relation::new("Survey", "Proj", RelationType::PartOf),
                Relation::new("H1", "Proj", RelationType::PartOf),
                Relation::new("H2", "Proj", RelationType::PartOf),
                Relation::new("T_reg", "Proj", RelationType::PartOf),
                Relation::new("T_anova", "Survey", RelationType::Analyzes),
                Relation::new("T_reg", "H1", RelationType::Tests),
                Relation::new("T_reg", "R1", RelationType::Produces),
            ])
            .unwrap();
        graph
    }

    #[test]
    fn test_build_tests_all_hypotheses() {
        let graph = test_graph();
        let report = build_tests(&graph, "Proj", None).unwrap();
        assert_eq!(report.total, 2);

        let h1 = report.hypotheses.iter().find(|h| h.name == "H1").unwrap();
        assert!(h1.supported);
        assert_eq!(h1.tests.len(), 1);
        assert_eq!(h1.tests[0].name, "T_reg");
        assert_eq!(h1.tests[0].results[0].name, "R1");

        let h2 = report.hypotheses.iter().find(|h| h.name == "H2").unwrap();
        assert!(!h2.supported);
        assert_eq!(h2.status.as_deref(), Some("rejected"));
    }

    #[test]
    fn test_build_tests_single_hypothesis() {
        let graph = test_graph();
        let report = build_tests(&graph, "Proj", Some("H1")).unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.hypotheses[0].name, "H1");

        let err = build_tests(&graph, "Proj", Some("Ghost")).unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { .. }));
    }

    #[test]
    fn test_statistical_results_unions_and_groups() {
        let graph = test_graph();
        let report = build_statistical_results(&graph, "Proj", None).unwrap();
        // T_reg is part_of the project; T_anova analyzes a project dataset.
        assert_eq!(report.total_tests, 2);
        assert_eq!(report.results_by_type["regression"].len(), 1);
        assert_eq!(report.results_by_type["anova"].len(), 1);

        let reg = &report.results_by_type["regression"][0];
        assert!(reg.is_significant);
        assert_eq!(reg.hypotheses, vec!["H1".to_string()]);

        let anova = &report.results_by_type["anova"][0];
        assert!(!anova.is_significant);
        assert_eq!(anova.datasets, vec!["Survey".to_string()]);
    }

    #[test]
    fn test_statistical_results_type_filter() {
        let graph = test_graph();
        let report = build_statistical_results(&graph, "Proj", Some("regression")).unwrap();
        assert_eq!(report.total_tests, 1);
        assert!(report.results_by_type.contains_key("regression"));
    }

    #[test]
    fn test_significance_heuristics() {
        assert!(is_significant(&["Result was significant".to_string()]));
        assert!(is_significant(&["p < 0.05".to_string()]));
        assert!(!is_significant(&["p = 0.40".to_string()]));
        assert!(!is_significant(&["strong effect".to_string()]));
    }
}
