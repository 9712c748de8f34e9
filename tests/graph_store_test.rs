//! Integration tests for the graph store.
//!
//! Exercises the read-modify-write mutation API against a real on-disk
//! store in a temporary directory.

use mcp_research_graph::error::GraphError;
use mcp_research_graph::graph::{
    EntityInput, GraphStore, ObservationDeletion, ObservationInput, RelationInput,
};
use mcp_research_graph::storage::FileStore;
use tempfile::TempDir;

fn create_test_store(dir: &TempDir) -> GraphStore {
    GraphStore::new(FileStore::with_paths(
        dir.path().join("graph.json"),
        dir.path().join("sessions.json"),
    ))
}

fn entity(name: &str, entity_type: &str, observations: &[&str]) -> EntityInput {
    EntityInput {
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        observations: observations.iter().map(|s| s.to_string()).collect(),
    }
}

fn relation(from: &str, to: &str, relation_type: &str) -> RelationInput {
    RelationInput {
        from: from.to_string(),
        to: to.to_string(),
        relation_type: relation_type.to_string(),
    }
}

mod entity_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_entity_idempotence() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);

        store
            .create_entities(vec![entity("Proj", "project", &["Method: survey"])])
            .await
            .unwrap();
        let before = store.read_graph().await.unwrap();

        // Re-creating the same name returns an empty created-list and the
        // stored graph stays observation-for-observation identical.
        let created = store
            .create_entities(vec![entity("Proj", "project", &["different obs"])])
            .await
            .unwrap();
        assert!(created.is_empty(), "duplicate create must return nothing");

        let after = store.read_graph().await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_invalid_entity_type_is_error_not_crash() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![entity("Keep", "dataset", &[])])
            .await
            .unwrap();
        let before = store.read_graph().await.unwrap();

        let err = store
            .create_entities(vec![entity("Bad", "not_a_type", &[])])
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidEntityType { .. }));

        let after = store.read_graph().await.unwrap();
        assert_eq!(before, after, "persisted graph must be unchanged");
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("X", "dataset", &[]),
                entity("Y", "variable", &[]),
            ])
            .await
            .unwrap();
        store
            .create_relations(vec![relation("X", "Y", "contains")])
            .await
            .unwrap();

        store.delete_entities(vec!["X".to_string()]).await.unwrap();

        let graph = store.read_graph().await.unwrap();
        assert!(!graph.has_entity("X"));
        assert!(graph.has_entity("Y"), "Y must be left intact");
        assert!(graph.relations.is_empty(), "the X->Y relation must go too");
    }

    #[tokio::test]
    async fn test_delete_nonexistent_entity_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![entity("Keep", "project", &[])])
            .await
            .unwrap();

        store
            .delete_entities(vec!["Ghost".to_string()])
            .await
            .unwrap();

        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.entities.len(), 1);
    }
}

mod relation_tests {
    use super::*;

    #[tokio::test]
    async fn test_referential_integrity() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![entity("A", "dataset", &[])])
            .await
            .unwrap();

        let err = store
            .create_relations(vec![relation("A", "Ghost", "contains")])
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { ref name } if name == "Ghost"));

        let graph = store.read_graph().await.unwrap();
        assert!(graph.relations.is_empty(), "relations must be unchanged");
    }

    #[tokio::test]
    async fn test_duplicate_relation_dedup_law() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("A", "dataset", &[]),
                entity("B", "variable", &[]),
            ])
            .await
            .unwrap();

        store
            .create_relations(vec![relation("A", "B", "contains")])
            .await
            .unwrap();
        store
            .create_relations(vec![relation("A", "B", "contains")])
            .await
            .unwrap();

        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.relations.len(), 1, "triple must appear exactly once");
    }

    #[tokio::test]
    async fn test_same_pair_different_types_coexist() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("age", "variable", &[]),
                entity("income", "variable", &[]),
            ])
            .await
            .unwrap();

        store
            .create_relations(vec![
                relation("age", "income", "correlates_with"),
                relation("age", "income", "predicts"),
            ])
            .await
            .unwrap();

        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.relations.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_relation_type() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("A", "dataset", &[]),
                entity("B", "variable", &[]),
            ])
            .await
            .unwrap();

        let err = store
            .create_relations(vec![relation("A", "B", "hugs")])
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRelationType { .. }));
    }
}

mod observation_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_observation_dedup_law() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![entity("Survey", "dataset", &[])])
            .await
            .unwrap();

        let input = || {
            vec![ObservationInput {
                entity_name: "Survey".to_string(),
                contents: vec!["Size: 100".to_string()],
            }]
        };

        let first = store.add_observations(input()).await.unwrap();
        assert_eq!(first[0].added_observations, vec!["Size: 100".to_string()]);

        let second = store.add_observations(input()).await.unwrap();
        assert!(second[0].added_observations.is_empty());

        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.find_entity("Survey").unwrap().observations.len(), 1);
    }

    #[tokio::test]
    async fn test_add_observations_to_missing_entity_fails() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);

        let err = store
            .add_observations(vec![ObservationInput {
                entity_name: "Ghost".to_string(),
                contents: vec!["x".to_string()],
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_observations_missing_entity_is_silent() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);

        // Asymmetric with add_observations: no error for a missing entity.
        store
            .delete_observations(vec![ObservationDeletion {
                entity_name: "Ghost".to_string(),
                observations: vec!["x".to_string()],
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_observations_removes_listed_strings() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![entity("Survey", "dataset", &["a", "b", "c"])])
            .await
            .unwrap();

        store
            .delete_observations(vec![ObservationDeletion {
                entity_name: "Survey".to_string(),
                observations: vec!["a".to_string(), "c".to_string(), "missing".to_string()],
            }])
            .await
            .unwrap();

        let graph = store.read_graph().await.unwrap();
        assert_eq!(
            graph.find_entity("Survey").unwrap().observations,
            vec!["b".to_string()]
        );
    }
}

mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_and_across_tokens() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity(
                    "Age_Income_Regression",
                    "statisticalTest",
                    &["tests income vs age"],
                ),
                entity("Income_Survey", "dataset", &["household income data"]),
            ])
            .await
            .unwrap();

        let result = store.search_nodes("income regression").await.unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].name, "Age_Income_Regression");

        // One token alone matches both.
        let result = store.search_nodes("income").await.unwrap();
        assert_eq!(result.entities.len(), 2);
    }

    #[tokio::test]
    async fn test_search_returns_induced_subgraph() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("Survey_A", "dataset", &[]),
                entity("Survey_B", "dataset", &[]),
                entity("unrelated", "variable", &[]),
            ])
            .await
            .unwrap();
        store
            .create_relations(vec![
                relation("Survey_A", "Survey_B", "derived_from"),
                relation("Survey_A", "unrelated", "contains"),
            ])
            .await
            .unwrap();

        let result = store.search_nodes("survey").await.unwrap();
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.relations.len(), 1);
        assert_eq!(result.relations[0].to, "Survey_B");
    }

    #[tokio::test]
    async fn test_round_trip_is_identity() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        store
            .create_entities(vec![
                entity("Proj", "project", &["Method: longitudinal"]),
                entity("Survey", "dataset", &["Size: 100"]),
            ])
            .await
            .unwrap();
        store
            .create_relations(vec![relation("Survey", "Proj", "part_of")])
            .await
            .unwrap();

        let first = store.read_graph().await.unwrap();
        let second = store.read_graph().await.unwrap();
        assert_eq!(first, second);
    }
}
