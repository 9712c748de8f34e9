//! Status and priority as graph relations.
//!
//! Instead of fields on the entity, status and priority are modeled as
//! singleton value entities (`status:<value>`, `priority:<value>`) linked to
//! the subject via `has_status`/`has_priority` edges, so status filtering
//! reuses the generic relation traversal. The set helpers here enforce the
//! single-current-value semantics that raw relation creation leaves to
//! convention: setting a value removes any existing edge first.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Entity, EntityType, KnowledgeGraph, RelationType};
use crate::storage::FileStore;

/// A project or artifact status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusValue {
    /// Being planned, no data yet.
    Planning,
    /// Actively worked on.
    Active,
    /// Temporarily on hold.
    Paused,
    /// Finished.
    Completed,
    /// Stopped without completion.
    Abandoned,
}

/// All valid status values.
pub const STATUS_VALUES: [StatusValue; 5] = [
    StatusValue::Planning,
    StatusValue::Active,
    StatusValue::Paused,
    StatusValue::Completed,
    StatusValue::Abandoned,
];

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusValue::Planning => write!(f, "planning"),
            StatusValue::Active => write!(f, "active"),
            StatusValue::Paused => write!(f, "paused"),
            StatusValue::Completed => write!(f, "completed"),
            StatusValue::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for StatusValue {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(StatusValue::Planning),
            "active" => Ok(StatusValue::Active),
            "paused" => Ok(StatusValue::Paused),
            "completed" => Ok(StatusValue::Completed),
            "abandoned" => Ok(StatusValue::Abandoned),
            _ => Err(GraphError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A priority value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityValue {
    /// Must happen first.
    High,
    /// Normal ordering.
    Medium,
    /// Can wait.
    Low,
}

/// All valid priority values.
pub const PRIORITY_VALUES: [PriorityValue; 3] =
    [PriorityValue::High, PriorityValue::Medium, PriorityValue::Low];

impl std::fmt::Display for PriorityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityValue::High => write!(f, "high"),
            PriorityValue::Medium => write!(f, "medium"),
            PriorityValue::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for PriorityValue {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(PriorityValue::High),
            "medium" => Ok(PriorityValue::Medium),
            "low" => Ok(PriorityValue::Low),
            _ => Err(GraphError::InvalidPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// Entity name of a status value (`status:<value>`).
pub(crate) fn status_entity_name(value: StatusValue) -> String {
    format!("status:{}", value)
}

/// Entity name of a priority value (`priority:<value>`).
pub(crate) fn priority_entity_name(value: PriorityValue) -> String {
    format!("priority:{}", value)
}

/// Ensure the singleton status/priority entities exist. Returns whether the
/// graph changed.
pub(crate) fn ensure_value_entities(graph: &mut KnowledgeGraph) -> bool {
    let mut changed = false;
    for value in STATUS_VALUES {
        let name = status_entity_name(value);
        if !graph.has_entity(&name) {
            graph.entities.push(Entity::new(name, EntityType::Status));
            changed = true;
        }
    }
    for value in PRIORITY_VALUES {
        let name = priority_entity_name(value);
        if !graph.has_entity(&name) {
            graph.entities.push(Entity::new(name, EntityType::Priority));
            changed = true;
        }
    }
    changed
}

/// Replace the subject's `has_status` edge with one pointing at `value`.
pub(crate) fn set_status_edge(graph: &mut KnowledgeGraph, subject: &str, value: StatusValue) {
    graph
        .relations
        .retain(|r| !(r.from == subject && r.relation_type == RelationType::HasStatus));
    graph.link(subject, &status_entity_name(value), RelationType::HasStatus);
}

/// Replace the subject's `has_priority` edge with one pointing at `value`.
pub(crate) fn set_priority_edge(graph: &mut KnowledgeGraph, subject: &str, value: PriorityValue) {
    graph
        .relations
        .retain(|r| !(r.from == subject && r.relation_type == RelationType::HasPriority));
    graph.link(
        subject,
        &priority_entity_name(value),
        RelationType::HasPriority,
    );
}

/// Current status of a subject, read from its `has_status` edge.
pub(crate) fn status_of(graph: &KnowledgeGraph, subject: &str) -> Option<String> {
    graph
        .targets_of(subject, RelationType::HasStatus)
        .next()
        .and_then(|target| target.split_once(':'))
        .map(|(_, value)| value.to_string())
}

/// Current priority of a subject, read from its `has_priority` edge.
pub(crate) fn priority_of(graph: &KnowledgeGraph, subject: &str) -> Option<String> {
    graph
        .targets_of(subject, RelationType::HasPriority)
        .next()
        .and_then(|target| target.split_once(':'))
        .map(|(_, value)| value.to_string())
}

/// Get/set operations for entity status and priority.
#[derive(Debug, Clone)]
pub struct StatusManager {
    files: FileStore,
}

impl StatusManager {
    /// Create a manager over the given files
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Idempotently create the singleton status and priority entities.
    ///
    /// Called once at process start; saves only when something was missing.
    pub async fn initialize(&self) -> GraphResult<()> {
        let mut graph = self.files.load_graph().await?;
        if ensure_value_entities(&mut graph) {
            self.files.save_graph(&graph).await?;
            info!("Initialized status and priority entities");
        }
        Ok(())
    }

    /// Current status of an entity, or `None` when no edge exists.
    pub async fn get_status(&self, name: &str) -> GraphResult<Option<String>> {
        let graph = self.files.load_graph().await?;
        if !graph.has_entity(name) {
            return Err(GraphError::EntityNotFound {
                name: name.to_string(),
            });
        }
        Ok(status_of(&graph, name))
    }

    /// Set an entity's status, replacing any previous `has_status` edge.
    pub async fn set_status(&self, name: &str, value: &str) -> GraphResult<()> {
        let value: StatusValue = value.parse()?;
        let mut graph = self.files.load_graph().await?;
        if !graph.has_entity(name) {
            return Err(GraphError::EntityNotFound {
                name: name.to_string(),
            });
        }
        ensure_value_entities(&mut graph);
        set_status_edge(&mut graph, name, value);
        self.files.save_graph(&graph).await?;
        info!(entity = %name, status = %value, "Status set");
        Ok(())
    }

    /// Current priority of an entity, or `None` when no edge exists.
    pub async fn get_priority(&self, name: &str) -> GraphResult<Option<String>> {
        let graph = self.files.load_graph().await?;
        if !graph.has_entity(name) {
            return Err(GraphError::EntityNotFound {
                name: name.to_string(),
            });
        }
        Ok(priority_of(&graph, name))
    }

    /// Set an entity's priority, replacing any previous `has_priority` edge.
    pub async fn set_priority(&self, name: &str, value: &str) -> GraphResult<()> {
        let value: PriorityValue = value.parse()?;
        let mut graph = self.files.load_graph().await?;
        if !graph.has_entity(name) {
            return Err(GraphError::EntityNotFound {
                name: name.to_string(),
            });
        }
        ensure_value_entities(&mut graph);
        set_priority_edge(&mut graph, name, value);
        self.files.save_graph(&graph).await?;
        info!(entity = %name, priority = %value, "Priority set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Relation;
    use tempfile::TempDir;

    fn test_manager(dir: &TempDir) -> (StatusManager, FileStore) {
        let files = FileStore::with_paths(
            dir.path().join("graph.json"),
            dir.path().join("sessions.json"),
        );
        (StatusManager::new(files.clone()), files)
    }

    async fn seed_project(files: &FileStore, name: &str) {
        let mut graph = files.load_graph().await.unwrap();
        graph.insert_entities(vec![Entity::new(name, EntityType::Project)]);
        files.save_graph(&graph).await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (manager, files) = test_manager(&dir);

        manager.initialize().await.unwrap();
        let first = files.load_graph().await.unwrap();
        manager.initialize().await.unwrap();
        let second = files.load_graph().await.unwrap();

        assert_eq!(first, second);
        assert!(first.has_entity("status:active"));
        assert!(first.has_entity("priority:high"));
        assert_eq!(
            first.entities.len(),
            STATUS_VALUES.len() + PRIORITY_VALUES.len()
        );
    }

    #[tokio::test]
    async fn test_set_status_replaces_previous_edge() {
        let dir = TempDir::new().unwrap();
        let (manager, files) = test_manager(&dir);
        seed_project(&files, "P1").await;

        manager.set_status("P1", "active").await.unwrap();
        manager.set_status("P1", "completed").await.unwrap();

        let graph = files.load_graph().await.unwrap();
        let edges: Vec<&Relation> = graph
            .relations
            .iter()
            .filter(|r| r.from == "P1" && r.relation_type == RelationType::HasStatus)
            .collect();
        assert_eq!(edges.len(), 1, "exactly one has_status edge");
        assert_eq!(edges[0].to, "status:completed");

        assert_eq!(
            manager.get_status("P1").await.unwrap(),
            Some("completed".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_status_rejects_unknown_value() {
        let dir = TempDir::new().unwrap();
        let (manager, files) = test_manager(&dir);
        seed_project(&files, "P1").await;

        let err = manager.set_status("P1", "done-ish").await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidStatus { .. }));

        let graph = files.load_graph().await.unwrap();
        assert!(graph.relations.is_empty());
    }

    #[tokio::test]
    async fn test_set_status_requires_subject() {
        let dir = TempDir::new().unwrap();
        let (manager, _files) = test_manager(&dir);

        let err = manager.set_status("Ghost", "active").await.unwrap_err();
        assert!(matches!(err, GraphError::EntityNotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_status_none_without_edge() {
        let dir = TempDir::new().unwrap();
        let (manager, files) = test_manager(&dir);
        seed_project(&files, "P1").await;

        assert_eq!(manager.get_status("P1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_priority_round_trip() {
        let dir = TempDir::new().unwrap();
        let (manager, files) = test_manager(&dir);
        seed_project(&files, "P1").await;

        manager.set_priority("P1", "high").await.unwrap();
        assert_eq!(
            manager.get_priority("P1").await.unwrap(),
            Some("high".to_string())
        );

        manager.set_priority("P1", "low").await.unwrap();
        assert_eq!(
            manager.get_priority("P1").await.unwrap(),
            Some("low".to_string())
        );

        let graph = files.load_graph().await.unwrap();
        let count = graph
            .relations
            .iter()
            .filter(|r| r.from == "P1" && r.relation_type == RelationType::HasPriority)
            .count();
        assert_eq!(count, 1);
    }
}
