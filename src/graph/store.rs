//! Persistence-backed mutation API for the knowledge graph.
//!
//! Every operation is read-modify-write: load the whole graph, validate the
//! whole batch, mutate in memory, write the whole graph back. Validation
//! always precedes mutation, so a failed call never leaves the persisted
//! file partially updated.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Entity, EntityType, KnowledgeGraph, Relation, RelationType};
use crate::storage::FileStore;

/// A requested entity, with its type still unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInput {
    /// Entity name.
    pub name: String,
    /// Entity type string, validated against the closed set.
    pub entity_type: String,
    /// Initial observations.
    #[serde(default)]
    pub observations: Vec<String>,
}

/// A requested relation, with its type still unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInput {
    /// Source entity name.
    pub from: String,
    /// Target entity name.
    pub to: String,
    /// Relation type string, validated against the closed set.
    pub relation_type: String,
}

/// Observations to append to one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    /// Target entity name.
    pub entity_name: String,
    /// Observation strings to add.
    pub contents: Vec<String>,
}

/// What was actually added to one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationAdded {
    /// Target entity name.
    pub entity_name: String,
    /// The observations that were new and got appended.
    pub added_observations: Vec<String>,
}

/// Observations to remove from one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDeletion {
    /// Target entity name.
    pub entity_name: String,
    /// Observation strings to remove.
    pub observations: Vec<String>,
}

/// The graph mutation and lookup API.
#[derive(Debug, Clone)]
pub struct GraphStore {
    files: FileStore,
}

impl GraphStore {
    /// Create a store over the given files
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Create entities, dropping any whose name already exists.
    ///
    /// The whole batch is type-validated first; an invalid type fails the
    /// call before anything is written. Returns only the newly added
    /// entities.
    pub async fn create_entities(&self, inputs: Vec<EntityInput>) -> GraphResult<Vec<Entity>> {
        let mut entities = Vec::with_capacity(inputs.len());
        for input in inputs {
            let entity_type = EntityType::from_str(&input.entity_type)?;
            entities.push(Entity {
                name: input.name,
                entity_type,
                observations: input.observations,
            });
        }

        let mut graph = self.files.load_graph().await?;
        let added = graph.insert_entities(entities);
        self.files.save_graph(&graph).await?;
        info!(added = added.len(), "Created entities");
        Ok(added)
    }

    /// Create relations between existing entities.
    ///
    /// Fails with `InvalidRelationType` on an unknown type and
    /// `EntityNotFound` naming the first missing endpoint; either failure
    /// aborts the whole batch before any write. Duplicate triples are
    /// silently skipped. Returns only the newly added relations.
    pub async fn create_relations(&self, inputs: Vec<RelationInput>) -> GraphResult<Vec<Relation>> {
        let mut relations = Vec::with_capacity(inputs.len());
        for input in inputs {
            let relation_type = RelationType::from_str(&input.relation_type)?;
            relations.push(Relation {
                from: input.from,
                to: input.to,
                relation_type,
            });
        }

        let mut graph = self.files.load_graph().await?;
        let added = graph.insert_relations(relations)?;
        self.files.save_graph(&graph).await?;
        info!(added = added.len(), "Created relations");
        Ok(added)
    }

    /// Append observations to existing entities, deduplicated by exact
    /// string match. Every named entity must exist; a missing one fails the
    /// whole call before any write.
    pub async fn add_observations(
        &self,
        inputs: Vec<ObservationInput>,
    ) -> GraphResult<Vec<ObservationAdded>> {
        let mut graph = self.files.load_graph().await?;

        for input in &inputs {
            if !graph.has_entity(&input.entity_name) {
                return Err(GraphError::EntityNotFound {
                    name: input.entity_name.clone(),
                });
            }
        }

        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let added = graph.append_observations(&input.entity_name, &input.contents)?;
            results.push(ObservationAdded {
                entity_name: input.entity_name,
                added_observations: added,
            });
        }

        self.files.save_graph(&graph).await?;
        Ok(results)
    }

    /// Delete entities by name, cascading to every relation touching them.
    ///
    /// Deleting a nonexistent name is a no-op.
    pub async fn delete_entities(&self, names: Vec<String>) -> GraphResult<()> {
        let mut graph = self.files.load_graph().await?;
        let before = graph.entities.len();
        graph.remove_entities(&names);
        self.files.save_graph(&graph).await?;
        info!(removed = before - graph.entities.len(), "Deleted entities");
        Ok(())
    }

    /// Remove listed observation strings from entities.
    ///
    /// A missing entity is silently skipped (unlike `add_observations`).
    pub async fn delete_observations(
        &self,
        deletions: Vec<ObservationDeletion>,
    ) -> GraphResult<()> {
        let mut graph = self.files.load_graph().await?;
        for deletion in &deletions {
            graph.remove_observations(&deletion.entity_name, &deletion.observations);
        }
        self.files.save_graph(&graph).await?;
        Ok(())
    }

    /// Remove relations matching the exact triples.
    ///
    /// Non-matching triples are no-ops; an unknown relation-type string
    /// cannot match any stored relation and is likewise a no-op.
    pub async fn delete_relations(&self, inputs: Vec<RelationInput>) -> GraphResult<()> {
        let relations: Vec<Relation> = inputs
            .into_iter()
            .filter_map(|input| {
                let relation_type = RelationType::from_str(&input.relation_type).ok()?;
                Some(Relation {
                    from: input.from,
                    to: input.to,
                    relation_type,
                })
            })
            .collect();

        let mut graph = self.files.load_graph().await?;
        graph.remove_relations(&relations);
        self.files.save_graph(&graph).await?;
        Ok(())
    }

    /// Full snapshot of the persisted graph
    pub async fn read_graph(&self) -> GraphResult<KnowledgeGraph> {
        self.files.load_graph().await
    }

    /// Search entities by whitespace-separated tokens.
    ///
    /// An entity matches when every token appears (case-insensitively) in
    /// its name, its type, or any one of its observations. Returns the
    /// matching entities plus the relations among them (induced subgraph).
    pub async fn search_nodes(&self, query: &str) -> GraphResult<KnowledgeGraph> {
        let graph = self.files.load_graph().await?;
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let matched: HashSet<&str> = graph
            .entities
            .iter()
            .filter(|entity| {
                let name = entity.name.to_lowercase();
                let entity_type = entity.entity_type.to_string().to_lowercase();
                tokens.iter().all(|token| {
                    name.contains(token)
                        || entity_type.contains(token)
                        || entity
                            .observations
                            .iter()
                            .any(|obs| obs.to_lowercase().contains(token))
                })
            })
            .map(|entity| entity.name.as_str())
            .collect();

        debug!(query = %query, matched = matched.len(), "Search complete");
        Ok(graph.induced_subgraph(&matched))
    }

    /// Exact-name lookup with the same induced-subgraph relation filter.
    pub async fn open_nodes(&self, names: Vec<String>) -> GraphResult<KnowledgeGraph> {
        let graph = self.files.load_graph().await?;
        let wanted: HashSet<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| graph.has_entity(name))
            .collect();
        Ok(graph.induced_subgraph(&wanted))
    }
}
