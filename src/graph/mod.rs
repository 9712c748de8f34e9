//! Knowledge graph domain model.
//!
//! This module defines entities, relations, and the aggregate
//! [`KnowledgeGraph`], together with the in-memory mutation primitives that
//! the store and the session commit build on. Nothing here touches disk;
//! persistence lives in [`crate::storage`].

pub(crate) mod status;
mod store;

pub use status::{PriorityValue, StatusManager, StatusValue};
pub use store::{
    EntityInput, GraphStore, ObservationAdded, ObservationDeletion, ObservationInput,
    RelationInput,
};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Type of an entity in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    /// A research project grouping all other artifacts.
    Project,
    /// A dataset collected or analyzed by a project.
    Dataset,
    /// A variable measured within a dataset.
    Variable,
    /// A testable hypothesis.
    Hypothesis,
    /// A statistical test run against data.
    StatisticalTest,
    /// A result produced by a test or model.
    Result,
    /// A script implementing an analysis.
    AnalysisScript,
    /// A chart or figure.
    Visualization,
    /// A statistical or machine-learning model.
    Model,
    /// A literature reference.
    Literature,
    /// A research question a project addresses.
    ResearchQuestion,
    /// A finding derived from results.
    Finding,
    /// A study participant.
    Participant,
    /// A synthetic status value entity (`status:<value>`).
    Status,
    /// A synthetic priority value entity (`priority:<value>`).
    Priority,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Project => write!(f, "project"),
            EntityType::Dataset => write!(f, "dataset"),
            EntityType::Variable => write!(f, "variable"),
            EntityType::Hypothesis => write!(f, "hypothesis"),
            EntityType::StatisticalTest => write!(f, "statisticalTest"),
            EntityType::Result => write!(f, "result"),
            EntityType::AnalysisScript => write!(f, "analysisScript"),
            EntityType::Visualization => write!(f, "visualization"),
            EntityType::Model => write!(f, "model"),
            EntityType::Literature => write!(f, "literature"),
            EntityType::ResearchQuestion => write!(f, "researchQuestion"),
            EntityType::Finding => write!(f, "finding"),
            EntityType::Participant => write!(f, "participant"),
            EntityType::Status => write!(f, "status"),
            EntityType::Priority => write!(f, "priority"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(EntityType::Project),
            "dataset" => Ok(EntityType::Dataset),
            "variable" => Ok(EntityType::Variable),
            "hypothesis" => Ok(EntityType::Hypothesis),
            "statisticalTest" => Ok(EntityType::StatisticalTest),
            "result" => Ok(EntityType::Result),
            "analysisScript" => Ok(EntityType::AnalysisScript),
            "visualization" => Ok(EntityType::Visualization),
            "model" => Ok(EntityType::Model),
            "literature" => Ok(EntityType::Literature),
            "researchQuestion" => Ok(EntityType::ResearchQuestion),
            "finding" => Ok(EntityType::Finding),
            "participant" => Ok(EntityType::Participant),
            "status" => Ok(EntityType::Status),
            "priority" => Ok(EntityType::Priority),
            _ => Err(GraphError::InvalidEntityType {
                value: s.to_string(),
            }),
        }
    }
}

/// Type of a directed relation between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Container holds a member (dataset contains variable).
    Contains,
    /// Derived from another artifact.
    DerivedFrom,
    /// Test or model analyzes a dataset or variable.
    Analyzes,
    /// Artifact was produced by another.
    ProducedBy,
    /// Evidence supports a claim.
    Supports,
    /// Evidence contradicts a claim.
    Contradicts,
    /// Based on prior work.
    BasedOn,
    /// Cites a literature reference.
    Cites,
    /// Hypothesis or finding addresses a research question.
    Addresses,
    /// Temporal ordering between artifacts.
    Precedes,
    /// Subject has a current status value.
    HasStatus,
    /// Subject has a current priority value.
    HasPriority,
    /// Two variables correlate.
    CorrelatesWith,
    /// One variable predicts another.
    Predicts,
    /// Test tests a hypothesis.
    Tests,
    /// Test produces a result.
    Produces,
    /// Visualization visualizes a dataset, model, or variable.
    Visualizes,
    /// Member belongs to a project.
    PartOf,
    /// Artifact depends on another.
    DependsOn,
    /// Analysis controls for a variable.
    ControlsFor,
    /// Variable moderates a relationship.
    Moderates,
    /// Variable mediates a relationship.
    Mediates,
    /// Script implements an analysis.
    Implements,
    /// Test or model compares against another.
    Compares,
    /// Container includes a member.
    Includes,
    /// Result validates a model or hypothesis.
    Validates,
    /// Hypothesis is tested by a test.
    TestedBy,
    /// Model was trained on a dataset.
    TrainedOn,
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationType::Contains => write!(f, "contains"),
            RelationType::DerivedFrom => write!(f, "derived_from"),
            RelationType::Analyzes => write!(f, "analyzes"),
            RelationType::ProducedBy => write!(f, "produced_by"),
            RelationType::Supports => write!(f, "supports"),
            RelationType::Contradicts => write!(f, "contradicts"),
            RelationType::BasedOn => write!(f, "based_on"),
            RelationType::Cites => write!(f, "cites"),
            RelationType::Addresses => write!(f, "addresses"),
            RelationType::Precedes => write!(f, "precedes"),
            RelationType::HasStatus => write!(f, "has_status"),
            RelationType::HasPriority => write!(f, "has_priority"),
            RelationType::CorrelatesWith => write!(f, "correlates_with"),
            RelationType::Predicts => write!(f, "predicts"),
            RelationType::Tests => write!(f, "tests"),
            RelationType::Produces => write!(f, "produces"),
            RelationType::Visualizes => write!(f, "visualizes"),
            RelationType::PartOf => write!(f, "part_of"),
            RelationType::DependsOn => write!(f, "depends_on"),
            RelationType::ControlsFor => write!(f, "controls_for"),
            RelationType::Moderates => write!(f, "moderates"),
            RelationType::Mediates => write!(f, "mediates"),
            RelationType::Implements => write!(f, "implements"),
            RelationType::Compares => write!(f, "compares"),
            RelationType::Includes => write!(f, "includes"),
            RelationType::Validates => write!(f, "validates"),
            RelationType::TestedBy => write!(f, "tested_by"),
            RelationType::TrainedOn => write!(f, "trained_on"),
        }
    }
}

impl std::str::FromStr for RelationType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(RelationType::Contains),
            "derived_from" => Ok(RelationType::DerivedFrom),
            "analyzes" => Ok(RelationType::Analyzes),
            "produced_by" => Ok(RelationType::ProducedBy),
            "supports" => Ok(RelationType::Supports),
            "contradicts" => Ok(RelationType::Contradicts),
            "based_on" => Ok(RelationType::BasedOn),
            "cites" => Ok(RelationType::Cites),
            "addresses" => Ok(RelationType::Addresses),
            "precedes" => Ok(RelationType::Precedes),
            "has_status" => Ok(RelationType::HasStatus),
            "has_priority" => Ok(RelationType::HasPriority),
            "correlates_with" => Ok(RelationType::CorrelatesWith),
            "predicts" => Ok(RelationType::Predicts),
            "tests" => Ok(RelationType::Tests),
            "produces" => Ok(RelationType::Produces),
            "visualizes" => Ok(RelationType::Visualizes),
            "part_of" => Ok(RelationType::PartOf),
            "depends_on" => Ok(RelationType::DependsOn),
            "controls_for" => Ok(RelationType::ControlsFor),
            "moderates" => Ok(RelationType::Moderates),
            "mediates" => Ok(RelationType::Mediates),
            "implements" => Ok(RelationType::Implements),
            "compares" => Ok(RelationType::Compares),
            "includes" => Ok(RelationType::Includes),
            "validates" => Ok(RelationType::Validates),
            "tested_by" => Ok(RelationType::TestedBy),
            "trained_on" => Ok(RelationType::TrainedOn),
            _ => Err(GraphError::InvalidRelationType {
                value: s.to_string(),
            }),
        }
    }
}

/// A named, typed node carrying a list of free-text observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique entity name.
    pub name: String,
    /// Type from the closed entity-type set.
    #[serde(rename = "entityType")]
    pub entity_type: EntityType,
    /// Free-text facts; many encode a `Key: value` prefix by convention.
    #[serde(default)]
    pub observations: Vec<String>,
}

impl Entity {
    /// Create a new entity with no observations
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            observations: Vec::new(),
        }
    }

    /// Set the observation list
    pub fn with_observations(mut self, observations: Vec<String>) -> Self {
        self.observations = observations;
        self
    }

    /// Replace any `key:`-prefixed observation with `Key: value`.
    ///
    /// The old observation is matched case-insensitively on the key prefix,
    /// so `size: 100` and `Size=100` are both replaced by `Size: 200`.
    pub fn replace_keyed_observation(&mut self, key: &str, value: &str) {
        self.observations.retain(|obs| {
            let trimmed = obs.trim();
            match trimmed.get(..key.len()) {
                Some(head) if head.eq_ignore_ascii_case(key) => {
                    let rest = trimmed[key.len()..].trim_start();
                    !(rest.starts_with(':') || rest.starts_with('='))
                }
                _ => true,
            }
        });
        self.observations.push(format!("{}: {}", key, value));
    }
}

/// A directed, labeled edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity name.
    pub from: String,
    /// Target entity name.
    pub to: String,
    /// Type from the closed relation-type set.
    #[serde(rename = "relationType")]
    pub relation_type: RelationType,
}

impl Relation {
    /// Create a new relation
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type,
        }
    }
}

/// The aggregate graph, persisted as one JSON unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    /// All entities.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// All relations.
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    /// Find an entity by name
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Find an entity by name, mutably
    pub fn find_entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    /// Whether an entity with this name exists
    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.iter().any(|e| e.name == name)
    }

    /// Whether the exact `(from, to, relationType)` triple exists
    pub fn has_relation(&self, relation: &Relation) -> bool {
        self.relations.iter().any(|r| r == relation)
    }

    /// Look up an entity and require a specific type.
    ///
    /// Fails with [`GraphError::EntityNotFound`] or [`GraphError::WrongType`].
    pub fn require_typed(&self, name: &str, expected: EntityType) -> GraphResult<&Entity> {
        let entity = self
            .find_entity(name)
            .ok_or_else(|| GraphError::EntityNotFound {
                name: name.to_string(),
            })?;
        if entity.entity_type != expected {
            return Err(GraphError::WrongType {
                name: name.to_string(),
                expected,
                actual: entity.entity_type,
            });
        }
        Ok(entity)
    }

    /// Append entities whose names are not yet taken; returns what was added.
    ///
    /// Duplicate names are silently dropped, matching the store contract:
    /// callers cannot distinguish "already existed" from "nothing requested".
    pub fn insert_entities(&mut self, entities: Vec<Entity>) -> Vec<Entity> {
        let mut added = Vec::new();
        for entity in entities {
            if !self.has_entity(&entity.name) {
                added.push(entity.clone());
                self.entities.push(entity);
            }
        }
        added
    }

    /// Append relations after validating every endpoint; returns what was added.
    ///
    /// The whole batch is validated before any relation is appended, so a
    /// missing endpoint leaves the graph untouched. Existing triples are
    /// silently skipped.
    pub fn insert_relations(&mut self, relations: Vec<Relation>) -> GraphResult<Vec<Relation>> {
        for relation in &relations {
            for endpoint in [&relation.from, &relation.to] {
                if !self.has_entity(endpoint) {
                    return Err(GraphError::EntityNotFound {
                        name: endpoint.clone(),
                    });
                }
            }
        }
        let mut added = Vec::new();
        for relation in relations {
            if !self.has_relation(&relation) && !added.contains(&relation) {
                added.push(relation.clone());
                self.relations.push(relation);
            }
        }
        Ok(added)
    }

    /// Insert a single relation if both endpoints exist and it is new.
    pub(crate) fn link(&mut self, from: &str, to: &str, relation_type: RelationType) {
        let relation = Relation::new(from, to, relation_type);
        if self.has_entity(from) && self.has_entity(to) && !self.has_relation(&relation) {
            self.relations.push(relation);
        }
    }

    /// Append observation strings not already present; returns what was added.
    pub fn append_observations(
        &mut self,
        entity_name: &str,
        contents: &[String],
    ) -> GraphResult<Vec<String>> {
        let entity =
            self.find_entity_mut(entity_name)
                .ok_or_else(|| GraphError::EntityNotFound {
                    name: entity_name.to_string(),
                })?;
        let mut added = Vec::new();
        for content in contents {
            if !entity.observations.contains(content) && !added.contains(content) {
                added.push(content.clone());
                entity.observations.push(content.clone());
            }
        }
        Ok(added)
    }

    /// Remove entities by name and cascade-delete their relations.
    pub fn remove_entities(&mut self, names: &[String]) {
        let doomed: HashSet<&str> = names.iter().map(String::as_str).collect();
        self.entities.retain(|e| !doomed.contains(e.name.as_str()));
        self.relations
            .retain(|r| !doomed.contains(r.from.as_str()) && !doomed.contains(r.to.as_str()));
    }

    /// Remove listed observation strings from an entity, if present.
    ///
    /// A missing entity is silently skipped.
    pub fn remove_observations(&mut self, entity_name: &str, observations: &[String]) {
        if let Some(entity) = self.find_entity_mut(entity_name) {
            entity.observations.retain(|obs| !observations.contains(obs));
        }
    }

    /// Remove relations matching the exact triples; non-matches are no-ops.
    pub fn remove_relations(&mut self, relations: &[Relation]) {
        self.relations.retain(|r| !relations.contains(r));
    }

    /// Relations originating from an entity
    pub fn relations_from<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.from == name)
    }

    /// Relations pointing to an entity
    pub fn relations_to<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.to == name)
    }

    /// Names of entities this entity points to via the given relation type
    pub fn targets_of<'a>(
        &'a self,
        name: &'a str,
        relation_type: RelationType,
    ) -> impl Iterator<Item = &'a str> {
        self.relations
            .iter()
            .filter(move |r| r.from == name && r.relation_type == relation_type)
            .map(|r| r.to.as_str())
    }

    /// Names of entities pointing to this entity via the given relation type
    pub fn sources_of<'a>(
        &'a self,
        name: &'a str,
        relation_type: RelationType,
    ) -> impl Iterator<Item = &'a str> {
        self.relations
            .iter()
            .filter(move |r| r.to == name && r.relation_type == relation_type)
            .map(|r| r.from.as_str())
    }

    /// Entities of a given type pointing at `name` via `relation_type`.
    pub fn typed_sources<'a>(
        &'a self,
        name: &'a str,
        relation_type: RelationType,
        entity_type: EntityType,
    ) -> impl Iterator<Item = &'a Entity> {
        self.sources_of(name, relation_type)
            .filter_map(|source| self.find_entity(source))
            .filter(move |e| e.entity_type == entity_type)
    }

    /// The induced subgraph over a set of entity names: the named entities
    /// plus every relation whose both endpoints are in the set.
    pub fn induced_subgraph(&self, names: &HashSet<&str>) -> KnowledgeGraph {
        KnowledgeGraph {
            entities: self
                .entities
                .iter()
                .filter(|e| names.contains(e.name.as_str()))
                .cloned()
                .collect(),
            relations: self
                .relations
                .iter()
                .filter(|r| names.contains(r.from.as_str()) && names.contains(r.to.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// Scan observations for a `key: value` or `key = value` entry.
///
/// Matching is case-insensitive on the key; the first match wins. Returns
/// the trimmed value, or `None` if no observation carries the key.
pub fn observation_value(observations: &[String], key: &str) -> Option<String> {
    observations.iter().find_map(|obs| {
        let trimmed = obs.trim();
        let head = trimmed.get(..key.len())?;
        if !head.eq_ignore_ascii_case(key) {
            return None;
        }
        let rest = trimmed[key.len()..].trim_start();
        let value = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('='))?
            .trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// First observation containing any of the keywords, case-insensitive.
pub fn first_matching_observation(observations: &[String], keywords: &[&str]) -> Option<String> {
    observations
        .iter()
        .find(|obs| {
            let lower = obs.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .cloned()
}

/// Whether any observation contains the needle, case-insensitive.
pub fn any_observation_contains(observations: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    observations
        .iter()
        .any(|obs| obs.to_lowercase().contains(&needle))
}
