//! Raw input records from upstream collaborators
//!
//! These mirror the JSON shapes produced by the extraction pipeline and the
//! project graph export. Every field defaults when absent so a partially
//! populated record still deserializes; validation happens when the records
//! are turned into a [`GraphModel`](crate::model::GraphModel).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LayoutResult;
use crate::model::GraphModel;

/// An extracted entity (person, place, organization, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityRecord {
    pub id: String,

    pub name: String,

    /// Entity category, e.g. "person"
    #[serde(alias = "category")]
    pub entity_type: Option<String>,

    /// Alternative names used for text matching
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// A typed relationship between two entities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    pub id: String,

    #[serde(alias = "category")]
    pub relationship_type: Option<String>,

    pub entity_a_id: String,

    pub entity_b_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A node from the project graph export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeRecord {
    pub id: String,

    #[serde(alias = "category")]
    pub node_type: Option<String>,

    pub label: String,

    /// Open property bag; only read through typed accessors in the model
    pub properties: Value,
}

/// An edge from the project graph export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRecord {
    pub id: String,

    #[serde(alias = "category")]
    pub edge_type: Option<String>,

    #[serde(alias = "source_id")]
    pub source_node: String,

    #[serde(alias = "target_id")]
    pub target_node: String,

    pub properties: Value,
}

/// A source document, used for color-coding and badges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
}

/// An entity reference attached to a timeline event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineEntity {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub role: Option<String>,
}

/// An event as served by the timeline collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date_text: Option<String>,
    /// Explicit entity associations, possibly empty
    pub entities: Vec<TimelineEntity>,
}

/// Everything the command line harness reads from a graph file
///
/// Either the export shape (`nodes`/`edges`) or the entity shape
/// (`entities`/`relationships`) may be populated. The export shape wins when
/// it has any nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphInput {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub entities: Vec<EntityRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub documents: Vec<DocumentRecord>,
}

impl GraphInput {
    /// Parse a graph input from a JSON string
    pub fn from_json_str(content: &str) -> LayoutResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a graph input from a JSON file
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build the validated model for whichever shape is populated
    pub fn to_model(&self) -> GraphModel {
        if !self.nodes.is_empty() {
            GraphModel::from_export(&self.nodes, &self.edges)
        } else {
            GraphModel::from_entities(&self.entities, &self.relationships)
        }
    }
}
