//! Validated graph model
//!
//! Normalizes entity/relationship records (or graph export nodes/edges) into
//! typed [`Node`]s and [`Edge`]s. Edges whose endpoints are missing are
//! dropped, and every node carries its degree over the retained edges.
//! Construction never fails: malformed input degrades to an empty or smaller
//! model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::RadiusConfig;
use crate::records::{EdgeRecord, EntityRecord, NodeRecord, RelationshipRecord};

/// Category used when a record carries none
pub const OTHER_CATEGORY: &str = "other";

/// Color constants for node categories (RGBA, normalized 0.0-1.0)
pub mod colors {
    /// Person: Blue (#3B82F6)
    pub const PERSON: [f32; 4] = [0.231, 0.510, 0.965, 1.0];

    /// Place: Green (#10B981)
    pub const PLACE: [f32; 4] = [0.063, 0.725, 0.506, 1.0];

    /// Organization: Amber (#F59E0B)
    pub const ORGANIZATION: [f32; 4] = [0.961, 0.620, 0.043, 1.0];

    /// Object: Purple (#8B5CF6)
    pub const OBJECT: [f32; 4] = [0.545, 0.361, 0.965, 1.0];

    /// Amount: Red (#EF4444)
    pub const AMOUNT: [f32; 4] = [0.937, 0.267, 0.267, 1.0];

    /// Event: Slate (#64748B)
    pub const EVENT: [f32; 4] = [0.392, 0.455, 0.545, 1.0];

    /// Anything else: Gray (#94A3B8)
    pub const OTHER: [f32; 4] = [0.580, 0.639, 0.722, 1.0];
}

/// Node category for semantic grouping
///
/// Upstream categories are open text; the known ones get their own variant
/// and everything else is kept verbatim (lowercased) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeCategory {
    Person,
    Organization,
    Place,
    Object,
    Amount,
    Event,
    Other(String),
}

impl NodeCategory {
    /// Parse an optional raw category; absent or blank becomes `other`
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        match normalized.as_str() {
            "person" => NodeCategory::Person,
            "organization" => NodeCategory::Organization,
            "place" => NodeCategory::Place,
            "object" => NodeCategory::Object,
            "amount" => NodeCategory::Amount,
            "event" => NodeCategory::Event,
            "" => NodeCategory::Other(OTHER_CATEGORY.to_string()),
            _ => NodeCategory::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeCategory::Person => "person",
            NodeCategory::Organization => "organization",
            NodeCategory::Place => "place",
            NodeCategory::Object => "object",
            NodeCategory::Amount => "amount",
            NodeCategory::Event => "event",
            NodeCategory::Other(name) => name,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, NodeCategory::Event)
    }

    /// Get the default color for this category
    pub fn color(&self) -> [f32; 4] {
        match self {
            NodeCategory::Person => colors::PERSON,
            NodeCategory::Organization => colors::ORGANIZATION,
            NodeCategory::Place => colors::PLACE,
            NodeCategory::Object => colors::OBJECT,
            NodeCategory::Amount => colors::AMOUNT,
            NodeCategory::Event => colors::EVENT,
            NodeCategory::Other(_) => colors::OTHER,
        }
    }
}

impl From<String> for NodeCategory {
    fn from(raw: String) -> Self {
        NodeCategory::parse(Some(&raw))
    }
}

impl From<NodeCategory> for String {
    fn from(category: NodeCategory) -> Self {
        category.as_str().to_string()
    }
}

/// Typed event metadata pulled out of an export property bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Entity ids listed explicitly on the event
    pub entity_ids: Vec<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub confidence: Option<f64>,
    pub document_id: Option<String>,
    pub document_title: Option<String>,
}

impl EventDetails {
    /// Read known keys from a property bag, ignoring wrongly typed values
    pub fn from_properties(properties: &Value) -> Self {
        let mut entity_ids = string_list_prop(properties, "involved_entities");
        if let Some(single) = string_prop(properties, "entity_id") {
            if !entity_ids.contains(&single) {
                entity_ids.push(single);
            }
        }

        Self {
            entity_ids,
            date: string_prop(properties, "date"),
            description: string_prop(properties, "description"),
            confidence: properties.get("confidence").and_then(Value::as_f64),
            document_id: string_prop(properties, "document_id"),
            document_title: string_prop(properties, "document_title"),
        }
    }
}

/// A graph vertex: an entity or an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub display_name: String,
    pub category: NodeCategory,
    /// Number of retained edges touching this node
    pub degree: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Present only for event nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventDetails>,
}

impl Node {
    /// Visual radius derived from degree
    pub fn radius(&self, config: &RadiusConfig) -> f64 {
        config.radius_for(self.degree)
    }

    pub fn is_event(&self) -> bool {
        self.category.is_event()
    }

    fn new(id: &str, display_name: &str, category: NodeCategory) -> Self {
        let display_name = if display_name.trim().is_empty() {
            id.to_string()
        } else {
            display_name.to_string()
        };
        Self {
            id: id.to_string(),
            display_name,
            category,
            degree: 0,
            aliases: Vec::new(),
            description: None,
            document_id: None,
            event: None,
        }
    }
}

/// A typed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub category: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validated nodes and edges plus per-node degree
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

impl GraphModel {
    /// Build from extracted entities and their relationships
    pub fn from_entities(entities: &[EntityRecord], relationships: &[RelationshipRecord]) -> Self {
        let nodes = entities
            .iter()
            .map(|record| {
                let category = NodeCategory::parse(record.entity_type.as_deref());
                let mut node = Node::new(&record.id, &record.name, category);
                node.aliases = clean_strings(&record.aliases);
                node.description = non_blank(record.description.as_deref());
                node.document_id = non_blank(record.document_id.as_deref());
                if node.is_event() {
                    node.event = Some(EventDetails {
                        description: node.description.clone(),
                        document_id: node.document_id.clone(),
                        ..EventDetails::default()
                    });
                }
                node
            })
            .collect();

        let edges = relationships
            .iter()
            .map(|record| Edge {
                id: record.id.clone(),
                category: edge_category(record.relationship_type.as_deref()),
                source: record.entity_a_id.clone(),
                target: record.entity_b_id.clone(),
                description: non_blank(record.description.as_deref()),
            })
            .collect();

        Self::build(nodes, edges)
    }

    /// Build from a project graph export
    pub fn from_export(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Self {
        let nodes = nodes
            .iter()
            .map(|record| {
                let category = NodeCategory::parse(record.node_type.as_deref());
                let props = &record.properties;
                let mut node = Node::new(&record.id, &record.label, category);

                let mut aliases = string_list_prop(props, "aliases");
                if let Some(alias) = string_prop(props, "alias") {
                    aliases.push(alias);
                }
                node.aliases = aliases;
                node.description = string_prop(props, "description");
                node.document_id = string_prop(props, "document_id");
                if node.is_event() {
                    node.event = Some(EventDetails::from_properties(props));
                }
                node
            })
            .collect();

        let edges = edges
            .iter()
            .map(|record| Edge {
                id: record.id.clone(),
                category: edge_category(record.edge_type.as_deref()),
                source: record.source_node.clone(),
                target: record.target_node.clone(),
                description: string_prop(&record.properties, "description"),
            })
            .collect();

        Self::build(nodes, edges)
    }

    /// Derive a sub-model keeping only nodes matching `keep`
    ///
    /// Edges touching a removed node are dropped and degrees recomputed.
    pub fn filter_nodes<F>(&self, keep: F) -> Self
    where
        F: Fn(&Node) -> bool,
    {
        let nodes = self.nodes.iter().filter(|n| keep(n)).cloned().collect();
        Self::build(nodes, self.edges.clone())
    }

    fn build(raw_nodes: Vec<Node>, raw_edges: Vec<Edge>) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(raw_nodes.len());
        let mut index = HashMap::with_capacity(raw_nodes.len());

        for mut node in raw_nodes {
            if node.id.trim().is_empty() {
                debug!("dropping node with blank id");
                continue;
            }
            if index.contains_key(&node.id) {
                debug!(node = %node.id, "dropping duplicate node");
                continue;
            }
            node.degree = 0;
            index.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        for (i, mut edge) in raw_edges.into_iter().enumerate() {
            let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                debug!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "dropping edge with dangling endpoint"
                );
                continue;
            };
            if edge.id.trim().is_empty() {
                edge.id = format!("edge-{i}");
            }
            nodes[source].degree += 1;
            nodes[target].degree += 1;
            edges.push(edge);
        }

        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Degree of a node; 0 for unknown ids
    pub fn degree(&self, id: &str) -> usize {
        self.node(id).map_or(0, |n| n.degree)
    }

    /// Degree of every node keyed by id
    pub fn degree_map(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .map(|n| (n.id.as_str(), n.degree))
            .collect()
    }

    /// Radius of a node; `None` for unknown ids
    pub fn radius(&self, id: &str, config: &RadiusConfig) -> Option<f64> {
        self.node(id).map(|n| n.radius(config))
    }

    /// Ids of nodes sharing an edge with `id`, in edge order, without repeats
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for edge in &self.edges {
            let other = if edge.source == id {
                edge.target.as_str()
            } else if edge.target == id {
                edge.source.as_str()
            } else {
                continue;
            };
            if !out.contains(&other) {
                out.push(other);
            }
        }
        out
    }
}

fn edge_category(raw: Option<&str>) -> String {
    non_blank(raw)
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| OTHER_CATEGORY.to_string())
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clean_strings(raw: &[String]) -> Vec<String> {
    raw.iter()
        .filter_map(|s| non_blank(Some(s.as_str())))
        .collect()
}

fn string_prop(properties: &Value, key: &str) -> Option<String> {
    non_blank(properties.get(key).and_then(Value::as_str))
}

fn string_list_prop(properties: &Value, key: &str) -> Vec<String> {
    properties
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| non_blank(v.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str, name: &str, entity_type: &str) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: Some(entity_type.to_string()),
            ..EntityRecord::default()
        }
    }

    fn rel(id: &str, a: &str, b: &str) -> RelationshipRecord {
        RelationshipRecord {
            id: id.to_string(),
            relationship_type: Some("knows".to_string()),
            entity_a_id: a.to_string(),
            entity_b_id: b.to_string(),
            description: None,
        }
    }

    fn chain() -> GraphModel {
        GraphModel::from_entities(
            &[
                entity("a", "A", "person"),
                entity("b", "B", "person"),
                entity("c", "C", "place"),
            ],
            &[rel("ab", "a", "b"), rel("bc", "b", "c")],
        )
    }

    #[test]
    fn degree_counts_both_endpoints() {
        let model = chain();
        assert_eq!(model.degree("a"), 1);
        assert_eq!(model.degree("b"), 2);
        assert_eq!(model.degree("c"), 1);
    }

    #[test]
    fn radius_follows_degree() {
        let model = chain();
        let config = RadiusConfig::default();
        let ra = model.radius("a", &config).unwrap();
        let rb = model.radius("b", &config).unwrap();
        let rc = model.radius("c", &config).unwrap();
        assert!(rb > ra);
        assert_eq!(ra, rc);
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let model = GraphModel::from_entities(
            &[entity("a", "A", "person"), entity("b", "B", "person")],
            &[rel("ab", "a", "b"), rel("ax", "a", "x"), rel("yb", "y", "b")],
        );
        assert_eq!(model.edges().len(), 1);
        for edge in model.edges() {
            assert!(model.node(&edge.source).is_some());
            assert!(model.node(&edge.target).is_some());
        }
        assert_eq!(model.degree("a"), 1);
        assert_eq!(model.degree("b"), 1);
    }

    #[test]
    fn degree_matches_retained_edges_for_every_node() {
        let model = GraphModel::from_entities(
            &[
                entity("a", "A", "person"),
                entity("b", "B", "person"),
                entity("c", "C", "person"),
                entity("d", "D", "person"),
            ],
            &[
                rel("1", "a", "b"),
                rel("2", "a", "c"),
                rel("3", "a", "ghost"),
                rel("4", "c", "b"),
                rel("5", "d", "d"),
            ],
        );
        for node in model.nodes() {
            let touching: usize = model
                .edges()
                .iter()
                .map(|e| (e.source == node.id) as usize + (e.target == node.id) as usize)
                .sum();
            assert_eq!(node.degree, touching, "degree of {}", node.id);
        }
    }

    #[test]
    fn missing_category_defaults_to_other() {
        let model = GraphModel::from_entities(
            &[EntityRecord {
                id: "a".to_string(),
                name: "A".to_string(),
                ..EntityRecord::default()
            }],
            &[RelationshipRecord {
                id: "r".to_string(),
                entity_a_id: "a".to_string(),
                entity_b_id: "a".to_string(),
                ..RelationshipRecord::default()
            }],
        );
        assert_eq!(model.nodes()[0].category.as_str(), "other");
        assert_eq!(model.edges()[0].category, "other");
    }

    #[test]
    fn unknown_category_is_kept_lowercase() {
        assert_eq!(
            NodeCategory::parse(Some(" Vehicle ")),
            NodeCategory::Other("vehicle".to_string())
        );
        assert_eq!(NodeCategory::parse(Some("EVENT")), NodeCategory::Event);
    }

    #[test]
    fn duplicate_and_blank_nodes_are_dropped() {
        let model = GraphModel::from_entities(
            &[
                entity("a", "First", "person"),
                entity("a", "Second", "person"),
                entity(" ", "Blank", "person"),
            ],
            &[],
        );
        assert_eq!(model.nodes().len(), 1);
        assert_eq!(model.node("a").unwrap().display_name, "First");
    }

    #[test]
    fn empty_input_gives_empty_model() {
        let model = GraphModel::from_export(&[], &[]);
        assert!(model.is_empty());
        assert!(model.edges().is_empty());
    }

    #[test]
    fn export_event_properties_are_typed() {
        let nodes = vec![NodeRecord {
            id: "ev".to_string(),
            node_type: Some("event".to_string()),
            label: "Battle".to_string(),
            properties: json!({
                "involved_entities": ["a", 3, "b"],
                "entity_id": "c",
                "date": "1805-12-02",
                "confidence": 0.8,
                "document_id": 12,
                "document_title": "War and Peace"
            }),
        }];
        let model = GraphModel::from_export(&nodes, &[]);
        let details = model.node("ev").unwrap().event.clone().unwrap();
        assert_eq!(details.entity_ids, vec!["a", "b", "c"]);
        assert_eq!(details.date.as_deref(), Some("1805-12-02"));
        assert_eq!(details.confidence, Some(0.8));
        // Wrong type is ignored rather than rejected
        assert_eq!(details.document_id, None);
        assert_eq!(details.document_title.as_deref(), Some("War and Peace"));
    }

    #[test]
    fn blank_label_falls_back_to_id() {
        let model = GraphModel::from_export(
            &[NodeRecord {
                id: "n1".to_string(),
                ..NodeRecord::default()
            }],
            &[],
        );
        assert_eq!(model.node("n1").unwrap().display_name, "n1");
    }

    #[test]
    fn blank_edge_ids_are_synthesized() {
        let nodes = vec![
            NodeRecord {
                id: "a".to_string(),
                ..NodeRecord::default()
            },
            NodeRecord {
                id: "b".to_string(),
                ..NodeRecord::default()
            },
        ];
        let edges = vec![EdgeRecord {
            source_node: "a".to_string(),
            target_node: "b".to_string(),
            ..EdgeRecord::default()
        }];
        let model = GraphModel::from_export(&nodes, &edges);
        assert_eq!(model.edges()[0].id, "edge-0");
    }

    #[test]
    fn filter_nodes_recomputes_degree() {
        let model = chain();
        let without_c = model.filter_nodes(|n| n.id != "c");
        assert_eq!(without_c.nodes().len(), 2);
        assert_eq!(without_c.edges().len(), 1);
        assert_eq!(without_c.degree("b"), 1);
    }

    #[test]
    fn neighbors_are_unique() {
        let model = GraphModel::from_entities(
            &[entity("a", "A", "person"), entity("b", "B", "person")],
            &[rel("1", "a", "b"), rel("2", "b", "a")],
        );
        assert_eq!(model.neighbors("a"), vec!["b"]);
        assert!(model.neighbors("zzz").is_empty());
    }

    #[test]
    fn category_serializes_as_string() {
        let json = serde_json::to_string(&NodeCategory::Place).unwrap();
        assert_eq!(json, "\"place\"");
        let back: NodeCategory = serde_json::from_str("\"ship\"").unwrap();
        assert_eq!(back, NodeCategory::Other("ship".to_string()));
    }
}
