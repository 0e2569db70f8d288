//! Grouped, searchable entity list
//!
//! Groups follow a fixed category order with unknown categories appended in
//! the order they are first seen. Within a group, better connected entities
//! come first.

use serde::Serialize;

use crate::model::{GraphModel, Node};

/// Category display order
pub const TYPE_ORDER: [&str; 5] = ["person", "place", "organization", "object", "amount"];

/// Group heading for a category
pub fn group_label(category: &str) -> String {
    match category {
        "person" => "People".to_string(),
        "place" => "Places".to_string(),
        "organization" => "Organizations".to_string(),
        "object" => "Objects".to_string(),
        "amount" => "Amounts".to_string(),
        other => other.to_string(),
    }
}

/// One row of the list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    pub degree: usize,
}

/// Entities sharing a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityGroup {
    pub category: String,
    pub label: String,
    pub rows: Vec<EntityRow>,
}

/// Case-insensitive substring match on name or any alias
///
/// A blank query matches everything.
pub fn matches_query(node: &Node, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    node.display_name.to_lowercase().contains(&query)
        || node
            .aliases
            .iter()
            .any(|alias| alias.to_lowercase().contains(&query))
}

/// Build the grouped list for `query`
pub fn group_entities(model: &GraphModel, query: &str) -> Vec<EntityGroup> {
    let mut groups: Vec<EntityGroup> = Vec::new();

    for node in model.nodes().iter().filter(|n| matches_query(n, query)) {
        let category = node.category.as_str();
        let row = EntityRow {
            id: node.id.clone(),
            name: node.display_name.clone(),
            degree: node.degree,
        };
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.rows.push(row),
            None => groups.push(EntityGroup {
                category: category.to_string(),
                label: group_label(category),
                rows: vec![row],
            }),
        }
    }

    for group in &mut groups {
        // Stable: equal degrees keep input order
        group.rows.sort_by(|a, b| b.degree.cmp(&a.degree));
    }

    let rank = |category: &str| {
        TYPE_ORDER
            .iter()
            .position(|known| *known == category)
            .unwrap_or(TYPE_ORDER.len())
    };
    groups.sort_by_key(|g| rank(&g.category));
    groups
}

/// Row index of `id` in display order across all groups
pub fn scroll_index(groups: &[EntityGroup], id: &str) -> Option<usize> {
    groups
        .iter()
        .flat_map(|g| g.rows.iter())
        .position(|row| row.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EntityRecord, RelationshipRecord};

    fn entity(id: &str, name: &str, kind: &str, aliases: &[&str]) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: Some(kind.to_string()),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            ..EntityRecord::default()
        }
    }

    fn rel(a: &str, b: &str) -> RelationshipRecord {
        RelationshipRecord {
            id: format!("{a}-{b}"),
            entity_a_id: a.to_string(),
            entity_b_id: b.to_string(),
            ..RelationshipRecord::default()
        }
    }

    fn model() -> GraphModel {
        GraphModel::from_entities(
            &[
                entity("ship", "Pequod", "vessel", &[]),
                entity("moscow", "Moscow", "place", &[]),
                entity("pierre", "Pierre", "person", &["Count Bezukhov"]),
                entity("natasha", "Natasha", "person", &["Natalya"]),
                entity("ring", "Ring", "object", &[]),
                entity("whale", "Moby Dick", "animal", &[]),
            ],
            &[
                rel("natasha", "moscow"),
                rel("natasha", "pierre"),
                rel("pierre", "ring"),
                rel("natasha", "ring"),
            ],
        )
    }

    #[test]
    fn groups_follow_type_order_then_first_seen() {
        let groups = group_entities(&model(), "");
        let order: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(order, vec!["person", "place", "object", "vessel", "animal"]);
        assert_eq!(groups[0].label, "People");
        assert_eq!(groups[3].label, "vessel");
    }

    #[test]
    fn rows_sort_by_degree_descending() {
        let groups = group_entities(&model(), "");
        let people: Vec<&str> = groups[0].rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(people, vec!["natasha", "pierre"]);
        assert_eq!(groups[0].rows[0].degree, 3);
    }

    #[test]
    fn search_matches_aliases_ignoring_case() {
        let groups = group_entities(&model(), "  bezukhov ");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows[0].id, "pierre");

        assert!(group_entities(&model(), "nobody").is_empty());
    }

    #[test]
    fn scroll_index_counts_across_groups() {
        let groups = group_entities(&model(), "");
        assert_eq!(scroll_index(&groups, "natasha"), Some(0));
        assert_eq!(scroll_index(&groups, "moscow"), Some(2));
        assert_eq!(scroll_index(&groups, "whale"), Some(5));
        assert_eq!(scroll_index(&groups, "ghost"), None);
    }
}
