//! Swimlane layout: entities as lanes, events as time-ordered cards
//!
//! Events are correlated with entities two ways, merged: the entity ids
//! listed explicitly on the event, and association edges whose direction is
//! looked up per edge category in [`SwimlaneConfig::associations`]. Only
//! entities with at least one event get a lane. When events exist but none
//! is associated with any entity, a single synthetic lane holds them all.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{AssociationDirection, SwimlaneConfig};
use crate::labels;
use crate::model::{GraphModel, NodeCategory};
use crate::records::DocumentRecord;

/// Id of the synthetic lane used when no event has an associated entity
pub const FALLBACK_LANE_ID: &str = "__all_events__";

/// Number of colors documents cycle through
pub const DOCUMENT_PALETTE_SIZE: usize = 5;

/// Document accent colors (RGBA, normalized 0.0-1.0)
pub const DOCUMENT_COLORS: [[f32; 4]; DOCUMENT_PALETTE_SIZE] = [
    // Blue (#3B6FED)
    [0.231, 0.435, 0.929, 1.0],
    // Teal (#0D9488)
    [0.051, 0.580, 0.533, 1.0],
    // Amber (#D97706)
    [0.851, 0.467, 0.024, 1.0],
    // Purple (#7C3AED)
    [0.486, 0.227, 0.929, 1.0],
    // Rose (#DB2777)
    [0.859, 0.153, 0.467, 1.0],
];

/// An entity shown as a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimlaneEntity {
    pub id: String,
    pub label: String,
    pub category: NodeCategory,
}

/// An event placed in one or more lanes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimlaneEvent {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub confidence: Option<f64>,
    pub document_id: Option<String>,
    pub document_title: Option<String>,
    /// Lanes this event belongs to, explicit associations first
    pub entity_ids: Vec<String>,
}

/// A lane row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub entity: SwimlaneEntity,
    pub row: usize,
    /// Top edge of the lane in chart pixels
    pub y: f64,
    /// Header text, truncated for display
    pub header: String,
}

/// One visual card: an event in one lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    pub event_id: String,
    pub entity_id: String,
    pub row: usize,
    pub column: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub date_label: Option<String>,
    pub badge: Option<String>,
    /// Index into [`DOCUMENT_COLORS`]; `None` for unknown documents
    pub document_color: Option<usize>,
}

/// A document label on the time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMarker {
    pub document_id: String,
    pub label: String,
    pub x: f64,
    pub document_color: usize,
}

/// Complete swimlane arrangement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwimlaneLayout {
    pub lanes: Vec<Lane>,
    /// Events in column order
    pub events: Vec<SwimlaneEvent>,
    pub cards: Vec<EventCard>,
    pub markers: Vec<DocumentMarker>,
    /// Events that ended up in no lane
    pub unassigned: Vec<String>,
    /// Whether the synthetic all-events lane is in use
    pub fallback: bool,
    pub width: f64,
    pub height: f64,
}

impl SwimlaneLayout {
    /// No events: the view shows its empty state
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn lane(&self, entity_id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.entity.id == entity_id)
    }

    pub fn event(&self, event_id: &str) -> Option<&SwimlaneEvent> {
        self.events.iter().find(|event| event.id == event_id)
    }

    /// Column of an event after sorting
    pub fn column_of(&self, event_id: &str) -> Option<usize> {
        self.events.iter().position(|event| event.id == event_id)
    }

    /// Cards in the lane of `entity_id`
    pub fn cards_for_entity(&self, entity_id: &str) -> Vec<&EventCard> {
        self.cards
            .iter()
            .filter(|card| card.entity_id == entity_id)
            .collect()
    }

    /// Events associated with `entity_id`, in column order
    pub fn events_for_entity(&self, entity_id: &str) -> Vec<&SwimlaneEvent> {
        self.events
            .iter()
            .filter(|event| event.entity_ids.iter().any(|id| id == entity_id))
            .collect()
    }
}

/// Builds a [`SwimlaneLayout`] from a [`GraphModel`]
#[derive(Debug, Clone, Default)]
pub struct SwimlaneLayoutEngine {
    config: SwimlaneConfig,
}

impl SwimlaneLayoutEngine {
    pub fn new(mut config: SwimlaneConfig) -> Self {
        config.normalize_associations();
        Self { config }
    }

    pub fn layout(&self, model: &GraphModel, documents: &[DocumentRecord]) -> SwimlaneLayout {
        let (entities, mut events) = partition(model);
        self.associate(model, &entities, &mut events);

        let (lanes, fallback) = self.active_lanes(&entities, &mut events);
        sort_events(&mut events);

        let doc_colors: HashMap<&str, usize> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (doc.id.as_str(), i % DOCUMENT_PALETTE_SIZE))
            .collect();

        self.place(lanes, events, fallback, documents, &doc_colors)
    }

    /// Merge edge-derived associations into each event's explicit list
    fn associate(
        &self,
        model: &GraphModel,
        entities: &[SwimlaneEntity],
        events: &mut [SwimlaneEvent],
    ) {
        let entity_ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        let event_index: HashMap<String, usize> = events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        for edge in model.edges() {
            let Some(direction) = self.config.direction_for(&edge.category) else {
                continue;
            };
            let (entity_end, event_end) = match direction {
                AssociationDirection::EntityToEvent => (&edge.source, &edge.target),
                AssociationDirection::EventToEntity => (&edge.target, &edge.source),
            };
            let Some(&i) = event_index.get(event_end) else {
                trace!(edge = %edge.id, "association edge does not end at an event");
                continue;
            };
            if !entity_ids.contains(entity_end.as_str()) {
                trace!(edge = %edge.id, "association edge does not start at an entity");
                continue;
            }
            if !events[i].entity_ids.contains(entity_end) {
                events[i].entity_ids.push(entity_end.clone());
            }
        }

        // Explicit ids that name no known entity can never form a lane
        for event in events.iter_mut() {
            event
                .entity_ids
                .retain(|id| entity_ids.contains(id.as_str()));
        }
    }

    /// Entities referenced by at least one event, in model order
    fn active_lanes(
        &self,
        entities: &[SwimlaneEntity],
        events: &mut [SwimlaneEvent],
    ) -> (Vec<SwimlaneEntity>, bool) {
        let referenced: HashSet<&str> = events
            .iter()
            .flat_map(|event| event.entity_ids.iter().map(String::as_str))
            .collect();

        let active: Vec<SwimlaneEntity> = entities
            .iter()
            .filter(|entity| referenced.contains(entity.id.as_str()))
            .cloned()
            .collect();

        if active.is_empty() && !events.is_empty() {
            debug!(
                events = events.len(),
                "no entity-event associations; using a single fallback lane"
            );
            for event in events.iter_mut() {
                event.entity_ids = vec![FALLBACK_LANE_ID.to_string()];
            }
            let lane = SwimlaneEntity {
                id: FALLBACK_LANE_ID.to_string(),
                label: self.config.fallback_lane_label.clone(),
                category: NodeCategory::Event,
            };
            return (vec![lane], true);
        }

        (active, false)
    }

    fn place(
        &self,
        entities: Vec<SwimlaneEntity>,
        events: Vec<SwimlaneEvent>,
        fallback: bool,
        documents: &[DocumentRecord],
        doc_colors: &HashMap<&str, usize>,
    ) -> SwimlaneLayout {
        let g = &self.config.geometry;
        let lane_stride = g.lane_height + g.lane_gap;
        let column_stride = g.card_width + g.card_gap;

        let lanes: Vec<Lane> = entities
            .into_iter()
            .enumerate()
            .map(|(row, entity)| Lane {
                header: labels::lane_header(&entity.label),
                y: g.margin_top + row as f64 * lane_stride,
                row,
                entity,
            })
            .collect();
        let rows: HashMap<&str, usize> = lanes
            .iter()
            .map(|lane| (lane.entity.id.as_str(), lane.row))
            .collect();

        let mut cards = Vec::new();
        let mut unassigned = Vec::new();
        for (column, event) in events.iter().enumerate() {
            let document_color = event
                .document_id
                .as_deref()
                .and_then(|id| doc_colors.get(id).copied());

            let mut placed = false;
            for entity_id in &event.entity_ids {
                let Some(&row) = rows.get(entity_id.as_str()) else {
                    continue;
                };
                placed = true;
                cards.push(EventCard {
                    event_id: event.id.clone(),
                    entity_id: entity_id.clone(),
                    row,
                    column,
                    x: g.margin_left + column as f64 * column_stride,
                    y: g.margin_top + row as f64 * lane_stride + g.card_inset,
                    width: g.card_width,
                    height: g.lane_height - 2.0 * g.card_inset,
                    title: labels::card_title(&event.label),
                    date_label: event
                        .date
                        .as_deref()
                        .map(|d| d.chars().take(16).collect()),
                    badge: event.document_title.as_deref().map(labels::badge),
                    document_color,
                });
            }
            if !placed {
                unassigned.push(event.id.clone());
            }
        }

        let markers = self.document_markers(&events, documents, doc_colors);

        let width = g
            .min_width
            .max(events.len() as f64 * column_stride + g.margin_left + g.margin_right);
        let height = g
            .min_height
            .max(lanes.len() as f64 * lane_stride + g.margin_top + g.margin_bottom);

        SwimlaneLayout {
            lanes,
            events,
            cards,
            markers,
            unassigned,
            fallback,
            width,
            height,
        }
    }

    /// One marker per document at the mean center of its columns
    ///
    /// Markers are laid out in document order and skipped when they would
    /// land within `marker_spacing` of the previously drawn one.
    fn document_markers(
        &self,
        events: &[SwimlaneEvent],
        documents: &[DocumentRecord],
        doc_colors: &HashMap<&str, usize>,
    ) -> Vec<DocumentMarker> {
        let g = &self.config.geometry;
        let column_stride = g.card_width + g.card_gap;

        let mut centers: HashMap<&str, Vec<f64>> = HashMap::new();
        for (column, event) in events.iter().enumerate() {
            if let Some(doc) = event.document_id.as_deref() {
                centers
                    .entry(doc)
                    .or_default()
                    .push(g.margin_left + column as f64 * column_stride + g.card_width / 2.0);
            }
        }

        let mut markers = Vec::new();
        let mut last_x: Option<f64> = None;
        for doc in documents {
            let Some(xs) = centers.get(doc.id.as_str()) else {
                continue;
            };
            let x = xs.iter().sum::<f64>() / xs.len() as f64;
            if last_x.is_some_and(|last| x <= last + g.marker_spacing) {
                continue;
            }
            markers.push(DocumentMarker {
                document_id: doc.id.clone(),
                label: labels::marker(&doc.title),
                x,
                document_color: doc_colors.get(doc.id.as_str()).copied().unwrap_or(0),
            });
            last_x = Some(x);
        }
        markers
    }
}

/// Split nodes into lane candidates and events
fn partition(model: &GraphModel) -> (Vec<SwimlaneEntity>, Vec<SwimlaneEvent>) {
    let mut entities = Vec::new();
    let mut events = Vec::new();

    for node in model.nodes() {
        if node.is_event() {
            let details = node.event.clone().unwrap_or_default();
            events.push(SwimlaneEvent {
                id: node.id.clone(),
                label: node.display_name.clone(),
                description: details.description.or_else(|| node.description.clone()),
                date: details.date,
                confidence: details.confidence,
                document_id: details.document_id.or_else(|| node.document_id.clone()),
                document_title: details.document_title,
                entity_ids: details.entity_ids,
            });
        } else {
            entities.push(SwimlaneEntity {
                id: node.id.clone(),
                label: node.display_name.clone(),
                category: node.category.clone(),
            });
        }
    }

    (entities, events)
}

/// Undated events first, then ascending by date string; stable
fn sort_events(events: &mut [SwimlaneEvent]) {
    // `None < Some(_)` puts undated events first
    events.sort_by(|a, b| a.date.cmp(&b.date));
}
