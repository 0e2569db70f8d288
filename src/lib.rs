//! chronicle-layout - layout and correlation engine for entity/event graphs.
//!
//! Turns extracted entities, relationships and events into two views: a
//! force-directed relationship network ([`view::GraphView`]) and a swimlane
//! timeline with one lane per entity ([`swimlane::SwimlaneLayoutEngine`]).
//! A single [`selection::SelectionCoordinator`] keeps both views, the entity
//! list and the timeline focused on the same entity.
//!
//! The core performs no I/O beyond reading input and configuration files and
//! never fails on malformed graph data; bad records degrade to a smaller
//! graph.

pub mod camera;
pub mod config;
pub mod entity_list;
pub mod error;
pub mod interaction;
pub mod labels;
pub mod model;
pub mod records;
pub mod scheduler;
pub mod selection;
pub mod simulation;
pub mod swimlane;
pub mod view;

pub use config::LayoutConfig;
pub use error::{LayoutError, LayoutResult};
pub use model::GraphModel;
pub use swimlane::{SwimlaneLayout, SwimlaneLayoutEngine};
pub use view::GraphView;
