//! Pointer interaction for the relationship network
//!
//! Rendering surfaces translate raw input into [`GraphInteraction`] calls.
//! [`InteractionController`] holds the state those calls need between
//! events: the viewport, the node being dragged, and what is hovered.

use serde::Serialize;
use tracing::trace;

use crate::camera::Viewport;
use crate::config::LayoutConfig;
use crate::model::{Edge, GraphModel, Node};
use crate::selection::SelectionCoordinator;
use crate::simulation::{ForceLayoutEngine, LayoutPosition};

/// Input events a rendering surface forwards to the layout core
///
/// Pointer coordinates are in screen pixels.
pub trait GraphInteraction {
    fn on_node_click(&mut self, id: &str);
    fn on_background_click(&mut self);
    fn on_node_drag_start(&mut self, id: &str, x: f64, y: f64);
    fn on_node_drag_move(&mut self, x: f64, y: f64);
    fn on_node_drag_end(&mut self);
    fn on_node_hover(&mut self, id: Option<&str>);
    fn on_edge_hover(&mut self, id: Option<&str>);
    fn on_pan(&mut self, dx: f64, dy: f64);
    fn on_zoom(&mut self, factor: f64, x: f64, y: f64);
}

/// What is under the pointer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Hover {
    #[default]
    Nothing,
    Node(String),
    Edge(String),
}

/// Result of a hit test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit<'a> {
    Node(&'a str),
    Edge(&'a str),
    Background,
}

/// Transient hover detail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tooltip {
    Node { title: String, detail: String },
    Edge { title: String, detail: Option<String> },
}

impl Tooltip {
    pub fn for_node(node: &Node) -> Self {
        let plural = if node.degree == 1 { "" } else { "s" };
        Tooltip::Node {
            title: node.display_name.clone(),
            detail: format!(
                "{} · {} relationship{}",
                node.category.as_str(),
                node.degree,
                plural
            ),
        }
    }

    /// `None` when an endpoint is not in `model`
    pub fn for_edge(edge: &Edge, model: &GraphModel) -> Option<Self> {
        let source = model.node(&edge.source)?;
        let target = model.node(&edge.target)?;
        Some(Tooltip::Edge {
            title: format!(
                "{} {} {}",
                source.display_name, edge.category, target.display_name
            ),
            detail: edge.description.clone(),
        })
    }

    /// Plain text, one line per row
    pub fn text(&self) -> String {
        match self {
            Tooltip::Node { title, detail } => format!("{title}\n{detail}"),
            Tooltip::Edge {
                title,
                detail: Some(detail),
            } => format!("{title}\n{detail}"),
            Tooltip::Edge { title, detail: None } => title.clone(),
        }
    }
}

/// Topmost node containing the world point
///
/// Later nodes are drawn over earlier ones, so they are tested first.
pub fn node_at(engine: &ForceLayoutEngine, x: f64, y: f64) -> Option<&str> {
    let point = LayoutPosition::new(x, y);
    engine
        .positions()
        .iter()
        .zip(engine.radii())
        .zip(engine.ids())
        .rev()
        .find(|((pos, radius), _)| pos.distance_to(&point) <= **radius)
        .map(|(_, id)| id.as_str())
}

/// Nearest edge within `threshold` world units of the point
pub fn edge_at<'m>(
    model: &'m GraphModel,
    engine: &ForceLayoutEngine,
    x: f64,
    y: f64,
    threshold: f64,
) -> Option<&'m Edge> {
    let point = LayoutPosition::new(x, y);
    model
        .edges()
        .iter()
        .filter_map(|edge| {
            let a = engine.position(&edge.source)?;
            let b = engine.position(&edge.target)?;
            let distance = distance_to_segment(point, a, b);
            (distance <= threshold).then_some((edge, distance))
        })
        .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
        .map(|(edge, _)| edge)
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: LayoutPosition, a: LayoutPosition, b: LayoutPosition) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    p.distance_to(&LayoutPosition::new(a.x + t * dx, a.y + t * dy))
}

/// Interaction state carried between pointer events
#[derive(Debug, Clone)]
pub struct InteractionController {
    viewport: Viewport,
    dragging: Option<String>,
    hover: Hover,
    drag_alpha_target: f64,
    /// Edge pick distance in screen pixels
    edge_threshold: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            viewport: Viewport::new(&config.viewport),
            dragging: None,
            hover: Hover::Nothing,
            drag_alpha_target: config.simulation.drag_alpha_target,
            edge_threshold: config.labels.edge_hover_threshold,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn hover(&self) -> &Hover {
        &self.hover
    }

    pub fn hovered_node(&self) -> Option<&str> {
        match &self.hover {
            Hover::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Forget drag and hover, e.g. when the graph is replaced
    pub fn reset(&mut self) {
        self.dragging = None;
        self.hover = Hover::Nothing;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom(&mut self, factor: f64, x: f64, y: f64) {
        self.viewport.zoom_at(factor, x, y);
    }

    pub fn click_node(&mut self, selection: &mut SelectionCoordinator, id: &str) {
        selection.select(id);
    }

    pub fn click_background(&mut self, selection: &mut SelectionCoordinator) {
        selection.clear();
    }

    /// Pin `id` under the pointer and wake the simulation
    pub fn begin_drag(&mut self, engine: &mut ForceLayoutEngine, id: &str, x: f64, y: f64) -> bool {
        let (wx, wy) = self.viewport.screen_to_world(x, y);
        if !engine.pin(id, LayoutPosition::new(wx, wy)) {
            return false;
        }
        engine.reheat(self.drag_alpha_target);
        trace!(node = id, "drag started");
        self.dragging = Some(id.to_string());
        true
    }

    /// Move the dragged node to the pointer
    pub fn drag_to(&mut self, engine: &mut ForceLayoutEngine, x: f64, y: f64) -> bool {
        let Some(id) = self.dragging.as_deref() else {
            return false;
        };
        let (wx, wy) = self.viewport.screen_to_world(x, y);
        if !engine.pin(id, LayoutPosition::new(wx, wy)) {
            return false;
        }
        engine.reheat(self.drag_alpha_target);
        true
    }

    /// Release the dragged node and let the simulation settle
    pub fn end_drag(&mut self, engine: &mut ForceLayoutEngine) -> bool {
        let Some(id) = self.dragging.take() else {
            return false;
        };
        engine.unpin(&id);
        engine.cool();
        trace!(node = %id, "drag ended");
        true
    }

    pub fn set_hover(&mut self, hover: Hover) {
        self.hover = hover;
    }

    /// Hit test a screen point: nodes win over edges
    pub fn pick<'m>(
        &self,
        model: &'m GraphModel,
        engine: &ForceLayoutEngine,
        x: f64,
        y: f64,
    ) -> Hit<'m> {
        let (wx, wy) = self.viewport.screen_to_world(x, y);
        if let Some(id) = node_at(engine, wx, wy) {
            // Re-borrow from the model so the hit outlives the engine borrow
            if let Some(node) = model.node(id) {
                return Hit::Node(&node.id);
            }
        }
        let threshold = self.edge_threshold / self.viewport.scale();
        match edge_at(model, engine, wx, wy, threshold) {
            Some(edge) => Hit::Edge(&edge.id),
            None => Hit::Background,
        }
    }

    /// Tooltip for whatever is hovered
    pub fn tooltip(&self, model: &GraphModel) -> Option<Tooltip> {
        match &self.hover {
            Hover::Nothing => None,
            Hover::Node(id) => model.node(id).map(Tooltip::for_node),
            Hover::Edge(id) => model
                .edges()
                .iter()
                .find(|edge| &edge.id == id)
                .and_then(|edge| Tooltip::for_edge(edge, model)),
        }
    }
}
