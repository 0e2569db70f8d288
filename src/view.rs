//! Relationship network session
//!
//! [`GraphView`] is what a rendering surface talks to. It owns the model,
//! the live simulation and all interaction state, advances everything once
//! per [`frame`](GraphView::frame), and answers render queries.

use serde::Serialize;
use tracing::{debug, info};

use crate::camera::{ViewTransform, Viewport};
use crate::config::LayoutConfig;
use crate::interaction::{GraphInteraction, Hit, Hover, InteractionController, Tooltip};
use crate::labels::{LabelOptions, LabelToggle};
use crate::model::{GraphModel, NodeCategory};
use crate::scheduler::{FrameScheduler, SimulationToken, StepOutcome};
use crate::selection::SelectionCoordinator;
use crate::simulation::{ForceLayoutEngine, LayoutPosition, SimulationStatus};

/// Everything needed to draw one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeVisual {
    pub id: String,
    /// World coordinates
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub opacity: f64,
    pub category: NodeCategory,
    pub color: [f32; 4],
    /// Label text when the label is visible
    pub label: Option<String>,
    pub selected: bool,
}

/// Everything needed to draw one edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeVisual {
    pub id: String,
    pub from: LayoutPosition,
    pub to: LayoutPosition,
    pub label: Option<String>,
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    /// Status of the live run, if there is one
    pub status: Option<SimulationStatus>,
    /// The viewport was fitted to the layout this frame
    pub fitted: bool,
    /// The camera is still easing toward its target
    pub animating: bool,
}

/// Live relationship network
pub struct GraphView {
    config: LayoutConfig,
    model: GraphModel,
    scheduler: FrameScheduler,
    token: Option<SimulationToken>,
    /// The current settle has already been fitted
    fitted: bool,
    interaction: InteractionController,
    selection: SelectionCoordinator,
    labels: LabelOptions,
}

impl GraphView {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            model: GraphModel::default(),
            scheduler: FrameScheduler::new(config.simulation.clone(), config.radius),
            token: None,
            fitted: false,
            interaction: InteractionController::new(&config),
            selection: SelectionCoordinator::new(&config.selection),
            labels: LabelOptions::from_config(&config.labels),
            config,
        }
    }

    /// Replace the graph and start laying it out
    ///
    /// The prior simulation is discarded and the selection cleared.
    pub fn set_graph(&mut self, model: GraphModel) -> SimulationToken {
        info!(
            nodes = model.nodes().len(),
            edges = model.edges().len(),
            "graph rebuilt"
        );
        let viewport = self.interaction.viewport();
        let center = LayoutPosition::new(viewport.width / 2.0, viewport.height / 2.0);

        let token = self.scheduler.start(&model, center);
        self.model = model;
        self.token = Some(token);
        self.fitted = false;
        self.selection.reset();
        self.interaction.reset();
        token
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// No nodes: the surface shows its empty state
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn engine(&self) -> Option<&ForceLayoutEngine> {
        self.scheduler.engine()
    }

    pub fn status(&self) -> Option<SimulationStatus> {
        self.engine().map(ForceLayoutEngine::status)
    }

    pub fn viewport(&self) -> &Viewport {
        self.interaction.viewport()
    }

    pub fn transform(&self) -> ViewTransform {
        self.interaction.viewport().transform
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.interaction.viewport_mut().resize(width, height);
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
        &mut self.selection
    }

    pub fn labels(&self) -> &LabelOptions {
        &self.labels
    }

    /// Flip one label switch; returns whether that switch is now on
    pub fn toggle_labels(&mut self, toggle: LabelToggle) -> bool {
        let on = self.labels.toggle(toggle);
        debug!(?toggle, on, "label visibility changed");
        on
    }

    /// Advance one display frame
    ///
    /// Steps the simulation once. The viewport is fitted only on the frame a
    /// run settles, never while it is moving.
    pub fn frame(&mut self) -> FrameReport {
        let status = match self.token.map(|t| self.scheduler.step(t)) {
            Some(StepOutcome::Stepped(status)) => Some(status),
            Some(StepOutcome::Stale) | None => None,
        };

        let mut fitted = false;
        match status {
            Some(SimulationStatus::Running) => self.fitted = false,
            // A held node keeps the layout in motion; wait for the release
            Some(s)
                if s.is_settled() && !self.fitted && self.interaction.dragging().is_none() =>
            {
                self.fitted = true;
                fitted = self.fit();
            }
            _ => {}
        }

        let animating = self.interaction.viewport_mut().update_animation();
        FrameReport {
            status,
            fitted,
            animating,
        }
    }

    /// Run frames until the simulation settles, then jump to the fitted view
    pub fn settle(&mut self) -> FrameReport {
        let budget = self.config.simulation.max_iterations + 1;
        let mut report = self.frame();
        for _ in 0..budget {
            if report.status.is_none_or(|s| s != SimulationStatus::Running) {
                break;
            }
            report = self.frame();
        }
        self.interaction.viewport_mut().snap();
        report.animating = false;
        report
    }

    fn fit(&mut self) -> bool {
        let Some(engine) = self.scheduler.engine() else {
            return false;
        };
        let fitted = self
            .interaction
            .viewport_mut()
            .fit_to(engine.positions(), engine.radii());
        if !fitted {
            debug!("layout bounds are degenerate; keeping current view");
        }
        fitted
    }

    pub fn pick(&self, x: f64, y: f64) -> Hit<'_> {
        match self.scheduler.engine() {
            Some(engine) => self.interaction.pick(&self.model, engine, x, y),
            None => Hit::Background,
        }
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.interaction.tooltip(&self.model)
    }

    pub fn node_visuals(&self) -> Vec<NodeVisual> {
        let Some(engine) = self.scheduler.engine() else {
            return Vec::new();
        };
        let hovered = self.interaction.hovered_node();

        self.model
            .nodes()
            .iter()
            .zip(engine.positions())
            .zip(engine.radii())
            .map(|((node, pos), radius)| {
                let selected = self.selection.is_selected(&node.id);
                let is_hovered = hovered == Some(node.id.as_str());
                let label = self
                    .labels
                    .node_label_visible(node.degree, is_hovered, selected)
                    .then(|| node.display_name.clone());
                NodeVisual {
                    id: node.id.clone(),
                    x: pos.x,
                    y: pos.y,
                    radius: *radius,
                    opacity: self.selection.node_opacity(&node.id),
                    category: node.category.clone(),
                    color: node.category.color(),
                    label,
                    selected,
                }
            })
            .collect()
    }

    pub fn edge_visuals(&self) -> Vec<EdgeVisual> {
        let Some(engine) = self.scheduler.engine() else {
            return Vec::new();
        };
        let hovered_edge = match self.interaction.hover() {
            Hover::Edge(id) => Some(id.as_str()),
            _ => None,
        };

        self.model
            .edges()
            .iter()
            .filter_map(|edge| {
                let from = engine.position(&edge.source)?;
                let to = engine.position(&edge.target)?;
                let show = self.labels.show_edge_labels() || hovered_edge == Some(edge.id.as_str());
                Some(EdgeVisual {
                    id: edge.id.clone(),
                    from,
                    to,
                    label: show.then(|| edge.category.clone()),
                })
            })
            .collect()
    }
}

impl GraphInteraction for GraphView {
    fn on_node_click(&mut self, id: &str) {
        self.interaction.click_node(&mut self.selection, id);
    }

    fn on_background_click(&mut self) {
        self.interaction.click_background(&mut self.selection);
    }

    fn on_node_drag_start(&mut self, id: &str, x: f64, y: f64) {
        let Some(token) = self.token else {
            return;
        };
        if let Some(engine) = self.scheduler.engine_mut(token) {
            if self.interaction.begin_drag(engine, id, x, y) {
                self.fitted = false;
            }
        }
    }

    fn on_node_drag_move(&mut self, x: f64, y: f64) {
        let Some(token) = self.token else {
            return;
        };
        if let Some(engine) = self.scheduler.engine_mut(token) {
            self.interaction.drag_to(engine, x, y);
        }
    }

    fn on_node_drag_end(&mut self) {
        let Some(token) = self.token else {
            return;
        };
        if let Some(engine) = self.scheduler.engine_mut(token) {
            self.interaction.end_drag(engine);
        }
    }

    fn on_node_hover(&mut self, id: Option<&str>) {
        let hover = match id {
            Some(id) if self.model.node(id).is_some() => Hover::Node(id.to_string()),
            _ => Hover::Nothing,
        };
        self.interaction.set_hover(hover);
    }

    fn on_edge_hover(&mut self, id: Option<&str>) {
        let hover = match id {
            Some(id) if self.model.edges().iter().any(|e| e.id == id) => {
                Hover::Edge(id.to_string())
            }
            _ => Hover::Nothing,
        };
        self.interaction.set_hover(hover);
    }

    fn on_pan(&mut self, dx: f64, dy: f64) {
        self.interaction.pan(dx, dy);
    }

    fn on_zoom(&mut self, factor: f64, x: f64, y: f64) {
        self.interaction.zoom(factor, x, y);
    }
}
