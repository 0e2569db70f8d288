//! CPU force simulation for the relationship network
//!
//! Each step combines four forces: link springs, degree-weighted repulsion,
//! a weak pull toward the viewport center, and a collision constraint that is
//! resolved by direct displacement. Forces only accumulate deltas; positions
//! change once per step after every force has been evaluated, so the result
//! does not depend on force evaluation order.
//!
//! The simulation cools via `alpha` and stops once alpha drops below
//! `alpha_min` or the iteration cap is reached, whichever comes first.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{RadiusConfig, SimulationConfig};
use crate::model::GraphModel;

/// Distances below this are treated as coincident
const EPSILON: f64 = 1e-6;

/// A node position in world coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub x: f64,
    pub y: f64,
}

impl LayoutPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &LayoutPosition) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Lifecycle of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Running,
    /// Alpha decayed below the threshold
    Converged,
    /// Forcibly stopped at the iteration cap
    IterationCapReached,
    /// Stopped by the owner
    Stopped,
}

impl SimulationStatus {
    /// Converged or capped: positions are final for this run
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SimulationStatus::Converged | SimulationStatus::IterationCapReached
        )
    }
}

/// A placed node, as published to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Velocity {
    vx: f64,
    vy: f64,
}

/// A spring between two node indices
#[derive(Debug, Clone)]
struct Link {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction applied to the target
    bias: f64,
}

/// Force-directed layout over a [`GraphModel`]
pub struct ForceLayoutEngine {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    positions: Vec<LayoutPosition>,
    velocities: Vec<Velocity>,
    radii: Vec<f64>,
    charges: Vec<f64>,
    pins: Vec<Option<LayoutPosition>>,
    links: Vec<Link>,
    center: LayoutPosition,
    config: SimulationConfig,
    alpha: f64,
    alpha_target: f64,
    iterations: usize,
    status: SimulationStatus,
}

impl ForceLayoutEngine {
    /// Create a simulation with random initial positions around `center`
    pub fn new(
        model: &GraphModel,
        config: &SimulationConfig,
        radius: &RadiusConfig,
        center: LayoutPosition,
    ) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let n = model.nodes().len();
        let spread = config.initial_spread * (n.max(1) as f64).sqrt();
        let positions = (0..n)
            .map(|_| {
                LayoutPosition::new(
                    center.x + (rng.random::<f64>() * 2.0 - 1.0) * spread,
                    center.y + (rng.random::<f64>() * 2.0 - 1.0) * spread,
                )
            })
            .collect();

        Self::with_positions(model, config, radius, center, positions)
    }

    /// Create a simulation from explicit initial positions
    ///
    /// Nodes beyond the end of `initial` start at `center`.
    pub fn with_positions(
        model: &GraphModel,
        config: &SimulationConfig,
        radius: &RadiusConfig,
        center: LayoutPosition,
        initial: Vec<LayoutPosition>,
    ) -> Self {
        let nodes = model.nodes();
        let n = nodes.len();

        let ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect::<HashMap<_, _>>();

        let mut positions = initial;
        positions.resize(n, center);

        let radii: Vec<f64> = nodes.iter().map(|node| node.radius(radius)).collect();
        let charges = nodes
            .iter()
            .map(|node| -(config.charge_base + node.degree as f64 * config.charge_per_degree))
            .collect();

        let links = model
            .edges()
            .iter()
            .filter_map(|edge| {
                let source = *index.get(&edge.source)?;
                let target = *index.get(&edge.target)?;
                if source == target {
                    return None;
                }
                let source_degree = nodes[source].degree.max(1) as f64;
                let target_degree = nodes[target].degree.max(1) as f64;
                Some(Link {
                    source,
                    target,
                    distance: config.link_distance + radii[source] + radii[target],
                    strength: config.link_strength / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                })
            })
            .collect();

        let status = if n == 0 {
            SimulationStatus::Converged
        } else {
            SimulationStatus::Running
        };

        Self {
            ids,
            index,
            positions,
            velocities: vec![Velocity::default(); n],
            radii,
            charges,
            pins: vec![None; n],
            links,
            center,
            alpha: config.alpha,
            alpha_target: 0.0,
            iterations: 0,
            status,
            config: config.clone(),
        }
    }

    /// Check if simulation is still running
    pub fn is_running(&self) -> bool {
        self.status == SimulationStatus::Running
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Steps taken in the current run
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Current positions, indexed like [`GraphModel::nodes`]
    pub fn positions(&self) -> &[LayoutPosition] {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<LayoutPosition> {
        self.index.get(id).map(|&i| self.positions[i])
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Positions with ids and radii, for publishing
    pub fn placed_nodes(&self) -> Vec<PlacedNode> {
        self.ids
            .iter()
            .zip(&self.positions)
            .zip(&self.radii)
            .map(|((id, pos), &radius)| PlacedNode {
                id: id.clone(),
                x: pos.x,
                y: pos.y,
                radius,
            })
            .collect()
    }

    /// Run one simulation tick and return the resulting status
    pub fn tick(&mut self) -> SimulationStatus {
        if !self.is_running() {
            return self.status;
        }

        let n = self.positions.len();
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        // Ticks with a held node do not count toward the cap
        if !self.pins.iter().any(Option::is_some) {
            self.iterations += 1;
        }

        let mut dv = vec![Velocity::default(); n];
        self.apply_link_force(&mut dv);
        self.apply_many_body_force(&mut dv);
        self.apply_center_force(&mut dv);

        // Integrate velocities
        let retain = 1.0 - self.config.velocity_decay;
        for i in 0..n {
            if let Some(pin) = self.pins[i] {
                self.positions[i] = pin;
                self.velocities[i] = Velocity::default();
                continue;
            }
            let v = &mut self.velocities[i];
            v.vx = (v.vx + dv[i].vx) * retain;
            v.vy = (v.vy + dv[i].vy) * retain;
            self.positions[i].x += v.vx;
            self.positions[i].y += v.vy;
        }

        self.apply_collisions();

        if self.alpha < self.config.alpha_min {
            debug!(
                iterations = self.iterations,
                nodes = n,
                "force simulation converged"
            );
            self.status = SimulationStatus::Converged;
        } else if self.iterations >= self.config.max_iterations {
            warn!(
                iterations = self.iterations,
                alpha = self.alpha,
                "force simulation hit iteration cap; keeping last positions"
            );
            self.status = SimulationStatus::IterationCapReached;
        }
        self.status
    }

    /// Spring force between linked nodes toward their target distance
    fn apply_link_force(&self, dv: &mut [Velocity]) {
        for link in &self.links {
            let (s, t) = (link.source, link.target);
            let (mut dx, mut dy) = (
                self.positions[t].x - self.positions[s].x,
                self.positions[t].y - self.positions[s].y,
            );
            if dx.abs() < EPSILON && dy.abs() < EPSILON {
                (dx, dy) = nudge(s, t);
            }
            let dist = (dx * dx + dy * dy).sqrt().max(EPSILON);

            // Hooke's law: F = k * (x - x0)
            let k = (dist - link.distance) / dist * self.alpha * link.strength;
            let (fx, fy) = (dx * k, dy * k);

            dv[t].vx -= fx * link.bias;
            dv[t].vy -= fy * link.bias;
            dv[s].vx += fx * (1.0 - link.bias);
            dv[s].vy += fy * (1.0 - link.bias);
        }
    }

    /// Inverse-distance repulsion between all node pairs
    fn apply_many_body_force(&self, dv: &mut [Velocity]) {
        let n = self.positions.len();
        let dist_min_sq = self.config.charge_distance_min.powi(2).max(EPSILON);

        for i in 0..n {
            for j in (i + 1)..n {
                let (mut dx, mut dy) = (
                    self.positions[j].x - self.positions[i].x,
                    self.positions[j].y - self.positions[i].y,
                );
                if dx.abs() < EPSILON && dy.abs() < EPSILON {
                    (dx, dy) = nudge(i, j);
                }
                let dist_sq = (dx * dx + dy * dy).max(dist_min_sq);

                // Each node is pushed by the other's charge
                let wi = self.charges[j] * self.alpha / dist_sq;
                let wj = self.charges[i] * self.alpha / dist_sq;
                dv[i].vx += dx * wi;
                dv[i].vy += dy * wi;
                dv[j].vx -= dx * wj;
                dv[j].vy -= dy * wj;
            }
        }
    }

    /// Weak pull toward the viewport center
    fn apply_center_force(&self, dv: &mut [Velocity]) {
        let k = self.config.center_strength * self.alpha;
        for (pos, delta) in self.positions.iter().zip(dv.iter_mut()) {
            delta.vx += (self.center.x - pos.x) * k;
            delta.vy += (self.center.y - pos.y) * k;
        }
    }

    /// Push overlapping circles apart by displacing them directly
    fn apply_collisions(&mut self) {
        let n = self.positions.len();
        let mut dp = vec![LayoutPosition::default(); n];
        let mut any = false;

        for i in 0..n {
            for j in (i + 1)..n {
                let (pinned_i, pinned_j) = (self.pins[i].is_some(), self.pins[j].is_some());
                if pinned_i && pinned_j {
                    continue;
                }

                let min_dist = self.radii[i] + self.radii[j] + self.config.collision_margin;
                let (mut dx, mut dy) = (
                    self.positions[j].x - self.positions[i].x,
                    self.positions[j].y - self.positions[i].y,
                );
                if dx.abs() < EPSILON && dy.abs() < EPSILON {
                    (dx, dy) = nudge(i, j);
                }
                let dist = (dx * dx + dy * dy).sqrt().max(EPSILON);
                if dist >= min_dist {
                    continue;
                }

                let overlap = (min_dist - dist) / dist * self.config.collision_strength;
                // Larger nodes move less
                let (ri2, rj2) = (self.radii[i].powi(2), self.radii[j].powi(2));
                let (wi, wj) = if pinned_i {
                    (0.0, 1.0)
                } else if pinned_j {
                    (1.0, 0.0)
                } else {
                    (rj2 / (ri2 + rj2), ri2 / (ri2 + rj2))
                };

                dp[i].x -= dx * overlap * wi;
                dp[i].y -= dy * overlap * wi;
                dp[j].x += dx * overlap * wj;
                dp[j].y += dy * overlap * wj;
                any = true;
            }
        }

        if any {
            for (pos, delta) in self.positions.iter_mut().zip(&dp) {
                pos.x += delta.x;
                pos.y += delta.y;
            }
        }
    }

    /// Fix a node at `position` until [`unpin`](Self::unpin)
    pub fn pin(&mut self, id: &str, position: LayoutPosition) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.pins[i] = Some(position);
        self.positions[i] = position;
        self.velocities[i] = Velocity::default();
        true
    }

    /// Release a pinned node back to the forces
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.pins[i].take().is_some()
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.index
            .get(id)
            .is_some_and(|&i| self.pins[i].is_some())
    }

    /// Re-energize the simulation: alpha jumps to at least `alpha_target`
    /// and stays there until [`cool`](Self::cool)
    ///
    /// The run restarts with a fresh iteration budget.
    pub fn reheat(&mut self, alpha_target: f64) {
        self.alpha_target = alpha_target;
        if self.positions.is_empty() {
            return;
        }
        self.alpha = self.alpha.max(alpha_target);
        self.status = SimulationStatus::Running;
        self.iterations = 0;
    }

    /// Let alpha decay toward zero again
    ///
    /// A run that is still warm, or was cut off at the iteration cap, gets a
    /// fresh budget to settle in.
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
        if matches!(
            self.status,
            SimulationStatus::Running | SimulationStatus::IterationCapReached
        ) && !self.positions.is_empty()
        {
            self.status = SimulationStatus::Running;
            self.iterations = 0;
        }
    }

    /// Stop stepping; positions stay where they are
    pub fn stop(&mut self) {
        self.status = SimulationStatus::Stopped;
    }

    /// Run simulation to convergence (or max iterations)
    pub fn run_to_convergence(&mut self, max_iterations: usize) -> SimulationStatus {
        for _ in 0..max_iterations {
            if !self.is_running() {
                break;
            }
            self.tick();
        }
        self.status
    }
}

/// Deterministic tiny offset separating coincident nodes
fn nudge(i: usize, j: usize) -> (f64, f64) {
    // Golden angle spreads successive pairs around the circle
    let angle = (i * 31 + j * 17) as f64 * 2.399_963_229_728_653;
    (angle.cos() * 1e-3, angle.sin() * 1e-3)
}
