//! One simulation at a time, stepped once per frame
//!
//! Starting a run hands out a [`SimulationToken`]. Only the holder of the
//! current token can step or stop the run; a token from a superseded run is
//! stale and every call made with it is a no-op.

use tracing::{debug, trace};

use crate::config::{RadiusConfig, SimulationConfig};
use crate::model::GraphModel;
use crate::simulation::{ForceLayoutEngine, LayoutPosition, SimulationStatus};

/// Handle to one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationToken(u64);

impl SimulationToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Result of stepping with a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The run ticked (or was already settled) and reports its status
    Stepped(SimulationStatus),
    /// The token no longer names the live run; nothing was written
    Stale,
}

/// Owner of the live [`ForceLayoutEngine`]
pub struct FrameScheduler {
    simulation: SimulationConfig,
    radius: RadiusConfig,
    generation: u64,
    active: Option<ForceLayoutEngine>,
}

impl FrameScheduler {
    pub fn new(simulation: SimulationConfig, radius: RadiusConfig) -> Self {
        Self {
            simulation,
            radius,
            generation: 0,
            active: None,
        }
    }

    /// Discard any prior run and start a new one over `model`
    pub fn start(&mut self, model: &GraphModel, center: LayoutPosition) -> SimulationToken {
        if let Some(mut previous) = self.active.take() {
            previous.stop();
            debug!(generation = self.generation, "superseded simulation discarded");
        }

        self.generation += 1;
        self.active = Some(ForceLayoutEngine::new(
            model,
            &self.simulation,
            &self.radius,
            center,
        ));
        debug!(
            generation = self.generation,
            nodes = model.nodes().len(),
            edges = model.edges().len(),
            "simulation started"
        );
        SimulationToken(self.generation)
    }

    /// Token of the live run, if any
    pub fn current(&self) -> Option<SimulationToken> {
        self.active.as_ref().map(|_| SimulationToken(self.generation))
    }

    pub fn is_current(&self, token: SimulationToken) -> bool {
        self.active.is_some() && token.0 == self.generation
    }

    /// Advance the run named by `token` by one tick
    pub fn step(&mut self, token: SimulationToken) -> StepOutcome {
        match self.engine_mut(token) {
            Some(engine) => StepOutcome::Stepped(engine.tick()),
            None => {
                trace!(generation = token.0, "ignoring step from stale simulation");
                StepOutcome::Stale
            }
        }
    }

    /// Dispose of the run named by `token`; false if it was stale
    pub fn stop(&mut self, token: SimulationToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        if let Some(mut engine) = self.active.take() {
            engine.stop();
            debug!(generation = token.0, "simulation stopped");
        }
        true
    }

    /// Live run, for reading positions
    pub fn engine(&self) -> Option<&ForceLayoutEngine> {
        self.active.as_ref()
    }

    /// Live run for writing, only through its current token
    pub fn engine_mut(&mut self, token: SimulationToken) -> Option<&mut ForceLayoutEngine> {
        if token.0 != self.generation {
            return None;
        }
        self.active.as_mut()
    }
}
