//! Agent/environment interaction interface.

mod anm6;
pub mod model;
pub mod state;

pub use anm6::Anm6;
pub use model::{Action, GridModel, TraceModel};
pub use state::GridState;

use std::path::Path;

use crate::render::history::RenderHistory;
use crate::render::{RenderError, RenderMode};

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Flattened observation of the new state.
    pub observation: Vec<f64>,
    /// Total energy loss over the step.
    pub e_loss: f64,
    /// Constraint-violation penalty over the step.
    pub penalty: f64,
    /// Whether the episode has terminated.
    pub done: bool,
}

/// The standard agent/environment interaction interface.
pub trait Environment {
    /// Starts a new episode and returns the initial observation.
    fn reset(&mut self) -> Vec<f64>;

    /// Applies an action, advances one time step, and returns the outcome.
    fn step(&mut self, action: &Action) -> StepOutcome;

    /// Renders the current state.
    ///
    /// The first call fixes the rendering mode for the episode; later calls
    /// reuse it and ignore `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the visualization backend cannot be
    /// brought up.
    fn render(&mut self, mode: RenderMode) -> Result<(), RenderError>;

    /// Re-drives a previously saved state history through the live rendering
    /// path, then closes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Parse`] if the file is malformed, or
    /// [`RenderError::Io`] on file or backend failures.
    fn replay(&mut self, path: &Path) -> Result<(), RenderError>;

    /// Stops rendering. In save mode, flushes the accumulated history to
    /// `path` and returns it; in other modes (or when rendering never
    /// started) returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingPath`] in save mode without a path.
    fn close(&mut self, path: Option<&Path>) -> Result<Option<RenderHistory>, RenderError>;
}
