//! Consumed external interfaces: model loading and simulation execution.
//!
//! The checker core neither parses model specifications nor simulates
//! anything itself. It consumes these two seams:
//!
//! - a [`ModelLoader`] turns a textual model specification into a
//!   [`ModelBlueprint`] exactly once per session;
//! - a [`SimulationEngine`] executes one run from a private copy of the
//!   blueprint state, driving the run's [`Observer`](crate::property::Observer).

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::property::Observer;

/// Executable, serializable snapshot of a parsed model.
///
/// `initial_state` is an opaque serialized byte buffer; every run
/// deserializes its own private copy, so no state is ever aliased between
/// runs. `seed` is the model's configured master seed: the entire session
/// is reproducible from this one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelBlueprint {
    /// Canonical serialized initial state.
    pub initial_state: Vec<u8>,
    /// Master seed configured by the model.
    pub seed: u64,
}

/// Error raised by a model loader for a malformed specification.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ModelError {
    /// Human-readable description of the defect.
    pub message: String,
}

impl ModelError {
    /// Creates a model error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses a textual model specification into an executable blueprint.
///
/// Implemented by the surrounding system; a session invokes it exactly
/// once, and a failure here is fatal to the session.
pub trait ModelLoader: Send + Sync {
    /// Parses and builds the model.
    fn parse_and_build(&self, spec: &str) -> Result<ModelBlueprint, ModelError>;
}

/// Error raised by a simulation engine for a failed run.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl EngineError {
    /// Creates an engine error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything one simulation run needs.
pub struct RunRequest<'a> {
    /// The canonical serialized initial state; the engine must deserialize
    /// its own private copy and never mutate the shared buffer.
    pub initial_state: &'a [u8],
    /// Seed for this run's pseudorandom engine.
    pub seed: u64,
    /// Maximum run length in steps.
    pub step_limit: u64,
    /// Maximum run length in simulated time units.
    pub time_limit: f64,
    /// External stop signal. Set when the session is cancelled; the engine
    /// must end the run promptly once it observes the flag.
    pub stop: &'a AtomicBool,
}

/// Executes single simulation runs.
///
/// Contract, per run: deserialize a private state copy from
/// `request.initial_state`; call [`Observer::initialized`] once, then
/// [`Observer::step_done`] after every step; end the run at
/// `request.step_limit` / `request.time_limit`, when
/// [`Observer::can_change`] turns false, or when `request.stop` is set;
/// finally call [`Observer::finished`]. Blocks until the run ends.
pub trait SimulationEngine: Send + Sync {
    /// Executes one run to completion.
    fn run_instance(
        &self,
        request: RunRequest<'_>,
        observer: &mut dyn Observer,
    ) -> Result<(), EngineError>;
}
