//! # ASMC - Approximate Statistical Model Checking
//!
//! ASMC answers "what fraction of simulation runs satisfy property P, to
//! within precision delta and confidence alpha?" by running many
//! independent stochastic simulations in parallel, evaluating a property
//! on each, and stopping as soon as a statistically valid confidence
//! interval narrow enough has been achieved (or a worst-case sample-size
//! bound is hit).
//!
//! ## Core Concepts
//!
//! - **Property**: a per-run predicate or metric, re-evaluated every
//!   simulation step, frozen into a terminal result when the run ends
//! - **Observation**: one atomic measured condition inside a property
//! - **Aggregator**: a stateless reducer over the growing sample set
//! - **Stop rule**: decides after every batch whether the confidence
//!   interval is already narrow enough
//!
//! ## Usage
//!
//! ```rust,ignore
//! use asmc::{AsmcEngine, EventProbabilityVariance, OrEventually, StopRule};
//!
//! let engine = AsmcEngine::builder(StopRule::Boolean)
//!     .delta(0.05)
//!     .alpha(0.05)
//!     .property(reaches_goal) // an OrEventually over user observations
//!     .aggregator(EventProbabilityVariance)
//!     .loader(my_model_loader)
//!     .engine(my_simulation_engine)
//!     .build()?;
//!
//! engine.execute(&model_spec, 100_000, 300.0)?;
//! let probability = engine.result()?;
//! ```
//!
//! The simulation engine and the model loader are external collaborators,
//! consumed through the [`model::SimulationEngine`] and
//! [`model::ModelLoader`] traits.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

// Leaves: observations, properties, samples, aggregation, statistics
pub mod aggregate;
pub mod error;
pub mod observe;
pub mod property;
pub mod sample;
pub mod stats;

// External collaborator seams
pub mod model;

// The sequential-sampling controller
pub mod checker;

// Re-export primary types at crate root for convenience
pub use aggregate::{Aggregator, EventProbability, EventProbabilityVariance, MeanAggregator};
pub use checker::{
    AsmcBuilder, AsmcEngine, BatchListener, ConfidenceParameters, SessionId, StopRule,
    SAMPLE_STEP,
};
pub use error::{AsmcError, AsmcResult, ExecutionError, ValidationError};
pub use model::{EngineError, ModelBlueprint, ModelError, ModelLoader, RunRequest, SimulationEngine};
pub use observe::{Environment, NodeId, NodesInArea, Observation};
pub use property::{And, AndEventually, FinalTime, ObservationPool, Observer, OrEventually, Property};
pub use sample::{Sample, SampleSet, SampleValue};
pub use stats::{
    dynamic_bound, initial_sample_size, minimum_sample_size, static_bound, static_confidence_ub,
    static_sample_size_ub,
};
