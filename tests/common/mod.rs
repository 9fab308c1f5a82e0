//! Test collaborators: a JSON model loader and a random-walk simulation
//! engine, both deterministic from the model seed.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use asmc::{
    EngineError, Environment, ModelBlueprint, ModelError, ModelLoader, NodeId, Observer,
    RunRequest, SimulationEngine,
};

/// Initial state of the walk model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkState {
    pub start: [f64; 2],
    pub drift: f64,
    pub jitter: f64,
}

/// Textual model format: `{"seed": u64, "start": [x, y], "drift": d, "jitter": j}`.
#[derive(Debug, Deserialize)]
struct WalkSpec {
    seed: u64,
    start: [f64; 2],
    drift: f64,
    jitter: f64,
}

/// Parses the JSON walk specification.
pub struct JsonLoader;

impl ModelLoader for JsonLoader {
    fn parse_and_build(&self, spec: &str) -> Result<ModelBlueprint, ModelError> {
        let spec: WalkSpec = serde_json::from_str(spec)
            .map_err(|e| ModelError::new(format!("malformed walk specification: {e}")))?;
        let state = WalkState {
            start: spec.start,
            drift: spec.drift,
            jitter: spec.jitter,
        };
        let initial_state = serde_json::to_vec(&state)
            .map_err(|e| ModelError::new(format!("state serialization failed: {e}")))?;
        Ok(ModelBlueprint {
            initial_state,
            seed: spec.seed,
        })
    }
}

/// Environment of one walk run: node 0 walking along the x axis.
struct WalkEnv {
    time: f64,
    pos: [f64; 2],
}

impl Environment for WalkEnv {
    fn time(&self) -> f64 {
        self.time
    }

    fn position_of(&self, node: NodeId) -> Option<[f64; 2]> {
        (node == 0).then_some(self.pos)
    }
}

/// Simulates one node drifting along the x axis with seeded jitter.
///
/// `step_delay` throttles every step; cancellation tests use it to keep
/// runs in flight long enough to observe the stop signal.
pub struct WalkEngine {
    pub step_delay: Option<Duration>,
}

impl WalkEngine {
    pub fn fast() -> Self {
        Self { step_delay: None }
    }

    pub fn throttled(delay: Duration) -> Self {
        Self {
            step_delay: Some(delay),
        }
    }
}

impl SimulationEngine for WalkEngine {
    fn run_instance(
        &self,
        request: RunRequest<'_>,
        observer: &mut dyn Observer,
    ) -> Result<(), EngineError> {
        let state: WalkState = serde_json::from_slice(request.initial_state)
            .map_err(|e| EngineError::new(format!("corrupt initial state: {e}")))?;
        let mut rng = ChaCha8Rng::seed_from_u64(request.seed);
        let mut env = WalkEnv {
            time: 0.0,
            pos: state.start,
        };

        observer.initialized(&env);
        let mut step = 0;
        while step < request.step_limit {
            if request.stop.load(Ordering::SeqCst) {
                break;
            }
            step += 1;
            env.time = step as f64;
            if env.time > request.time_limit {
                break;
            }
            env.pos[0] += state.drift + state.jitter * (rng.gen::<f64>() * 2.0 - 1.0);
            observer.step_done(&env, step);
            if !observer.can_change() {
                break;
            }
            if let Some(delay) = self.step_delay {
                thread::sleep(delay);
            }
        }
        observer.finished(&env, step);
        Ok(())
    }
}

/// Engine that fails every run.
pub struct BrokenEngine;

impl SimulationEngine for BrokenEngine {
    fn run_instance(
        &self,
        _request: RunRequest<'_>,
        _observer: &mut dyn Observer,
    ) -> Result<(), EngineError> {
        Err(EngineError::new("solver diverged"))
    }
}

/// Walk specification with a strong drift toward positive x.
pub fn drifting_spec(seed: u64) -> String {
    format!(
        r#"{{"seed": {seed}, "start": [0.0, 0.5], "drift": 1.0, "jitter": 0.1}}"#
    )
}

/// Walk specification with pure jitter and no drift.
pub fn diffusing_spec(seed: u64) -> String {
    format!(
        r#"{{"seed": {seed}, "start": [0.0, 0.5], "drift": 0.0, "jitter": 1.0}}"#
    )
}
