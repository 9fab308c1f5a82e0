//! Sequential-sampling controller.
//!
//! The [`AsmcEngine`] owns a whole checking session: it parses the model
//! once, dispatches adaptive batches of independent simulation runs to a
//! bounded worker pool, waits on the per-batch barrier, and delegates the
//! stop decision and listener notification to its stopping rule. Sessions
//! are single-use: construct, `execute`, then read the result.
//!
//! Workers never touch shared state; each run hands its finished property
//! back over a channel and the driver thread is the sole writer into the
//! sample set.

mod strategy;
mod worker;

pub use strategy::{BatchListener, StopRule};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::aggregate::Aggregator;
use crate::error::{AsmcError, AsmcResult, ExecutionError, ValidationError};
use crate::model::{ModelLoader, SimulationEngine};
use crate::property::Property;
use crate::sample::{Sample, SampleSet, SampleValue};
use crate::stats::{initial_sample_size, static_sample_size_ub};

use worker::{RunContext, RunJob, RunOutcome, WorkerPool};

/// Fixed batch growth after the initial batch.
pub const SAMPLE_STEP: usize = 30;

/// Stable identifier for a checking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Creates a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable statistical parameters of a session.
///
/// `max_n` always comes from the static bound alone, since it is the only
/// bound with a distribution-free correctness guarantee; `min_n` is the
/// smaller of the static bound and the dynamic-bound-implied minimum,
/// unless explicitly overridden. Invariant: `min_n <= max_n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceParameters {
    delta: f64,
    alpha: f64,
    min_n: usize,
    max_n: usize,
}

impl ConfidenceParameters {
    /// Derives both sample sizes from `delta` and `alpha`.
    pub fn derive(delta: f64, alpha: f64) -> Result<Self, ValidationError> {
        Self::validate(delta, alpha)?;
        let max_n = static_sample_size_ub(delta, alpha);
        let mut min_n = initial_sample_size(delta, alpha).min(max_n);
        if max_n >= 2 {
            // Keep every spread estimate defined from the first barrier on.
            min_n = min_n.max(2);
        }
        Ok(Self {
            delta,
            alpha,
            min_n,
            max_n,
        })
    }

    /// Derives `max_n` but imposes an explicit minimum sample size.
    pub fn with_min(delta: f64, alpha: f64, min_n: usize) -> Result<Self, ValidationError> {
        Self::validate(delta, alpha)?;
        let max_n = static_sample_size_ub(delta, alpha);
        let min_n = min_n.max(1);
        if min_n > max_n {
            return Err(ValidationError::MinExceedsMax { min_n, max_n });
        }
        Ok(Self {
            delta,
            alpha,
            min_n,
            max_n,
        })
    }

    fn validate(delta: f64, alpha: f64) -> Result<(), ValidationError> {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(ValidationError::DeltaOutOfRange { value: delta });
        }
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(ValidationError::AlphaOutOfRange { value: alpha });
        }
        Ok(())
    }

    /// Target confidence-interval half-width.
    #[must_use]
    pub const fn delta(&self) -> f64 {
        self.delta
    }

    /// Confidence risk.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Initial batch size.
    #[must_use]
    pub const fn min_n(&self) -> usize {
        self.min_n
    }

    /// Worst-case sample cap.
    #[must_use]
    pub const fn max_n(&self) -> usize {
        self.max_n
    }
}

/// Terminal state of a session.
#[derive(Debug, Clone)]
enum SessionOutcome {
    Completed,
    Cancelled,
    Failed(AsmcError),
}

impl SessionOutcome {
    fn into_result(self) -> AsmcResult<()> {
        match self {
            Self::Completed => Ok(()),
            Self::Cancelled => Err(ExecutionError::Cancelled.into()),
            Self::Failed(err) => Err(err),
        }
    }
}

/// One-shot completion cell observable by any number of waiters.
///
/// Replaces a single-permit signal: it is set exactly once, on every exit
/// path including setup failure and cancellation, and carries the outcome.
struct Completion {
    slot: Mutex<Option<SessionOutcome>>,
    done: Condvar,
}

impl Completion {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn set(&self, outcome: SessionOutcome) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(outcome);
            self.done.notify_all();
        }
    }

    fn wait(&self) -> SessionOutcome {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Collaborators consumed exactly once, when the driver thread starts.
struct SessionSeed<R> {
    prototype: Sample<R>,
    loader: Arc<dyn ModelLoader>,
    engine: Arc<dyn SimulationEngine>,
    workers: usize,
}

/// Builder for [`AsmcEngine`].
///
/// `delta`, `alpha`, the property prototype, the aggregator, the model
/// loader and the simulation engine are required; the minimum sample size
/// and the worker count are optional.
pub struct AsmcBuilder<R> {
    rule: StopRule,
    delta: Option<f64>,
    alpha: Option<f64>,
    min_n: Option<usize>,
    property: Option<Sample<R>>,
    aggregator: Option<Arc<dyn Aggregator<R>>>,
    loader: Option<Arc<dyn ModelLoader>>,
    engine: Option<Arc<dyn SimulationEngine>>,
    workers: Option<usize>,
}

impl<R: SampleValue> AsmcBuilder<R> {
    /// Creates a builder for the given stopping rule.
    #[must_use]
    pub fn new(rule: StopRule) -> Self {
        Self {
            rule,
            delta: None,
            alpha: None,
            min_n: None,
            property: None,
            aggregator: None,
            loader: None,
            engine: None,
            workers: None,
        }
    }

    /// Target confidence-interval half-width.
    #[must_use]
    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Confidence risk.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Overrides the derived minimum sample size. The worst-case cap is
    /// unaffected.
    #[must_use]
    pub fn min_samples(mut self, min_n: usize) -> Self {
        self.min_n = Some(min_n);
        self
    }

    /// Property prototype cloned into every run.
    #[must_use]
    pub fn property<P>(mut self, property: P) -> Self
    where
        P: Property<Output = R> + 'static,
    {
        self.property = Some(Box::new(property));
        self
    }

    /// Result aggregator.
    #[must_use]
    pub fn aggregator<A>(mut self, aggregator: A) -> Self
    where
        A: Aggregator<R> + 'static,
    {
        self.aggregator = Some(Arc::new(aggregator));
        self
    }

    /// Model loader collaborator.
    #[must_use]
    pub fn loader<L>(mut self, loader: L) -> Self
    where
        L: ModelLoader + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Simulation engine collaborator.
    #[must_use]
    pub fn engine<E>(mut self, engine: E) -> Self
    where
        E: SimulationEngine + 'static,
    {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Worker pool size; defaults to the available hardware parallelism.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Validates the configuration and builds the session.
    pub fn build(self) -> AsmcResult<AsmcEngine<R>> {
        fn required<T>(value: Option<T>, field: &str) -> AsmcResult<T> {
            value.ok_or_else(|| {
                ValidationError::MissingField {
                    field: field.to_string(),
                }
                .into()
            })
        }

        let delta = required(self.delta, "delta")?;
        let alpha = required(self.alpha, "alpha")?;
        let property = required(self.property, "property")?;
        let aggregator = required(self.aggregator, "aggregator")?;
        let loader = required(self.loader, "loader")?;
        let engine = required(self.engine, "engine")?;

        let params = match self.min_n {
            Some(min_n) => ConfidenceParameters::with_min(delta, alpha, min_n)?,
            None => ConfidenceParameters::derive(delta, alpha)?,
        };

        if self.rule == StopRule::Numeric && !aggregator.estimates_spread() {
            return Err(ValidationError::SpreadRequired {
                rule: self.rule.name().to_string(),
            }
            .into());
        }

        let workers = self
            .workers
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, usize::from));

        Ok(AsmcEngine {
            session_id: SessionId::new(),
            params,
            rule: self.rule,
            aggregator,
            samples: Arc::new(RwLock::new(SampleSet::new())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            n_target: Arc::new(AtomicUsize::new(0)),
            cancel: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            completion: Arc::new(Completion::new()),
            seed: Mutex::new(Some(SessionSeed {
                prototype: property,
                loader,
                engine,
                workers,
            })),
            driver: Mutex::new(None),
        })
    }
}

/// Approximate statistical model checker: one single-use sampling session.
///
/// Dropping the engine joins the driver thread, so a drop while a session
/// is still sampling blocks until the session's own stopping rule fires;
/// call [`AsmcEngine::cancel`] first for prompt teardown.
pub struct AsmcEngine<R> {
    session_id: SessionId,
    params: ConfidenceParameters,
    rule: StopRule,
    aggregator: Arc<dyn Aggregator<R>>,
    samples: Arc<RwLock<SampleSet<R>>>,
    listeners: Arc<Mutex<Vec<Box<dyn BatchListener>>>>,
    n_target: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
    started: AtomicBool,
    completion: Arc<Completion>,
    seed: Mutex<Option<SessionSeed<R>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<R> fmt::Debug for AsmcEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsmcEngine")
            .field("session_id", &self.session_id)
            .field("params", &self.params)
            .field("rule", &self.rule)
            .field("n_target", &self.n_target)
            .field("cancel", &self.cancel)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<R: SampleValue> AsmcEngine<R> {
    /// Starts building a session with the given stopping rule.
    #[must_use]
    pub fn builder(rule: StopRule) -> AsmcBuilder<R> {
        AsmcBuilder::new(rule)
    }

    /// Starts the session asynchronously on a dedicated driver thread.
    ///
    /// Non-blocking. Each session is single-use: a second invocation
    /// returns [`ExecutionError::AlreadyStarted`].
    pub fn execute(&self, model_spec: &str, step_limit: u64, time_limit: f64) -> AsmcResult<()> {
        let seed = self
            .seed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ExecutionError::AlreadyStarted)?;
        self.started.store(true, Ordering::SeqCst);

        info!(
            session = %self.session_id,
            rule = %self.rule,
            delta = self.params.delta(),
            alpha = self.params.alpha(),
            min_n = self.params.min_n(),
            max_n = self.params.max_n(),
            "session started"
        );

        let ctx = DriverCtx {
            session_id: self.session_id,
            params: self.params,
            rule: self.rule,
            aggregator: Arc::clone(&self.aggregator),
            samples: Arc::clone(&self.samples),
            listeners: Arc::clone(&self.listeners),
            n_target: Arc::clone(&self.n_target),
            cancel: Arc::clone(&self.cancel),
            completion: Arc::clone(&self.completion),
            prototype: seed.prototype,
            loader: seed.loader,
            engine: seed.engine,
            workers: seed.workers,
            model_spec: model_spec.to_string(),
            step_limit,
            time_limit,
        };

        let handle = thread::Builder::new()
            .name("asmc-driver".to_string())
            .spawn(move || drive(ctx))
            .expect("failed to spawn asmc driver");
        *self.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Blocks until the session's sequential loop has terminated.
    ///
    /// Any number of threads may wait; all of them observe the same
    /// outcome, including setup failures and cancellation.
    pub fn wait_for_completion(&self) -> AsmcResult<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(ExecutionError::NotStarted.into());
        }
        self.completion.wait().into_result()
    }

    /// Waits for completion, then aggregates the final sample set.
    pub fn result(&self) -> AsmcResult<f64> {
        self.wait_for_completion()?;
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        Ok(self.aggregator.aggregate(&samples))
    }

    /// Requests cancellation: in-flight runs observe the stop signal, no
    /// further batch is dispatched, and every waiter is released with a
    /// cancelled status.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Registers a listener notified after every batch; notification
    /// content is defined by the stopping rule.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: BatchListener + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Sample-size target so far. May reflect an in-progress batch.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n_target.load(Ordering::SeqCst)
    }

    /// Number of runs completed so far.
    #[must_use]
    pub fn samples_completed(&self) -> usize {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Minimum sample size, whether derived or imposed.
    #[must_use]
    pub const fn min_n(&self) -> usize {
        self.params.min_n()
    }

    /// Worst-case sample cap from the static bound.
    #[must_use]
    pub const fn max_n(&self) -> usize {
        self.params.max_n()
    }

    /// Target confidence-interval half-width.
    #[must_use]
    pub const fn delta(&self) -> f64 {
        self.params.delta()
    }

    /// Confidence risk.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.params.alpha()
    }

    /// The statistical parameters of this session.
    #[must_use]
    pub const fn parameters(&self) -> ConfidenceParameters {
        self.params
    }

    /// The stopping rule of this session.
    #[must_use]
    pub const fn rule(&self) -> StopRule {
        self.rule
    }

    /// The aggregator in use.
    #[must_use]
    pub fn aggregator(&self) -> &dyn Aggregator<R> {
        self.aggregator.as_ref()
    }

    /// This session's identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }
}

impl<R> Drop for AsmcEngine<R> {
    fn drop(&mut self) {
        let handle = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

/// Everything the driver thread owns.
struct DriverCtx<R> {
    session_id: SessionId,
    params: ConfidenceParameters,
    rule: StopRule,
    aggregator: Arc<dyn Aggregator<R>>,
    samples: Arc<RwLock<SampleSet<R>>>,
    listeners: Arc<Mutex<Vec<Box<dyn BatchListener>>>>,
    n_target: Arc<AtomicUsize>,
    cancel: Arc<AtomicBool>,
    completion: Arc<Completion>,
    prototype: Sample<R>,
    loader: Arc<dyn ModelLoader>,
    engine: Arc<dyn SimulationEngine>,
    workers: usize,
    model_spec: String,
    step_limit: u64,
    time_limit: f64,
}

/// Driver thread body: steps 1-6 of the sequential loop.
fn drive<R: SampleValue>(ctx: DriverCtx<R>) {
    // Step 1: parse and build the model exactly once.
    let blueprint = match ctx.loader.parse_and_build(&ctx.model_spec) {
        Ok(blueprint) => blueprint,
        Err(err) => {
            error!(session = %ctx.session_id, error = %err, "model setup failed");
            ctx.completion.set(SessionOutcome::Failed(
                ExecutionError::Setup {
                    message: err.to_string(),
                }
                .into(),
            ));
            return;
        }
    };

    // The whole session replays from this one seed.
    let mut master = ChaCha8Rng::seed_from_u64(blueprint.seed);

    let run_ctx = Arc::new(RunContext {
        initial_state: blueprint.initial_state,
        step_limit: ctx.step_limit,
        time_limit: ctx.time_limit,
        stop: Arc::clone(&ctx.cancel),
    });

    // Results never outnumber the largest batch, so workers never block
    // on the return path even if the driver has stopped collecting.
    let capacity = ctx.params.min_n().max(SAMPLE_STEP);
    let (results_tx, results_rx) = bounded::<RunOutcome<R>>(capacity);
    let pool = WorkerPool::start(ctx.workers, Arc::clone(&ctx.engine), run_ctx, results_tx);

    let outcome = match run_batches(&ctx, &pool, &results_rx, &mut master) {
        Ok(()) => SessionOutcome::Completed,
        Err(outcome) => outcome,
    };

    // Step 6: release worker resources, then signal completion once.
    pool.shutdown();
    match &outcome {
        SessionOutcome::Completed => {
            info!(
                session = %ctx.session_id,
                n = ctx.n_target.load(Ordering::SeqCst),
                "session complete"
            );
        }
        SessionOutcome::Cancelled => {
            info!(session = %ctx.session_id, "session cancelled");
        }
        SessionOutcome::Failed(err) => {
            error!(session = %ctx.session_id, error = %err, "session failed");
        }
    }
    ctx.completion.set(outcome);
}

/// Steps 2-5: dispatch, barrier, notify, stop decision, repeat.
fn run_batches<R: SampleValue>(
    ctx: &DriverCtx<R>,
    pool: &WorkerPool<R>,
    results_rx: &Receiver<RunOutcome<R>>,
    master: &mut ChaCha8Rng,
) -> Result<(), SessionOutcome> {
    let mut batch = ctx.params.min_n();
    ctx.n_target.store(batch, Ordering::SeqCst);

    loop {
        dispatch_and_collect(ctx, pool, results_rx, master, batch)?;

        // The barrier for this batch has passed: the set is stable.
        {
            let samples = ctx.samples.read().unwrap_or_else(PoisonError::into_inner);
            let mut listeners = ctx
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            strategy::notify_listeners(ctx.rule, &samples, &mut listeners);

            let stop =
                strategy::should_stop(ctx.rule, &samples, ctx.aggregator.as_ref(), &ctx.params)
                    .map_err(SessionOutcome::Failed)?;
            if stop {
                return Ok(());
            }
        }

        if ctx.cancel.load(Ordering::SeqCst) {
            return Err(SessionOutcome::Cancelled);
        }

        batch = SAMPLE_STEP;
        ctx.n_target.fetch_add(SAMPLE_STEP, Ordering::SeqCst);
        debug!(
            session = %ctx.session_id,
            n_target = ctx.n_target.load(Ordering::SeqCst),
            "dispatching further batch"
        );
    }
}

/// Dispatches one batch and blocks on its completion barrier.
fn dispatch_and_collect<R: SampleValue>(
    ctx: &DriverCtx<R>,
    pool: &WorkerPool<R>,
    results_rx: &Receiver<RunOutcome<R>>,
    master: &mut ChaCha8Rng,
    count: usize,
) -> Result<(), SessionOutcome> {
    for _ in 0..count {
        let job = RunJob {
            observer: ctx.prototype.clone_prototype(),
            seed: master.next_u64(),
        };
        if !pool.dispatch(job) {
            return Err(SessionOutcome::Failed(ExecutionError::Disconnected.into()));
        }
    }

    for _ in 0..count {
        match results_rx.recv() {
            Ok(Ok(sample)) => {
                // Sole writer: completed samples enter in completion order.
                ctx.samples
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(sample);
            }
            Ok(Err(err)) => {
                return Err(SessionOutcome::Failed(
                    ExecutionError::RunFailed {
                        message: err.to_string(),
                    }
                    .into(),
                ));
            }
            Err(_) => {
                return Err(SessionOutcome::Failed(ExecutionError::Disconnected.into()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{EventProbability, EventProbabilityVariance};
    use crate::model::{EngineError, ModelBlueprint, ModelError, RunRequest};
    use crate::property::{And, Observer};

    struct NullLoader;

    impl ModelLoader for NullLoader {
        fn parse_and_build(&self, _spec: &str) -> Result<ModelBlueprint, ModelError> {
            Ok(ModelBlueprint {
                initial_state: Vec::new(),
                seed: 0,
            })
        }
    }

    struct NullEngine;

    impl SimulationEngine for NullEngine {
        fn run_instance(
            &self,
            _request: RunRequest<'_>,
            _observer: &mut dyn Observer,
        ) -> Result<(), EngineError> {
            Ok(())
        }
    }

    #[test]
    fn derived_parameters_match_known_bounds() {
        let params = ConfidenceParameters::derive(0.1, 0.05).unwrap();
        assert_eq!(params.max_n(), 185);
        assert!(params.min_n() <= 185);
        assert!(params.min_n() >= 2);
    }

    #[test]
    fn explicit_minimum_overrides_but_respects_the_cap() {
        let params = ConfidenceParameters::with_min(0.1, 0.05, 50).unwrap();
        assert_eq!(params.min_n(), 50);
        assert_eq!(params.max_n(), 185);

        let err = ConfidenceParameters::with_min(0.1, 0.05, 500).unwrap_err();
        assert!(matches!(err, ValidationError::MinExceedsMax { .. }));
    }

    #[test]
    fn parameters_reject_bad_inputs() {
        assert!(ConfidenceParameters::derive(0.0, 0.05).is_err());
        assert!(ConfidenceParameters::derive(-0.1, 0.05).is_err());
        assert!(ConfidenceParameters::derive(0.1, 0.0).is_err());
        assert!(ConfidenceParameters::derive(0.1, 1.0).is_err());
        assert!(ConfidenceParameters::derive(f64::NAN, 0.05).is_err());
    }

    #[test]
    fn builder_requires_all_collaborators() {
        let err = AsmcEngine::<bool>::builder(StopRule::Boolean)
            .delta(0.1)
            .alpha(0.05)
            .build()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn numeric_rule_rejects_spreadless_aggregator() {
        let err = AsmcEngine::<bool>::builder(StopRule::Numeric)
            .delta(0.1)
            .alpha(0.05)
            .property(And::new())
            .aggregator(EventProbability)
            .loader(NullLoader)
            .engine(NullEngine)
            .build()
            .unwrap_err();
        let AsmcError::Validation(ValidationError::SpreadRequired { rule }) = err else {
            panic!("expected SpreadRequired, got {err:?}");
        };
        assert_eq!(rule, "numeric");
    }

    #[test]
    fn waiting_before_execute_is_an_error() {
        let engine = AsmcEngine::<bool>::builder(StopRule::Boolean)
            .delta(0.1)
            .alpha(0.05)
            .property(And::new())
            .aggregator(EventProbabilityVariance)
            .loader(NullLoader)
            .engine(NullEngine)
            .build()
            .unwrap();
        let err = engine.wait_for_completion().unwrap_err();
        assert!(matches!(
            err,
            AsmcError::Execution(ExecutionError::NotStarted)
        ));
    }

    #[test]
    fn execute_is_single_use() {
        let engine = AsmcEngine::<bool>::builder(StopRule::Boolean)
            .delta(0.1)
            .alpha(0.05)
            .property(And::new())
            .aggregator(EventProbabilityVariance)
            .loader(NullLoader)
            .engine(NullEngine)
            .build()
            .unwrap();

        engine.execute("model", 10, 1.0).unwrap();
        let err = engine.execute("model", 10, 1.0).unwrap_err();
        assert!(matches!(
            err,
            AsmcError::Execution(ExecutionError::AlreadyStarted)
        ));
        engine.wait_for_completion().unwrap();
    }

    #[test]
    fn completion_cell_releases_every_waiter() {
        let completion = Arc::new(Completion::new());
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let completion = Arc::clone(&completion);
            waiters.push(thread::spawn(move || completion.wait()));
        }
        completion.set(SessionOutcome::Cancelled);
        for waiter in waiters {
            assert!(matches!(waiter.join().unwrap(), SessionOutcome::Cancelled));
        }
    }

    #[test]
    fn completion_cell_keeps_the_first_outcome() {
        let completion = Completion::new();
        completion.set(SessionOutcome::Completed);
        completion.set(SessionOutcome::Cancelled);
        assert!(matches!(completion.wait(), SessionOutcome::Completed));
    }
}
