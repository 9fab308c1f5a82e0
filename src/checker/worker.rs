//! Bounded worker pool executing simulation runs.
//!
//! The driver dispatches one job per run over a bounded channel (blocking
//! on backpressure once the pool is saturated) and collects finished
//! samples over a result channel, which doubles as the per-batch barrier:
//! the driver simply receives exactly as many results as it dispatched.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::model::{EngineError, RunRequest, SimulationEngine};
use crate::sample::Sample;

/// Read-only per-session run parameters shared by all workers.
pub(crate) struct RunContext {
    /// Canonical serialized initial state; never mutated after session start.
    pub initial_state: Vec<u8>,
    /// Maximum run length in steps.
    pub step_limit: u64,
    /// Maximum run length in simulated time units.
    pub time_limit: f64,
    /// Session stop signal, shared with `cancel()`.
    pub stop: Arc<AtomicBool>,
}

/// One dispatched simulation run.
pub(crate) struct RunJob<R> {
    /// Fresh prototype clone; becomes the run's sample on completion.
    pub observer: Sample<R>,
    /// Seed for the run's pseudorandom engine.
    pub seed: u64,
}

/// What a worker hands back for one run.
pub(crate) type RunOutcome<R> = Result<Sample<R>, EngineError>;

pub(crate) struct WorkerPool<R> {
    jobs_tx: Sender<RunJob<R>>,
    handles: Vec<JoinHandle<()>>,
}

impl<R: 'static> WorkerPool<R> {
    /// Starts `workers` named threads draining the job queue.
    pub fn start(
        workers: usize,
        engine: Arc<dyn SimulationEngine>,
        ctx: Arc<RunContext>,
        results_tx: Sender<RunOutcome<R>>,
    ) -> Self {
        let workers = workers.max(1);
        let (jobs_tx, jobs_rx) = bounded::<RunJob<R>>(workers * 2);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let jobs_rx: Receiver<RunJob<R>> = jobs_rx.clone();
            let results_tx = results_tx.clone();
            let engine = Arc::clone(&engine);
            let ctx = Arc::clone(&ctx);
            let handle = thread::Builder::new()
                .name(format!("asmc-worker-{idx}"))
                .spawn(move || {
                    while let Ok(job) = jobs_rx.recv() {
                        let mut observer = job.observer;
                        let request = RunRequest {
                            initial_state: &ctx.initial_state,
                            seed: job.seed,
                            step_limit: ctx.step_limit,
                            time_limit: ctx.time_limit,
                            stop: &ctx.stop,
                        };
                        let outcome = engine
                            .run_instance(request, &mut observer)
                            .map(|()| observer);
                        if results_tx.send(outcome).is_err() {
                            // Driver is gone; nothing left to report to.
                            break;
                        }
                    }
                })
                .expect("failed to spawn asmc worker");
            handles.push(handle);
        }

        Self { jobs_tx, handles }
    }

    /// Queues one run, blocking while the pool is saturated.
    ///
    /// Returns false if the workers are gone.
    pub fn dispatch(&self, job: RunJob<R>) -> bool {
        self.jobs_tx.send(job).is_ok()
    }

    /// Deterministic shutdown: close the queue, join every worker.
    pub fn shutdown(self) {
        drop(self.jobs_tx);
        let count = self.handles.len();
        for handle in self.handles {
            let _ = handle.join();
        }
        debug!(workers = count, "worker pool shut down");
    }
}
