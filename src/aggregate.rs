//! Result aggregators: stateless reducers over the growing sample set.
//!
//! An aggregator may be invoked any number of times during a session, both
//! on non-final snapshots (the dynamic stopping check) and on the final set
//! (the published result). All reducers are commutative, since sample
//! insertion order within a batch is unspecified.

use crate::error::{AsmcResult, ExecutionError};
use crate::sample::{SampleSet, SampleValue};

/// Reduces a sample set to a single numeric result.
///
/// The spread capability is optional: implementations that can estimate a
/// standard-deviation-like statistic override [`Aggregator::estimates_spread`]
/// and [`Aggregator::sample_spread`], which unlocks the dynamic
/// (Student-t) stopping bound.
pub trait Aggregator<R>: Send + Sync {
    /// Aggregates the terminal results of all completed samples.
    fn aggregate(&self, samples: &SampleSet<R>) -> f64;

    /// True if [`Aggregator::sample_spread`] is implemented.
    fn estimates_spread(&self) -> bool {
        false
    }

    /// Sample spread statistic `s` used by the dynamic bound.
    ///
    /// Requires at least two samples. The default implementation reports
    /// the capability as unsupported.
    fn sample_spread(&self, samples: &SampleSet<R>) -> AsmcResult<f64> {
        let _ = samples;
        Err(ExecutionError::SpreadUnsupported.into())
    }
}

fn require_two<R>(samples: &SampleSet<R>) -> AsmcResult<()> {
    if samples.len() < 2 {
        return Err(ExecutionError::InsufficientSamples {
            n: samples.len(),
            required: 2,
        }
        .into());
    }
    Ok(())
}

/// Empirical probability estimator over boolean samples: `count(true) / n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventProbability;

impl Aggregator<bool> for EventProbability {
    fn aggregate(&self, samples: &SampleSet<bool>) -> f64 {
        let count = samples.results().filter(|&r| r).count();
        count as f64 / samples.len() as f64
    }
}

/// [`EventProbability`] with the algebraic spread surrogate of a Bernoulli
/// estimator: `s = sqrt((c - c^2/n) / (n - 1))` for `c` positive samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventProbabilityVariance;

impl Aggregator<bool> for EventProbabilityVariance {
    fn aggregate(&self, samples: &SampleSet<bool>) -> f64 {
        EventProbability.aggregate(samples)
    }

    fn estimates_spread(&self) -> bool {
        true
    }

    fn sample_spread(&self, samples: &SampleSet<bool>) -> AsmcResult<f64> {
        require_two(samples)?;
        let n = samples.len() as f64;
        let count = samples.results().filter(|&r| r).count() as f64;
        let square_sum = count * count / n;
        Ok(((count - square_sum) / (n - 1.0)).sqrt())
    }
}

/// Numeric mean with a centered two-pass standard deviation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAggregator;

impl<R: SampleValue> Aggregator<R> for MeanAggregator {
    fn aggregate(&self, samples: &SampleSet<R>) -> f64 {
        let sum: f64 = samples.results().map(SampleValue::as_f64).sum();
        sum / samples.len() as f64
    }

    fn estimates_spread(&self) -> bool {
        true
    }

    fn sample_spread(&self, samples: &SampleSet<R>) -> AsmcResult<f64> {
        require_two(samples)?;
        let n = samples.len() as f64;
        let mean = self.aggregate(samples);
        // Centered sum: stable where sum-of-squares cancellation is not.
        let centered: f64 = samples
            .results()
            .map(|r| {
                let d = r.as_f64() - mean;
                d * d
            })
            .sum();
        Ok((centered / (n - 1.0)).sqrt())
    }
}
