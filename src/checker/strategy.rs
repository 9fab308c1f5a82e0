//! Stopping rules and batch listener notification.
//!
//! The three rules form a closed catalog. Rationale: a boolean property
//! without a spread estimate cannot apply the dynamic bound (its `s` is
//! undefined), so it falls back to the static worst-case cutoff; the
//! distribution rule never stops early because its whole purpose is to
//! harvest full per-batch distributions for external plotting.

use tracing::debug;

use crate::aggregate::Aggregator;
use crate::error::AsmcResult;
use crate::sample::{SampleSet, SampleValue};
use crate::stats::dynamic_bound;

use super::ConfidenceParameters;

/// Which stopping rule drives a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopRule {
    /// For boolean properties. Stops once the dynamic bound is inside the
    /// target width, provided the aggregator estimates spread; otherwise
    /// runs to the worst-case static cutoff.
    Boolean,
    /// For numeric properties. Always applies the dynamic bound; requires
    /// a spread-capable aggregator.
    Numeric,
    /// Runs to the worst-case static cutoff and broadcasts every batch's
    /// ordered results to listeners; never stops early.
    Distribution,
}

impl StopRule {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::Distribution => "distribution",
        }
    }
}

impl std::fmt::Display for StopRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Observer of per-batch partial sample data.
pub trait BatchListener: Send {
    /// Called after every batch of a [`StopRule::Distribution`] session
    /// with the ordered numeric results of all samples so far.
    fn batch_done(&mut self, values: &[f64]);
}

/// Decides whether the session may stop after the current batch.
pub(crate) fn should_stop<R: SampleValue>(
    rule: StopRule,
    samples: &SampleSet<R>,
    aggregator: &dyn Aggregator<R>,
    params: &ConfidenceParameters,
) -> AsmcResult<bool> {
    let n = samples.len();
    let stop = match rule {
        StopRule::Boolean => {
            if aggregator.estimates_spread() {
                n >= params.max_n() || interval_size_reached(samples, aggregator, params)?
            } else {
                n >= params.max_n()
            }
        }
        StopRule::Numeric => interval_size_reached(samples, aggregator, params)?,
        StopRule::Distribution => n >= params.max_n(),
    };
    debug!(rule = %rule, n, stop, "stop decision");
    Ok(stop)
}

/// True once the dynamic confidence interval is narrower than the target.
fn interval_size_reached<R: SampleValue>(
    samples: &SampleSet<R>,
    aggregator: &dyn Aggregator<R>,
    params: &ConfidenceParameters,
) -> AsmcResult<bool> {
    let s = aggregator.sample_spread(samples)?;
    let width = dynamic_bound(s, samples.len(), params.alpha())?;
    Ok(width < params.delta())
}

/// Delivers the per-batch notification the rule defines.
///
/// Boolean and Numeric sessions define none (extension point); the
/// distribution rule broadcasts the sorted results snapshot.
pub(crate) fn notify_listeners<R: SampleValue>(
    rule: StopRule,
    samples: &SampleSet<R>,
    listeners: &mut [Box<dyn BatchListener>],
) {
    match rule {
        StopRule::Boolean | StopRule::Numeric => {}
        StopRule::Distribution => {
            let mut values = samples.numeric_results();
            values.sort_by(f64::total_cmp);
            for listener in listeners.iter_mut() {
                listener.batch_done(&values);
            }
        }
    }
}
