//! Samples and the session-wide sample set.

use crate::property::Property;

/// One completed simulation run's evaluated property instance.
///
/// Born as a prototype clone at batch-dispatch time, owned exclusively by
/// its run until completion, then frozen and handed to the driver.
pub type Sample<R> = Box<dyn Property<Output = R>>;

/// Trait for terminal property result values the checker can aggregate.
///
/// The numeric view is what aggregators, spread estimates and listener
/// snapshots operate on; booleans map to indicator values.
pub trait SampleValue: Copy + Send + 'static {
    /// The value as a number.
    fn as_f64(self) -> f64;
}

impl SampleValue for bool {
    fn as_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

impl SampleValue for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

/// Append-only, insertion-ordered collection of completed samples.
///
/// Grows monotonically over a whole session, never shrinks and is never
/// reordered. Samples are inserted in run *completion* order, which within
/// a batch is unspecified; everything reading the set must therefore be
/// insensitive to order.
#[derive(Default)]
pub struct SampleSet<R> {
    samples: Vec<Sample<R>>,
}

impl<R> SampleSet<R> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Creates an empty set with room for `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Appends a completed sample.
    pub fn push(&mut self, sample: Sample<R>) {
        self.samples.push(sample);
    }

    /// Number of completed samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no sample has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates the terminal results in insertion order.
    pub fn results(&self) -> impl Iterator<Item = R> + '_ {
        self.samples.iter().map(|s| s.result())
    }
}

impl<R: SampleValue> SampleSet<R> {
    /// The terminal results as numbers, in insertion order.
    #[must_use]
    pub fn numeric_results(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.result().as_f64()).collect()
    }
}

impl<R> std::fmt::Debug for SampleSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSet")
            .field("len", &self.samples.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::testutil::{ClockEnv, Scripted};
    use crate::property::{And, Observer, Property};

    fn sample_with_result(value: bool) -> Sample<bool> {
        let mut p = And::new();
        if !value {
            p.add_observation(Box::new(Scripted::new(&[false])));
            p.step_done(&ClockEnv { time: 0.0 }, 1);
        }
        Box::new(p)
    }

    #[test]
    fn preserves_insertion_order() {
        let mut set = SampleSet::new();
        set.push(sample_with_result(true));
        set.push(sample_with_result(false));
        set.push(sample_with_result(true));

        let results: Vec<bool> = set.results().collect();
        assert_eq!(results, vec![true, false, true]);
    }

    #[test]
    fn numeric_results_map_booleans_to_indicators() {
        let mut set = SampleSet::new();
        set.push(sample_with_result(true));
        set.push(sample_with_result(false));
        assert_eq!(set.numeric_results(), vec![1.0, 0.0]);
    }

    #[test]
    fn len_tracks_appends() {
        let mut set: SampleSet<bool> = SampleSet::with_capacity(4);
        assert!(set.is_empty());
        set.push(sample_with_result(true));
        assert_eq!(set.len(), 1);
    }
}
