//! Conjunction property.

use crate::observe::{Environment, Observation};

use super::{ObservationPool, Observer, Property};

/// True while every observation is true; becomes permanently false, and
/// requests an early stop, as soon as any observation is false.
pub struct And {
    observations: ObservationPool,
    result: bool,
}

impl Default for And {
    fn default() -> Self {
        Self::new()
    }
}

impl And {
    /// Creates the property with an empty observation pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observations: ObservationPool::new(),
            result: true,
        }
    }
}

impl Observer for And {
    fn step_done(&mut self, env: &dyn Environment, _step: u64) {
        for obs in self.observations.iter_mut() {
            self.result = self.result && obs.observe(env);
            if !self.result {
                break;
            }
        }
    }

    fn can_change(&self) -> bool {
        self.result
    }
}

impl Property for And {
    type Output = bool;

    fn add_observation(&mut self, obs: Box<dyn Observation>) {
        self.observations.push(obs);
    }

    fn clone_prototype(&self) -> Box<dyn Property<Output = bool>> {
        Box::new(Self {
            observations: self.observations.clone_pool(),
            result: self.result,
        })
    }

    fn result(&self) -> bool {
        self.result
    }
}

impl std::fmt::Debug for And {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("And")
            .field("observations", &self.observations.len())
            .field("result", &self.result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::testutil::{ClockEnv, Scripted};

    #[test]
    fn default_is_true() {
        let p = And::new();
        assert!(p.result());
        assert!(p.can_change());
    }

    #[test]
    fn falsified_at_third_step_and_frozen() {
        let env = ClockEnv { time: 0.0 };
        let mut p = And::new();
        p.add_observation(Box::new(Scripted::new(&[true, true, false, true])));

        p.step_done(&env, 1);
        assert!(p.result());
        p.step_done(&env, 2);
        assert!(p.result());

        p.step_done(&env, 3);
        assert!(!p.result());
        assert!(!p.can_change());

        // A further step must not flip the verdict back.
        p.step_done(&env, 4);
        assert!(!p.result());
        assert!(!p.can_change());
    }

    #[test]
    fn short_circuits_on_first_false() {
        let env = ClockEnv { time: 0.0 };
        let mut p = And::new();
        p.add_observation(Box::new(Scripted::new(&[false])));
        // The second observation would flip the verdict if it were consulted.
        p.add_observation(Box::new(Scripted::new(&[true])));

        p.step_done(&env, 1);
        assert!(!p.result());
    }

    #[test]
    fn prototype_clone_starts_an_independent_run() {
        let env = ClockEnv { time: 0.0 };
        let mut proto = And::new();
        proto.add_observation(Box::new(Scripted::new(&[false])));

        let mut run = proto.clone_prototype();
        run.step_done(&env, 1);
        assert!(!run.result());
        // The prototype never stepped; it keeps its initial verdict.
        assert!(proto.result());
    }
}
