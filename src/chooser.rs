//! Cooldown policies for injecting random configurations.

use std::sync::Arc;

use parking_lot::Mutex;

/// The rule deciding when a random configuration replaces a strategy one.
#[derive(Clone, Copy, Debug)]
pub enum ChooserPolicy {
    /// Inject randomness whenever `pull_iteration % round(interval) == 0`.
    NoCoolDown {
        /// Injection interval in pulls.
        interval: f64,
    },
    /// Inject randomness with a fixed independent probability per pull.
    Prob {
        /// Injection probability in `[0, 1]`.
        probability: f64,
    },
}

/// Stateful policy deciding, per pull, whether the next yielded candidate
/// should be a fresh random sample instead of the next strategy candidate.
///
/// The SMBO iteration counter advances exactly once per completed proposal
/// round via [`RandomChooser::next_smbo_iteration`], independent of how many
/// candidates were drawn within that round.
#[derive(Debug)]
pub struct RandomChooser {
    policy: ChooserPolicy,
    iteration: u64,
    rng: fastrand::Rng,
}

impl RandomChooser {
    /// Creates a chooser with an explicitly seeded RNG.
    #[must_use]
    pub fn new(policy: ChooserPolicy, seed: u64) -> Self {
        Self {
            policy,
            iteration: 0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Shorthand for a `NoCoolDown` chooser.
    #[must_use]
    pub fn no_cool_down(interval: f64, seed: u64) -> Self {
        Self::new(ChooserPolicy::NoCoolDown { interval }, seed)
    }

    /// Shorthand for a `Prob` chooser.
    #[must_use]
    pub fn prob(probability: f64, seed: u64) -> Self {
        Self::new(ChooserPolicy::Prob { probability }, seed)
    }

    /// Decides whether the pull at `pull_iteration` should be random.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn check(&mut self, pull_iteration: u64) -> bool {
        match self.policy {
            ChooserPolicy::NoCoolDown { interval } => {
                let interval = interval.round().max(1.0) as u64;
                pull_iteration % interval == 0
            }
            ChooserPolicy::Prob { probability } => self.rng.f64() < probability,
        }
    }

    /// Advances the SMBO iteration counter by one, at the end of a round.
    pub fn next_smbo_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Returns the number of completed proposal rounds.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }
}

/// A chooser shared between a maximizer and the `ChallengerList`s it returns.
pub type SharedChooser = Arc<Mutex<RandomChooser>>;

/// Wraps a chooser for sharing.
#[must_use]
pub fn shared(chooser: RandomChooser) -> SharedChooser {
    Arc::new(Mutex::new(chooser))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cool_down_interval() {
        let mut chooser = RandomChooser::no_cool_down(2.0, 0);
        // 1-based pull iterations: every second pull is random.
        assert!(!chooser.check(1));
        assert!(chooser.check(2));
        assert!(!chooser.check(3));
        assert!(chooser.check(4));
    }

    #[test]
    fn test_prob_zero_never_injects() {
        let mut chooser = RandomChooser::prob(0.0, 42);
        assert!((1..100).all(|i| !chooser.check(i)));
    }

    #[test]
    fn test_prob_one_always_injects() {
        let mut chooser = RandomChooser::prob(1.0, 42);
        assert!((1..100).all(|i| chooser.check(i)));
    }

    #[test]
    fn test_iteration_advances_once_per_round() {
        let mut chooser = RandomChooser::prob(0.5, 42);
        for i in 1..50 {
            chooser.check(i);
        }
        assert_eq!(chooser.iteration(), 0);
        chooser.next_smbo_iteration();
        assert_eq!(chooser.iteration(), 1);
    }
}
