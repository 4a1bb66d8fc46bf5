//! Observation bookkeeping consumed by every maximizer.
//!
//! The history is append-only: entries are never mutated after creation, and
//! the per-entry synthetic flag is fixed at append time. Only entries that
//! are real, successful, and not duplicate configurations are eligible for
//! surrogate-model fitting — [`HistoryContainer::real_success_configs`] is
//! the single filter both the external trainer and local-search seeding rely
//! on.

use std::collections::HashSet;

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::types::{Direction, TrialState};

/// One externally evaluated configuration.
///
/// Produced by the benchmark harness, consumed here as a value object.
#[derive(Clone, Debug)]
pub struct Observation {
    /// The evaluated configuration.
    pub config: Configuration,
    /// Objective values; the first entry drives ensemble selection.
    pub objectives: Vec<f64>,
    /// Terminal state of the benchmark run.
    pub trial_state: TrialState,
    /// Internal system metrics sampled during the run (may be empty).
    pub internal_metrics: Vec<f64>,
    /// Wall-clock seconds spent on the evaluation.
    pub elapsed_time: f64,
    /// Opaque evaluation context, if any.
    pub context: Option<String>,
}

impl Observation {
    /// Creates a successful observation with a single objective value.
    #[must_use]
    pub fn new(config: Configuration, objective: f64) -> Self {
        Self {
            config,
            objectives: vec![objective],
            trial_state: TrialState::Success,
            internal_metrics: Vec::new(),
            elapsed_time: 0.0,
            context: None,
        }
    }

    /// Sets the trial state.
    #[must_use]
    pub fn with_state(mut self, state: TrialState) -> Self {
        self.trial_state = state;
        self
    }

    /// Attaches internal system metrics.
    #[must_use]
    pub fn with_internal_metrics(mut self, metrics: Vec<f64>) -> Self {
        self.internal_metrics = metrics;
        self
    }

    /// Sets the elapsed evaluation time.
    #[must_use]
    pub fn with_elapsed_time(mut self, seconds: f64) -> Self {
        self.elapsed_time = seconds;
        self
    }
}

/// Ordered, append-only record of all evaluated configurations.
///
/// A parallel `is_synthetic` flag per entry distinguishes real evaluations
/// (which feed the surrogate model) from synthetic ones recorded for
/// diversity or ensemble bookkeeping.
#[derive(Clone, Debug)]
pub struct HistoryContainer {
    direction: Direction,
    observations: Vec<Observation>,
    synthetic: Vec<bool>,
}

impl HistoryContainer {
    /// Creates an empty history.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            observations: Vec::new(),
            synthetic: Vec::new(),
        }
    }

    /// Rebuilds a history from previously recorded parts.
    ///
    /// Older histories may carry fewer flags than observations; the missing
    /// tail is treated as real, the conservative default.
    #[must_use]
    pub fn from_parts(
        direction: Direction,
        observations: Vec<Observation>,
        mut synthetic: Vec<bool>,
    ) -> Self {
        synthetic.truncate(observations.len());
        synthetic.resize(observations.len(), false);
        Self {
            direction,
            observations,
            synthetic,
        }
    }

    /// Returns the optimization direction of the recorded objective.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the number of recorded observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns all recorded observations in append order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Returns whether the entry at `index` is synthetic.
    ///
    /// Missing flags read as real.
    #[must_use]
    pub fn is_synthetic(&self, index: usize) -> bool {
        self.synthetic.get(index).copied().unwrap_or(false)
    }

    /// Appends a real observation.
    pub fn push(&mut self, observation: Observation) {
        self.push_with_flag(observation, false);
    }

    /// Appends a synthetic observation (excluded from surrogate fitting).
    pub fn push_synthetic(&mut self, observation: Observation) {
        self.push_with_flag(observation, true);
    }

    fn push_with_flag(&mut self, observation: Observation, synthetic: bool) {
        self.observations.push(observation);
        self.synthetic.push(synthetic);
        debug_assert_eq!(self.observations.len(), self.synthetic.len());
    }

    /// Records one completed ensemble round.
    ///
    /// Exactly one observation — the successful one with the best first
    /// objective value under the history's direction — is appended as real;
    /// every other member of the round is appended as synthetic. Returns the
    /// index within `round` that was recorded as real.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyEnsembleRound`] if `round` is empty.
    pub fn push_ensemble(&mut self, round: Vec<Observation>) -> Result<usize> {
        if round.is_empty() {
            return Err(Error::EmptyEnsembleRound);
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, obs) in round.iter().enumerate() {
            if obs.trial_state != TrialState::Success {
                continue;
            }
            let value = obs.objectives.first().copied().unwrap_or(f64::NAN);
            if value.is_nan() {
                continue;
            }
            match best {
                Some((_, incumbent)) if !self.direction.is_better(value, incumbent) => {}
                _ => best = Some((i, value)),
            }
        }
        // A round with no successful member still records one real entry so
        // the per-round invariant (1 real, k-1 synthetic) holds.
        let real_index = best.map_or(0, |(i, _)| i);
        for (i, obs) in round.into_iter().enumerate() {
            self.push_with_flag(obs, i != real_index);
        }
        Ok(real_index)
    }

    /// Returns all recorded configurations in append order.
    #[must_use]
    pub fn configurations(&self) -> Vec<Configuration> {
        self.observations.iter().map(|o| o.config.clone()).collect()
    }

    /// Configurations eligible for surrogate fitting and search seeding:
    /// real, successful, first occurrence of each distinct configuration.
    #[must_use]
    pub fn real_success_configs(&self) -> Vec<Configuration> {
        let mut seen: HashSet<Configuration> = HashSet::new();
        let mut configs = Vec::new();
        for (i, obs) in self.observations.iter().enumerate() {
            if self.is_synthetic(i) || obs.trial_state != TrialState::Success {
                continue;
            }
            if seen.insert(obs.config.clone()) {
                configs.push(obs.config.clone());
            }
        }
        configs
    }

    /// Count of synthetic entries, for diagnostics.
    #[must_use]
    pub fn synthetic_count(&self) -> usize {
        self.synthetic.iter().filter(|&&f| f).count()
    }
}
