//! Steepest-ascent local search over the one-exchange neighborhood.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::AcquisitionFunction;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value, Configuration, ScoredConfiguration};
use crate::error::Result;
use crate::history::HistoryContainer;
use crate::maximizer::{wrap_challengers, AcquisitionMaximizer};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// First-improvement hill climbing from multiple start points.
///
/// Starts are either freshly sampled (empty history) or the top-scoring
/// real, successful, non-duplicate historical configurations re-ranked under
/// the current acquisition function. Each climb generates a bounded number
/// of one-exchange neighbors per step and moves to the first neighbor with a
/// strictly higher score; it stops on a plateau, at the step cap, or after
/// too many consecutive tiny gains.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use acqmax::maximizer::{AcquisitionMaximizer, LocalSearch};
/// use acqmax::space::{ConfigurationSpace, ParameterDef};
/// use acqmax::{Direction, HistoryContainer};
///
/// let space = Arc::new(
///     ConfigurationSpace::new(vec![ParameterDef::float("x", 0.0, 1.0, 0.5)]).unwrap(),
/// );
/// let acquisition = Arc::new(|point: &[f64]| Ok::<_, acqmax::Error>(-(point[0] - 0.3).abs()));
/// let search = LocalSearch::builder(acquisition, space).seed(42).build();
///
/// let history = HistoryContainer::new(Direction::Minimize);
/// let ranked = search.rank(&history, 3).unwrap();
/// assert_eq!(ranked.len(), 3);
/// ```
pub struct LocalSearch {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    max_steps: usize,
    neighbor_cap: usize,
    improvement_tolerance: f64,
    small_gain_patience: usize,
}

impl LocalSearch {
    /// Creates a local search with default knobs and the given seed.
    #[must_use]
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Self {
        Self::builder(acquisition, space).seed(seed).build()
    }

    /// Creates a builder for configuring a `LocalSearch`.
    #[must_use]
    pub fn builder(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
    ) -> LocalSearchBuilder {
        LocalSearchBuilder {
            acquisition,
            space,
            max_steps: None,
            neighbor_cap: None,
            improvement_tolerance: None,
            small_gain_patience: None,
            seed: None,
        }
    }

    /// Selects the start points for the climbs.
    fn initial_points(
        &self,
        history: &HistoryContainer,
        num_points: usize,
        rng: &mut fastrand::Rng,
    ) -> Vec<Configuration> {
        if history.is_empty() {
            return self.space.sample_many(rng, num_points);
        }
        let previous = history.real_success_configs();
        let mut ranked = self.acquisition.evaluate_configs(&previous);
        sort_by_acq_value(rng, &mut ranked);
        ranked.truncate(num_points);
        ranked.into_iter().map(|s| s.config).collect()
    }

    /// One independent climb; returns the incumbent and its score.
    fn climb(&self, start: Configuration, rng: &mut fastrand::Rng) -> Result<(f64, Configuration)> {
        let mut incumbent = start;
        let mut acq_incumbent = self.acquisition.evaluate(incumbent.unit_vector())?;
        let mut steps = 0usize;
        let mut small_gain_steps = 0usize;

        loop {
            steps += 1;
            let mut changed = false;
            let neighbors =
                self.space
                    .one_exchange_neighborhood(&incumbent, rng, self.neighbor_cap);
            for neighbor in neighbors {
                let acq = match self.acquisition.evaluate(neighbor.unit_vector()) {
                    Ok(v) => v,
                    Err(err) => {
                        trace_warn!("skipping neighbor after failed acquisition eval: {err}");
                        continue;
                    }
                };
                // First improvement, not best improvement.
                if acq > acq_incumbent {
                    let delta = acq - acq_incumbent;
                    incumbent = neighbor;
                    acq_incumbent = acq;
                    changed = true;
                    if delta < self.improvement_tolerance {
                        small_gain_steps += 1;
                    } else {
                        small_gain_steps = 0;
                    }
                    break;
                }
            }

            if small_gain_steps >= self.small_gain_patience {
                trace_debug!(
                    "local search early stop after {} consecutive tiny gains",
                    small_gain_steps
                );
                break;
            }
            if !changed || steps >= self.max_steps {
                trace_debug!("local search finished after {} steps", steps);
                break;
            }
        }

        Ok((acq_incumbent, incumbent))
    }
}

impl AcquisitionMaximizer for LocalSearch {
    fn rank(
        &self,
        history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let mut rng = self.rng.lock();
        let init_points = self.initial_points(history, num_points, &mut rng);

        let mut results: Vec<ScoredConfiguration> = Vec::with_capacity(init_points.len());
        for start in init_points {
            match self.climb(start, &mut rng) {
                Ok((acq_value, config)) => results.push(ScoredConfiguration {
                    acq_value,
                    config: config.with_origin(Origin::LocalSearch),
                }),
                Err(err) => {
                    trace_warn!("local search start skipped: {err}");
                }
            }
        }

        sort_by_acq_value(&mut rng, &mut results);
        Ok(results)
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}

/// Builder for configuring a [`LocalSearch`].
///
/// Defaults: `max_steps` 50, `neighbor_cap` 150, `improvement_tolerance`
/// 1e-6, `small_gain_patience` 15, chooser `NoCoolDown(2.0)`.
pub struct LocalSearchBuilder {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    max_steps: Option<usize>,
    neighbor_cap: Option<usize>,
    improvement_tolerance: Option<f64>,
    small_gain_patience: Option<usize>,
    seed: Option<u64>,
}

impl LocalSearchBuilder {
    /// Sets the hard cap on climbing steps per start.
    #[must_use]
    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Sets the per-step cap on evaluated neighbors.
    #[must_use]
    pub fn neighbor_cap(mut self, n: usize) -> Self {
        self.neighbor_cap = Some(n);
        self
    }

    /// Sets the gain threshold below which an improvement counts as tiny.
    #[must_use]
    pub fn improvement_tolerance(mut self, tolerance: f64) -> Self {
        self.improvement_tolerance = Some(tolerance);
        self
    }

    /// Sets how many consecutive tiny gains end the climb early.
    #[must_use]
    pub fn small_gain_patience(mut self, n: usize) -> Self {
        self.small_gain_patience = Some(n);
        self
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured `LocalSearch`.
    #[must_use]
    pub fn build(self) -> LocalSearch {
        let seed = self.seed.unwrap_or_else(|| fastrand::Rng::new().u64(..));
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        LocalSearch {
            acquisition: self.acquisition,
            space: self.space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::no_cool_down(2.0, chooser_seed)),
            max_steps: self.max_steps.unwrap_or(50).max(1),
            neighbor_cap: self.neighbor_cap.unwrap_or(150),
            improvement_tolerance: self.improvement_tolerance.unwrap_or(1e-6),
            small_gain_patience: self.small_gain_patience.unwrap_or(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::history::Observation;
    use crate::space::ParameterDef;
    use crate::types::Direction;

    fn space() -> Arc<ConfigurationSpace> {
        Arc::new(
            ConfigurationSpace::new(vec![
                ParameterDef::float("x", 0.0, 1.0, 0.5),
                ParameterDef::float("y", 0.0, 1.0, 0.5),
            ])
            .unwrap(),
        )
    }

    /// Smooth unimodal acquisition peaking at (0.7, 0.7).
    fn peak_acq() -> Arc<dyn AcquisitionFunction> {
        Arc::new(|p: &[f64]| {
            Ok::<_, crate::Error>(-((p[0] - 0.7).powi(2) + (p[1] - 0.7).powi(2)))
        })
    }

    #[test]
    fn test_empty_history_returns_num_points_pairs() {
        let search = LocalSearch::builder(peak_acq(), space()).seed(42).build();
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = search.rank(&history, 5).unwrap();
        assert_eq!(ranked.len(), 5);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].acq_value >= w[1].acq_value));
    }

    #[test]
    fn test_climbing_improves_over_start() {
        let search = LocalSearch::builder(peak_acq(), space())
            .seed(7)
            .max_steps(30)
            .build();
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = search.rank(&history, 3).unwrap();
        // The peak value is 0; climbs should get close from random starts.
        assert!(ranked[0].acq_value > -0.5);
        assert_eq!(ranked[0].config.origin(), Origin::LocalSearch);
    }

    #[test]
    fn test_seeds_only_from_real_success_configs() {
        let space = space();
        let acq = peak_acq();
        let mut history = HistoryContainer::new(Direction::Minimize);
        let mut rng = fastrand::Rng::with_seed(1);
        let real = space.sample(&mut rng);
        history.push(Observation::new(real.clone(), 1.0));
        history.push_synthetic(Observation::new(space.sample(&mut rng), 0.5));

        let search = LocalSearch::builder(acq, Arc::clone(&space)).seed(3).build();
        // Only one real config exists, so only one start is possible.
        let ranked = search.rank(&history, 5).unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_max_steps_bounds_exploration() {
        let steps_seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&steps_seen);
        // Strictly increasing in x: every neighborhood pass finds an
        // improvement, so only max_steps can stop the climb.
        let acq: Arc<dyn AcquisitionFunction> = Arc::new(move |p: &[f64]| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok::<_, crate::Error>(p[0])
        });
        let space = Arc::new(
            ConfigurationSpace::new(vec![ParameterDef::float("x", 0.0, 1.0, 0.5)]).unwrap(),
        );
        let search = LocalSearch::builder(acq, space)
            .seed(5)
            .max_steps(3)
            .neighbor_cap(4)
            .build();
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = search.rank(&history, 1).unwrap();
        assert_eq!(ranked.len(), 1);
        // 1 incumbent eval + at most max_steps passes of <= neighbor_cap evals.
        assert!(steps_seen.load(Ordering::Relaxed) <= 1 + 3 * 4);
    }

    #[test]
    fn test_failed_evaluations_are_skipped_not_fatal() {
        // Acquisition fails left of 0.5 but is fine elsewhere.
        let acq: Arc<dyn AcquisitionFunction> = Arc::new(|p: &[f64]| {
            if p[0] < 0.5 {
                Err(crate::Error::Acquisition("left half unavailable".into()))
            } else {
                Ok(p[0])
            }
        });
        let space = Arc::new(
            ConfigurationSpace::new(vec![ParameterDef::float("x", 0.0, 1.0, 0.9)]).unwrap(),
        );
        let search = LocalSearch::builder(acq, space).seed(11).build();
        let history = HistoryContainer::new(Direction::Minimize);
        // Some starts fail on their initial evaluation and are skipped;
        // the round still completes.
        let ranked = search.rank(&history, 8).unwrap();
        assert!(ranked.len() <= 8);
        for s in &ranked {
            assert!(s.acq_value >= 0.5);
        }
    }

    #[test]
    fn test_maximize_returns_challenger_list() {
        let search = LocalSearch::builder(peak_acq(), space()).seed(42).build();
        let history = HistoryContainer::new(Direction::Minimize);
        let challengers = search.maximize(&history, 4).unwrap();
        assert_eq!(challengers.challengers().len(), 4);
    }
}
