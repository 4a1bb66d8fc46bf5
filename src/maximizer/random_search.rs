//! Candidate generation by uniform random sampling.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::AcquisitionFunction;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value, ScoredConfiguration};
use crate::error::Result;
use crate::history::HistoryContainer;
use crate::maximizer::{wrap_challengers, AcquisitionMaximizer};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// Draws i.i.d. samples from the configuration space.
///
/// With `sorted` enabled the samples are scored under the acquisition
/// function and ranked descending (seeded tie-break); otherwise they are
/// returned in sampled order with a neutral placeholder score of 0.
pub struct RandomSearch {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    sorted: bool,
}

impl RandomSearch {
    /// Creates a random search returning unsorted samples.
    #[must_use]
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Self {
        Self::with_sorted(acquisition, space, seed, false)
    }

    /// Creates a random search, optionally ranking samples by acquisition.
    #[must_use]
    pub fn with_sorted(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
        sorted: bool,
    ) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        Self {
            acquisition,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::no_cool_down(2.0, chooser_seed)),
            sorted,
        }
    }

    /// Samples `num_points` configurations, scored or placeholder-scored.
    ///
    /// Used directly by composite strategies that need one-off sorted or
    /// unsorted draws regardless of this instance's `sorted` flag.
    pub fn sample_ranked(&self, num_points: usize, sorted: bool) -> Vec<ScoredConfiguration> {
        let mut rng = self.rng.lock();
        let mut configs = self.space.sample_many(&mut rng, num_points);
        if sorted {
            for c in &mut configs {
                c.set_origin(Origin::RandomSearchSorted);
            }
            let mut scored = self.acquisition.evaluate_configs(&configs);
            sort_by_acq_value(&mut rng, &mut scored);
            scored
        } else {
            configs
                .into_iter()
                .map(|config| ScoredConfiguration {
                    acq_value: 0.0,
                    config: config.with_origin(Origin::RandomSearch),
                })
                .collect()
        }
    }
}

impl AcquisitionMaximizer for RandomSearch {
    fn rank(
        &self,
        _history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        Ok(self.sample_ranked(num_points, self.sorted))
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::ParameterDef;
    use crate::types::Direction;

    fn space() -> Arc<ConfigurationSpace> {
        Arc::new(
            ConfigurationSpace::new(vec![
                ParameterDef::float("x", 0.0, 1.0, 0.5),
                ParameterDef::int("n", 0, 9, 0),
            ])
            .unwrap(),
        )
    }

    fn acq() -> Arc<dyn AcquisitionFunction> {
        Arc::new(|p: &[f64]| Ok::<_, crate::Error>(p[0] + p[1]))
    }

    #[test]
    fn test_unsorted_keeps_sample_order_with_zero_scores() {
        let search = RandomSearch::new(acq(), space(), 42);
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = search.rank(&history, 10).unwrap();
        assert_eq!(ranked.len(), 10);
        for s in &ranked {
            assert_eq!(s.acq_value, 0.0);
            assert_eq!(s.config.origin(), Origin::RandomSearch);
        }
    }

    #[test]
    fn test_sorted_ranks_descending() {
        let search = RandomSearch::with_sorted(acq(), space(), 42, true);
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = search.rank(&history, 20).unwrap();
        assert_eq!(ranked.len(), 20);
        assert!(ranked.windows(2).all(|w| w[0].acq_value >= w[1].acq_value));
        assert!(ranked
            .iter()
            .all(|s| s.config.origin() == Origin::RandomSearchSorted));
    }

    #[test]
    fn test_sorted_is_deterministic_under_fixed_seed() {
        let history = HistoryContainer::new(Direction::Minimize);
        let run = || {
            let search = RandomSearch::with_sorted(acq(), space(), 123, true);
            search
                .rank(&history, 15)
                .unwrap()
                .into_iter()
                .map(|s| (s.acq_value, s.config))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
