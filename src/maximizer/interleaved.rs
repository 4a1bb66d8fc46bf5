//! Default acquisition maximization: local search interleaved with sorted
//! random search.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::AcquisitionFunction;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value_stable, ScoredConfiguration};
use crate::error::Result;
use crate::history::HistoryContainer;
use crate::maximizer::{wrap_challengers, AcquisitionMaximizer, LocalSearch, RandomSearch};
use crate::rng_util;
use crate::space::ConfigurationSpace;

/// Composes a fixed local-search budget with sorted random search.
///
/// Runs `n_sls_iterations` local-search starts, fills the remainder of
/// `num_points` with acquisition-sorted random samples, and globally
/// re-sorts the concatenation. Early in tuning, a not-yet-informative
/// surrogate scores everything near-equal; placing the sorted random
/// candidates first before the stable sort keeps exploration-heavy
/// candidates at the front of the queue on ties. The resulting
/// `ChallengerList` additionally injects fresh random samples per the
/// chooser's probability as the harness consumes candidates.
pub struct InterleavedLocalAndRandomSearch {
    local_search: LocalSearch,
    random_search: RandomSearch,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    n_sls_iterations: usize,
}

impl InterleavedLocalAndRandomSearch {
    /// Creates the composite with default knobs and the given seed.
    #[must_use]
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Self {
        Self::builder(acquisition, space).seed(seed).build()
    }

    /// Creates a builder for configuring the composite.
    #[must_use]
    pub fn builder(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
    ) -> InterleavedBuilder {
        InterleavedBuilder {
            acquisition,
            space,
            max_steps: None,
            n_sls_iterations: None,
            rand_prob: None,
            seed: None,
        }
    }
}

impl AcquisitionMaximizer for InterleavedLocalAndRandomSearch {
    fn rank(
        &self,
        history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let local = self.local_search.rank(history, self.n_sls_iterations)?;
        let n_random = num_points.saturating_sub(local.len());

        // Sorted random first; ties keep exploration candidates in front.
        let mut combined = self.random_search.sample_ranked(n_random, true);
        combined.extend(local);
        sort_by_acq_value_stable(&mut combined);
        Ok(combined)
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}

/// Builder for configuring an [`InterleavedLocalAndRandomSearch`].
///
/// Defaults: `n_sls_iterations` 10, `rand_prob` 0.25, local-search knobs as
/// in [`LocalSearch`].
pub struct InterleavedBuilder {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    max_steps: Option<usize>,
    n_sls_iterations: Option<usize>,
    rand_prob: Option<f64>,
    seed: Option<u64>,
}

impl InterleavedBuilder {
    /// Sets the local-search step cap forwarded to [`LocalSearch`].
    #[must_use]
    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Sets the number of local-search starts per round.
    #[must_use]
    pub fn n_sls_iterations(mut self, n: usize) -> Self {
        self.n_sls_iterations = Some(n);
        self
    }

    /// Sets the per-pull probability of injecting a random configuration.
    #[must_use]
    pub fn rand_prob(mut self, p: f64) -> Self {
        self.rand_prob = Some(p);
        self
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured composite.
    #[must_use]
    pub fn build(self) -> InterleavedLocalAndRandomSearch {
        let seed = self.seed.unwrap_or_else(|| fastrand::Rng::new().u64(..));
        let mut rng = fastrand::Rng::with_seed(seed);

        let mut local_builder =
            LocalSearch::builder(Arc::clone(&self.acquisition), Arc::clone(&self.space))
                .seed(rng.u64(..));
        if let Some(max_steps) = self.max_steps {
            local_builder = local_builder.max_steps(max_steps);
        }

        let random_search = RandomSearch::with_sorted(
            Arc::clone(&self.acquisition),
            Arc::clone(&self.space),
            rng.u64(..),
            true,
        );
        let chooser_seed = rng.u64(..);

        InterleavedLocalAndRandomSearch {
            local_search: local_builder.build(),
            random_search,
            space: self.space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(self.rand_prob.unwrap_or(0.25), chooser_seed)),
            n_sls_iterations: self.n_sls_iterations.unwrap_or(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::ParameterDef;
    use crate::types::{Direction, Origin};

    fn space() -> Arc<ConfigurationSpace> {
        Arc::new(
            ConfigurationSpace::new(vec![
                ParameterDef::float("x", 0.0, 1.0, 0.5),
                ParameterDef::float("y", 0.0, 1.0, 0.5),
            ])
            .unwrap(),
        )
    }

    fn acq() -> Arc<dyn AcquisitionFunction> {
        Arc::new(|p: &[f64]| Ok::<_, crate::Error>(-((p[0] - 0.2).powi(2) + p[1].powi(2))))
    }

    #[test]
    fn test_fills_num_points_with_both_sources() {
        let maximizer = InterleavedLocalAndRandomSearch::builder(acq(), space())
            .n_sls_iterations(3)
            .seed(42)
            .build();
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = maximizer.rank(&history, 12).unwrap();
        assert_eq!(ranked.len(), 12);
        assert!(ranked.windows(2).all(|w| w[0].acq_value >= w[1].acq_value));

        let locals = ranked
            .iter()
            .filter(|s| s.config.origin() == Origin::LocalSearch)
            .count();
        let randoms = ranked
            .iter()
            .filter(|s| s.config.origin() == Origin::RandomSearchSorted)
            .count();
        assert_eq!(locals, 3);
        assert_eq!(randoms, 9);
    }

    #[test]
    fn test_maximize_advances_chooser_round() {
        let maximizer = InterleavedLocalAndRandomSearch::builder(acq(), space())
            .n_sls_iterations(2)
            .seed(7)
            .build();
        let history = HistoryContainer::new(Direction::Minimize);
        let before = maximizer.chooser.lock().iteration();
        let _ = maximizer.maximize(&history, 5).unwrap();
        assert_eq!(maximizer.chooser.lock().iteration(), before + 1);
    }
}
