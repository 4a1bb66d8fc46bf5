//! Continuous acquisition maximization over the unit hypercube.
//!
//! These strategies apply only to fully numeric spaces and maximize the
//! acquisition function by minimizing its negation with the gradient-free
//! routines in [`super::minimize`]. A failed minimizer run degrades to a
//! smaller (possibly empty) candidate set rather than aborting the round.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::AcquisitionFunction;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value, Configuration, ScoredConfiguration};
use crate::error::{Error, Result};
use crate::history::HistoryContainer;
use crate::maximizer::minimize;
use crate::maximizer::random_search::RandomSearch;
use crate::maximizer::{ensure_numeric, wrap_challengers, AcquisitionMaximizer};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// Iteration cap for a single local minimization.
const LOCAL_MAX_ITER: usize = 1000;

/// Generations for the differential-evolution global variant.
const GLOBAL_MAX_GENERATIONS: usize = 100;

/// Restarts run by the multi-start variant.
const DEFAULT_NUM_RESTARTS: usize = 10;

fn negated_objective<'a>(
    acquisition: &'a dyn AcquisitionFunction,
) -> impl FnMut(&[f64]) -> Result<f64> + 'a {
    move |x: &[f64]| acquisition.evaluate(x).map(|v| -v)
}

/// Single-start local minimization of the negated acquisition.
pub struct ContinuousOptimizer {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    max_iter: usize,
}

impl ContinuousOptimizer {
    /// Creates the optimizer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedParameter`] when the space has a
    /// categorical dimension.
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Result<Self> {
        ensure_numeric(&space)?;
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        Ok(Self {
            acquisition,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(0.0, chooser_seed)),
            max_iter: LOCAL_MAX_ITER,
        })
    }

    /// Runs one minimization from `start` (or a fresh random point) and
    /// returns at most one scored configuration.
    ///
    /// A minimizer failure yields an empty list with a logged warning.
    pub fn rank_from(&self, start: Option<&Configuration>) -> Vec<ScoredConfiguration> {
        let mut rng = self.rng.lock();
        let x0 = match start {
            Some(config) => config.unit_vector().to_vec(),
            None => minimize::random_point(&mut rng, self.space.len()),
        };
        let mut objective = negated_objective(self.acquisition.as_ref());
        match minimize::nelder_mead(&mut objective, &x0, self.max_iter) {
            Ok(outcome) => match self
                .space
                .from_unit_vector(&outcome.x, Origin::ContinuousMinimizer)
            {
                Ok(config) => vec![ScoredConfiguration {
                    acq_value: -outcome.value,
                    config,
                }],
                Err(err) => {
                    trace_warn!("discarding minimizer result: {err}");
                    Vec::new()
                }
            },
            Err(err) => {
                trace_warn!("local minimization failed: {err}");
                Vec::new()
            }
        }
    }
}

impl AcquisitionMaximizer for ContinuousOptimizer {
    fn rank(
        &self,
        _history: &HistoryContainer,
        _num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        Ok(self.rank_from(None))
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}

/// Population-based global minimization of the negated acquisition.
///
/// Used when a single local run risks a poor local optimum.
pub struct GlobalContinuousOptimizer {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
}

impl GlobalContinuousOptimizer {
    /// Creates the optimizer; fails on categorical dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedParameter`] when the space has a
    /// categorical dimension.
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Result<Self> {
        ensure_numeric(&space)?;
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        Ok(Self {
            acquisition,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(0.0, chooser_seed)),
        })
    }
}

impl AcquisitionMaximizer for GlobalContinuousOptimizer {
    fn rank(
        &self,
        _history: &HistoryContainer,
        _num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let dim = self.space.len();
        let population = (10 * dim).max(15);
        let mut rng = self.rng.lock();
        let mut objective = negated_objective(self.acquisition.as_ref());
        match minimize::differential_evolution(
            &mut objective,
            dim,
            &mut rng,
            population,
            GLOBAL_MAX_GENERATIONS,
            0.8,
            0.9,
        ) {
            Ok(outcome) => {
                let config = self
                    .space
                    .from_unit_vector(&outcome.x, Origin::GlobalMinimizer)?;
                Ok(vec![ScoredConfiguration {
                    acq_value: -outcome.value,
                    config,
                }])
            }
            Err(err) => {
                trace_warn!("global minimization failed: {err}");
                Ok(Vec::new())
            }
        }
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}

/// Local minimization restarted from sorted random-search seeds.
///
/// The sorted random pool is kept in the output alongside every successful
/// restart, so a run with failed restarts still degrades gracefully.
pub struct MultiStartContinuousOptimizer {
    local: ContinuousOptimizer,
    random_search: RandomSearch,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    num_restarts: usize,
}

impl MultiStartContinuousOptimizer {
    /// Creates the optimizer with `num_restarts` clamped to at least 3.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedParameter`] when the space has a
    /// categorical dimension.
    pub fn new(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_restarts(acquisition, space, seed, DEFAULT_NUM_RESTARTS)
    }

    /// Creates the optimizer with an explicit restart count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedParameter`] when the space has a
    /// categorical dimension.
    pub fn with_restarts(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
        num_restarts: usize,
    ) -> Result<Self> {
        ensure_numeric(&space)?;
        let mut rng = fastrand::Rng::with_seed(seed);
        let local = ContinuousOptimizer::new(
            Arc::clone(&acquisition),
            Arc::clone(&space),
            rng.u64(..),
        )?;
        let random_search = RandomSearch::with_sorted(
            Arc::clone(&acquisition),
            Arc::clone(&space),
            rng.u64(..),
            true,
        );
        let chooser_seed = rng.u64(..);
        Ok(Self {
            local,
            random_search,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(0.0, chooser_seed)),
            num_restarts: num_restarts.max(3),
        })
    }
}

impl AcquisitionMaximizer for MultiStartContinuousOptimizer {
    /// # Errors
    ///
    /// Returns [`Error::MinimizerFailed`] when every restart fails and the
    /// random pool produced no scored candidate either.
    fn rank(
        &self,
        _history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let pool_size = num_points.max(self.num_restarts);
        let pool = self.random_search.sample_ranked(pool_size, true);

        let mut combined = Vec::with_capacity(pool.len() + self.num_restarts);
        let mut successes = 0usize;
        for i in 0..self.num_restarts {
            // First restart refines the best random point, the rest start
            // fresh.
            let start = if i == 0 { pool.first().map(|s| &s.config) } else { None };
            let refined = self.local.rank_from(start);
            if !refined.is_empty() {
                successes += 1;
                combined.extend(refined);
            }
        }
        if successes == 0 {
            if pool.is_empty() {
                return Err(Error::MinimizerFailed(format!(
                    "all {} restarts failed and the random pool scored empty",
                    self.num_restarts
                )));
            }
            trace_warn!("all {} restarts failed, returning random pool", self.num_restarts);
        }
        combined.extend(pool);

        let mut rng = self.rng.lock();
        sort_by_acq_value(&mut rng, &mut combined);
        combined.truncate(num_points.max(1));
        Ok(combined)
    }

    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList> {
        let ranked = self.rank(history, num_points)?;
        let rng = rng_util::fork(&mut self.rng.lock());
        Ok(wrap_challengers(ranked, &self.space, &self.chooser, rng))
    }
}
