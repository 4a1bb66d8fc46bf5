//! Monte-Carlo scoring combined with local refinement, for multi-objective
//! acquisition functions whose landscape is too irregular for pure local
//! search.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::AcquisitionFunction;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value, ScoredConfiguration};
use crate::error::Result;
use crate::history::HistoryContainer;
use crate::maximizer::minimize;
use crate::maximizer::{ensure_numeric, wrap_challengers, AcquisitionMaximizer};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// Monte-Carlo samples scored per round.
const DEFAULT_NUM_MC: usize = 1000;

/// Local refinement restarts per round.
const DEFAULT_NUM_RESTARTS: usize = 20;

/// Iteration cap per refinement run.
const REFINE_MAX_ITER: usize = 200;

/// Scores a large uniform Monte-Carlo pool and refines random restarts.
///
/// Restarts that fail or do not converge are dropped with a warning; the
/// Monte-Carlo pool alone still fills the round in that case.
pub struct McGradientOptimizer {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    num_mc: usize,
    num_restarts: usize,
}

impl McGradientOptimizer {
    /// Creates the optimizer with the default pool and restart sizes.
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
        Self::with_sizes(acquisition, space, seed, DEFAULT_NUM_MC, DEFAULT_NUM_RESTARTS)
    }

    /// Creates the optimizer with explicit pool and restart sizes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedParameter`] when the space has a
    /// categorical dimension.
    pub fn with_sizes(
        acquisition: Arc<dyn AcquisitionFunction>,
        space: Arc<ConfigurationSpace>,
        seed: u64,
        num_mc: usize,
        num_restarts: usize,
    ) -> Result<Self> {
        ensure_numeric(&space)?;
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        Ok(Self {
            acquisition,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(0.0, chooser_seed)),
            num_mc: num_mc.max(1),
            num_restarts,
        })
    }
}

impl AcquisitionMaximizer for McGradientOptimizer {
    fn rank(
        &self,
        _history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let mut rng = self.rng.lock();

        let mut pool = self.space.sample_many(&mut rng, self.num_mc);
        for c in &mut pool {
            c.set_origin(Origin::RandomSearch);
        }
        let mut combined = self.acquisition.evaluate_configs(&pool);

        let dim = self.space.len();
        let mut dropped = 0usize;
        for _ in 0..self.num_restarts {
            let x0 = minimize::random_point(&mut rng, dim);
            let mut objective =
                |x: &[f64]| self.acquisition.evaluate(x).map(|v| -v);
            match minimize::nelder_mead(&mut objective, &x0, REFINE_MAX_ITER) {
                Ok(outcome) if outcome.converged => {
                    let config = self
                        .space
                        .from_unit_vector(&outcome.x, Origin::ContinuousMinimizer)?;
                    combined.push(ScoredConfiguration {
                        acq_value: -outcome.value,
                        config,
                    });
                }
                Ok(_) => dropped += 1,
                Err(err) => {
                    dropped += 1;
                    trace_warn!("refinement restart failed: {err}");
                }
            }
        }
        if dropped > 0 {
            trace_debug!("dropped {dropped} of {} refinement restarts", self.num_restarts);
        }

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
