//! Batched continuous maximization with random-pool staging.

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

/// Size of the uniform random pool always included in the output.
const DEFAULT_NUM_RANDOM: usize = 1000;

/// Number of top-scored seeds refined by batch minimization.
const DEFAULT_NUM_RESTARTS: usize = 20;

/// Raw samples drawn when picking seeds.
const DEFAULT_RAW_SAMPLES: usize = 1024;

/// Seeds optimized jointly per minimizer call.
const DEFAULT_BATCH_LIMIT: usize = 5;

/// Iteration cap per joint minimization.
const DEFAULT_MAX_ITER: usize = 200;

/// Refines the best of a large random draw in jointly-minimized batches.
///
/// Seeds are the top `num_restarts` points of `raw_samples` uniform draws.
/// Each group of up to `batch_limit` seeds is optimized by one minimizer
/// call over their flattened concatenation, with the objective being the
/// sum of the group's negated acquisition values. The raw random pool is
/// always part of the output, so a failed batch degrades to random search
/// instead of an empty round.
pub struct StagedBatchOptimizer {
    acquisition: Arc<dyn AcquisitionFunction>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
    num_random: usize,
    num_restarts: usize,
    raw_samples: usize,
    batch_limit: usize,
    max_iter: usize,
}

impl StagedBatchOptimizer {
    /// Creates the optimizer with default stage sizes.
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
            num_random: DEFAULT_NUM_RANDOM,
            num_restarts: DEFAULT_NUM_RESTARTS,
            raw_samples: DEFAULT_RAW_SAMPLES,
            batch_limit: DEFAULT_BATCH_LIMIT,
            max_iter: DEFAULT_MAX_ITER,
        })
    }

    /// Overrides the stage sizes. Values are clamped to at least 1.
    #[must_use]
    pub fn with_stage_sizes(
        mut self,
        num_random: usize,
        num_restarts: usize,
        raw_samples: usize,
        batch_limit: usize,
    ) -> Self {
        self.num_random = num_random.max(1);
        self.num_restarts = num_restarts.max(1);
        self.raw_samples = raw_samples.max(1);
        self.batch_limit = batch_limit.max(1);
        self
    }

    fn score_pool(
        &self,
        rng: &mut fastrand::Rng,
        count: usize,
        origin: Origin,
    ) -> Vec<ScoredConfiguration> {
        let mut configs = self.space.sample_many(rng, count);
        for c in &mut configs {
            c.set_origin(origin);
        }
        self.acquisition.evaluate_configs(&configs)
    }

    /// Jointly minimizes the negated acquisition over one seed group.
    fn refine_batch(&self, seeds: &[Vec<f64>]) -> Result<Vec<ScoredConfiguration>> {
        let d = self.space.len();
        let flattened: Vec<f64> = seeds.iter().flatten().copied().collect();
        let mut objective = |x: &[f64]| {
            let mut total = 0.0;
            for member in x.chunks(d) {
                total -= self.acquisition.evaluate(member)?;
            }
            Ok(total)
        };
        let outcome = minimize::nelder_mead(&mut objective, &flattened, self.max_iter)?;

        let mut refined = Vec::with_capacity(seeds.len());
        for member in outcome.x.chunks(d) {
            let acq_value = self.acquisition.evaluate(member)?;
            let config = self.space.from_unit_vector(member, Origin::BatchMinimizer)?;
            refined.push(ScoredConfiguration { acq_value, config });
        }
        Ok(refined)
    }
}

impl AcquisitionMaximizer for StagedBatchOptimizer {
    fn rank(
        &self,
        _history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let mut rng = self.rng.lock();

        let mut combined = self.score_pool(&mut rng, self.num_random, Origin::RandomSearch);

        let mut raw = self.score_pool(&mut rng, self.raw_samples, Origin::RandomSearch);
        sort_by_acq_value(&mut rng, &mut raw);
        let seeds: Vec<Vec<f64>> = raw
            .into_iter()
            .take(self.num_restarts)
            .map(|s| s.config.unit_vector().to_vec())
            .collect();

        for batch in seeds.chunks(self.batch_limit) {
            match self.refine_batch(batch) {
                Ok(refined) => combined.extend(refined),
                Err(err) => {
                    trace_warn!("batch minimization failed, keeping random pool: {err}");
                }
            }
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

#[cfg(test)]
mod tests {
    use super::*;
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

    fn acq() -> Arc<dyn AcquisitionFunction> {
        Arc::new(|p: &[f64]| Ok::<_, crate::Error>(-((p[0] - 0.5).powi(2) + p[1].powi(2))))
    }

    fn small(seed: u64, acquisition: Arc<dyn AcquisitionFunction>) -> StagedBatchOptimizer {
        StagedBatchOptimizer::new(acquisition, space(), seed)
            .unwrap()
            .with_stage_sizes(30, 6, 40, 2)
    }

    #[test]
    fn test_output_contains_refined_batches() {
        let optimizer = small(42, acq());
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = optimizer.rank(&history, 20).unwrap();
        assert!(ranked.windows(2).all(|w| w[0].acq_value >= w[1].acq_value));
        let refined = ranked
            .iter()
            .filter(|s| s.config.origin() == Origin::BatchMinimizer)
            .count();
        assert_eq!(refined, 6);
        assert!(ranked
            .iter()
            .any(|s| s.config.origin() == Origin::RandomSearch));
    }

    #[test]
    fn test_batch_refinement_improves_on_seeds() {
        let optimizer = small(7, acq());
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = optimizer.rank(&history, 20).unwrap();
        // Best candidate should come from a refined batch, near the peak.
        assert_eq!(ranked[0].config.origin(), Origin::BatchMinimizer);
        assert!(ranked[0].acq_value > -1e-2);
    }

    #[test]
    fn test_degrades_to_random_pool_when_batches_fail() {
        use core::sync::atomic::{AtomicUsize, Ordering};
        struct Flaky(AtomicUsize);
        impl AcquisitionFunction for Flaky {
            fn evaluate(&self, point: &[f64]) -> crate::Result<f64> {
                // Pool and raw-sample scoring succeed (70 calls), batch
                // refinement fails.
                if self.0.fetch_add(1, Ordering::Relaxed) < 70 {
                    Ok(point[0])
                } else {
                    Err(crate::Error::Acquisition("model not fit".into()))
                }
            }
        }
        let optimizer = small(5, Arc::new(Flaky(AtomicUsize::new(0))));
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = optimizer.rank(&history, 20).unwrap();
        assert!(!ranked.is_empty());
        assert!(ranked
            .iter()
            .all(|s| s.config.origin() == Origin::RandomSearch));
    }
}
