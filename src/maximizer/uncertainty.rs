//! Ranking of precomputed candidate/uncertainty pairs.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::acquisition::PrecomputedCandidates;
use crate::challenger::ChallengerList;
use crate::chooser::{shared, RandomChooser, SharedChooser};
use crate::config::{sort_by_acq_value, ScoredConfiguration};
use crate::error::{Error, Result};
use crate::history::HistoryContainer;
use crate::maximizer::{wrap_challengers, AcquisitionMaximizer};
use crate::rng_util;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// Ranks candidates a multi-objective acquisition has already produced.
///
/// Pareto-front estimators score their own candidate set while computing
/// the front, so this selector never evaluates anything itself. It pairs
/// each precomputed candidate vector with its uncertainty score, ranks
/// descending, and wraps the result.
pub struct UncertaintySelector<A: PrecomputedCandidates + Send + Sync> {
    source: Arc<A>,
    space: Arc<ConfigurationSpace>,
    rng: Mutex<fastrand::Rng>,
    chooser: SharedChooser,
}

impl<A: PrecomputedCandidates + Send + Sync> UncertaintySelector<A> {
    /// Creates the selector.
    #[must_use]
    pub fn new(source: Arc<A>, space: Arc<ConfigurationSpace>, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let chooser_seed = rng.u64(..);
        Self {
            source,
            space,
            rng: Mutex::new(rng),
            chooser: shared(RandomChooser::prob(0.0, chooser_seed)),
        }
    }
}

impl<A: PrecomputedCandidates + Send + Sync> AcquisitionMaximizer for UncertaintySelector<A> {
    fn rank(
        &self,
        _history: &HistoryContainer,
        num_points: usize,
    ) -> Result<Vec<ScoredConfiguration>> {
        let candidates = self.source.candidates();
        let uncertainties = self.source.uncertainties();
        if candidates.len() != uncertainties.len() {
            return Err(Error::DimensionMismatch {
                expected: candidates.len(),
                got: uncertainties.len(),
            });
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for (vector, &uncertainty) in candidates.iter().zip(uncertainties) {
            let config = self.space.from_unit_vector(vector, Origin::Uncertainty)?;
            scored.push(ScoredConfiguration {
                acq_value: uncertainty,
                config,
            });
        }

        let mut rng = self.rng.lock();
        sort_by_acq_value(&mut rng, &mut scored);
        scored.truncate(num_points.max(1));
        Ok(scored)
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

    struct Front {
        candidates: Vec<Vec<f64>>,
        uncertainties: Vec<f64>,
    }

    impl PrecomputedCandidates for Front {
        fn candidates(&self) -> &[Vec<f64>] {
            &self.candidates
        }
        fn uncertainties(&self) -> &[f64] {
            &self.uncertainties
        }
    }

    fn space() -> Arc<ConfigurationSpace> {
        Arc::new(
            ConfigurationSpace::new(vec![
                ParameterDef::float("x", 0.0, 1.0, 0.5),
                ParameterDef::float("y", 0.0, 1.0, 0.5),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_ranks_precomputed_pairs_descending() {
        let front = Front {
            candidates: vec![vec![0.1, 0.2], vec![0.9, 0.9], vec![0.4, 0.5]],
            uncertainties: vec![0.3, 0.8, 0.1],
        };
        let selector = UncertaintySelector::new(Arc::new(front), space(), 42);
        let history = HistoryContainer::new(Direction::Minimize);
        let ranked = selector.rank(&history, 10).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].acq_value, 0.8);
        assert_eq!(ranked[2].acq_value, 0.1);
        assert!(ranked.iter().all(|s| s.config.origin() == Origin::Uncertainty));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let front = Front {
            candidates: vec![vec![0.1, 0.2]],
            uncertainties: vec![0.3, 0.8],
        };
        let selector = UncertaintySelector::new(Arc::new(front), space(), 42);
        let history = HistoryContainer::new(Direction::Minimize);
        assert!(matches!(
            selector.rank(&history, 5),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_truncates_to_num_points() {
        let front = Front {
            candidates: (0..6).map(|i| vec![f64::from(i) / 10.0, 0.5]).collect(),
            uncertainties: (0..6).map(f64::from).collect(),
        };
        let selector = UncertaintySelector::new(Arc::new(front), space(), 1);
        let history = HistoryContainer::new(Direction::Minimize);
        assert_eq!(selector.rank(&history, 4).unwrap().len(), 4);
    }
}
