//! Acquisition-maximization strategies.
//!
//! Every strategy implements [`AcquisitionMaximizer`]: a low-level
//! [`rank`](AcquisitionMaximizer::rank) producing `(acq_value,
//! configuration)` pairs sorted descending, and a high-level
//! [`maximize`](AcquisitionMaximizer::maximize) wrapping that ranking in a
//! [`ChallengerList`] so the tuning loop can interleave random
//! configurations while consuming candidates. Shared ranking/tie-break logic
//! lives in free functions ([`crate::config::sort_by_acq_value`]) rather
//! than a base class.

pub mod continuous;
pub mod interleaved;
pub mod local_search;
pub mod mc_gradient;
pub mod random_search;
pub mod staged_batch;
pub mod uncertainty;

mod minimize;

use std::sync::Arc;

use crate::challenger::ChallengerList;
use crate::chooser::SharedChooser;
use crate::config::ScoredConfiguration;
use crate::error::{Error, Result};
use crate::history::HistoryContainer;
use crate::space::ConfigurationSpace;

pub use continuous::{
    ContinuousOptimizer, GlobalContinuousOptimizer, MultiStartContinuousOptimizer,
};
pub use interleaved::InterleavedLocalAndRandomSearch;
pub use local_search::LocalSearch;
pub use mc_gradient::McGradientOptimizer;
pub use random_search::RandomSearch;
pub use staged_batch::StagedBatchOptimizer;
pub use uncertainty::UncertaintySelector;

/// Pluggable acquisition-maximization strategy.
pub trait AcquisitionMaximizer: Send + Sync {
    /// Produces a ranked candidate list, sorted descending by acquisition
    /// value with seeded random tie-break.
    ///
    /// # Errors
    ///
    /// Only construction-grade failures abort a round; per-candidate
    /// evaluation failures are skipped internally.
    fn rank(&self, history: &HistoryContainer, num_points: usize)
        -> Result<Vec<ScoredConfiguration>>;

    /// Produces a [`ChallengerList`] for the tuning loop to consume.
    ///
    /// Advances the strategy's chooser by one SMBO iteration.
    ///
    /// # Errors
    ///
    /// Same failure contract as [`rank`](Self::rank).
    fn maximize(&self, history: &HistoryContainer, num_points: usize) -> Result<ChallengerList>;
}

/// Wraps a ranking into a `ChallengerList` and closes the proposal round.
pub(crate) fn wrap_challengers(
    ranked: Vec<ScoredConfiguration>,
    space: &Arc<ConfigurationSpace>,
    chooser: &SharedChooser,
    rng: fastrand::Rng,
) -> ChallengerList {
    let configs = ranked.into_iter().map(|s| s.config).collect();
    let list = ChallengerList::new(configs, Arc::clone(space), Arc::clone(chooser), rng);
    chooser.lock().next_smbo_iteration();
    list
}

/// Fails fast when a continuous-only optimizer is built over a space with
/// non-numeric dimensions.
pub(crate) fn ensure_numeric(space: &ConfigurationSpace) -> Result<()> {
    if let Some(param) = space.first_categorical() {
        return Err(Error::UnsupportedParameter {
            name: param.name.clone(),
            reason: "continuous optimizers support only numeric (float/int) dimensions".to_string(),
        });
    }
    Ok(())
}
