//! Acquisition function seams.
//!
//! The surrogate model itself is an external collaborator; this crate only
//! consumes scalar acquisition scores through [`AcquisitionFunction`].
//! Evaluations are fallible per candidate so callers can distinguish "no
//! improvement found" from "evaluation crashed" and skip broken candidates
//! without aborting the proposal round.

use crate::config::{Configuration, ScoredConfiguration};
use crate::error::Result;

/// Scalar desirability score for candidate configurations; higher is better.
///
/// Implementations receive the unit-hypercube encoding of a configuration.
/// `Send + Sync` is required so maximizers can be shared across threads the
/// same way samplers are in the surrounding tuning stack.
pub trait AcquisitionFunction: Send + Sync {
    /// Evaluates the acquisition value at a unit-hypercube point.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Acquisition`] when the underlying surrogate
    /// cannot score the point. Callers skip the candidate and continue.
    fn evaluate(&self, point: &[f64]) -> Result<f64>;

    /// Evaluates a batch of configurations, pairing each with its score.
    ///
    /// Failed evaluations are dropped from the result; batch evaluation
    /// never fails as a whole.
    fn evaluate_configs(&self, configs: &[Configuration]) -> Vec<ScoredConfiguration> {
        configs
            .iter()
            .filter_map(|config| match self.evaluate(config.unit_vector()) {
                Ok(acq_value) => Some(ScoredConfiguration {
                    acq_value,
                    config: config.clone(),
                }),
                Err(err) => {
                    trace_warn!("skipping candidate after failed acquisition eval: {err}");
                    None
                }
            })
            .collect()
    }
}

impl<F> AcquisitionFunction for F
where
    F: Fn(&[f64]) -> Result<f64> + Send + Sync,
{
    fn evaluate(&self, point: &[f64]) -> Result<f64> {
        self(point)
    }
}

/// Candidate/score pairs computed by a multi-objective acquisition upstream.
///
/// Used by the uncertainty-driven selector: when the acquisition is itself a
/// Pareto-hypervolume estimator it has already produced its own candidates
/// and uncertainty scores, and the maximizer only ranks and wraps them.
pub trait PrecomputedCandidates {
    /// Candidate points in the unit hypercube.
    fn candidates(&self) -> &[Vec<f64>];

    /// One uncertainty score per candidate; higher means more worth testing.
    fn uncertainties(&self) -> &[f64];
}
