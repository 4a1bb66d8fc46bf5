//! Trainable policy abstraction.
//!
//! The proposer drives any actor-critic style model through this trait;
//! network internals, optimizer state, and checkpoint formats stay opaque.

use crate::error::Result;
use crate::rl::config::RlConfig;
use crate::rl::replay::Transition;

/// A trainable action-proposing model.
pub trait Policy: Send {
    /// Proposes an action in `[0, 1]^d` for the given normalized state.
    ///
    /// `noise_scale` controls exploration noise: 1.0 for a full-noise
    /// exploration draw, a decayed value for exploitation.
    fn choose_action(&mut self, state: &[f64], noise_scale: f64) -> Vec<f64>;

    /// Performs one mini-batch update and returns the training loss.
    fn update(&mut self, batch: &[Transition], config: &RlConfig) -> f64;

    /// Persists model state, keyed by task id and global step.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkpoint cannot be written; the proposer
    /// logs and continues.
    fn checkpoint(&mut self, task_id: &str, global_step: usize) -> Result<()>;
}

/// Deferred policy construction.
///
/// The proposer learns the state dimensionality only after warmup, so the
/// policy is built from collected metrics rather than up front.
pub trait PolicyBuilder: Send {
    /// Builds a policy for `n_states` metric dimensions and `n_actions`
    /// configuration dimensions.
    fn build(&self, n_states: usize, n_actions: usize, config: &RlConfig) -> Box<dyn Policy>;
}
