#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Acquisition-maximization core for black-box configuration tuning.
//!
//! Given an externally fitted acquisition function (expected improvement,
//! Pareto hypervolume, anything scoring a configuration), this crate finds
//! the configurations to evaluate next: discrete local search with
//! plateau/early-stop heuristics, sorted random search, gradient-free
//! continuous minimization over the unit hypercube, batched and staged
//! variants, and a DDPG-style reinforcement-learning proposer. It also owns
//! the bookkeeping the surrounding tuning loop depends on: challenger
//! queues with on-the-fly random injection, and an observation history that
//! distinguishes real evaluations from synthetic ones.
//!
//! # Getting Started
//!
//! ```
//! use acqmax::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> acqmax::Result<()> {
//! let space = Arc::new(ConfigurationSpace::new(vec![
//!     ParameterDef::float("cache_ratio", 0.0, 1.0, 0.5),
//!     ParameterDef::int("io_threads", 1, 64, 4),
//! ])?);
//!
//! // Stand-in for a surrogate-model acquisition function.
//! let acquisition: Arc<dyn AcquisitionFunction> =
//!     Arc::new(|point: &[f64]| Ok::<_, acqmax::Error>((point[0] - 0.7).powi(2) * -1.0));
//!
//! let maximizer = InterleavedLocalAndRandomSearch::new(acquisition, Arc::clone(&space), 42);
//! let history = HistoryContainer::new(Direction::Minimize);
//!
//! for challenger in maximizer.maximize(&history, 8)? {
//!     // Evaluate `challenger` externally, then append an Observation.
//!     let _ = challenger;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`ConfigurationSpace`](space::ConfigurationSpace) | Parameter definitions, unit-hypercube encoding, neighborhoods. |
//! | [`AcquisitionFunction`](acquisition::AcquisitionFunction) | Externally fitted scorer; higher is better. |
//! | [`AcquisitionMaximizer`](maximizer::AcquisitionMaximizer) | Strategy producing a ranked candidate list. |
//! | [`ChallengerList`](challenger::ChallengerList) | Single-pass candidate queue with chooser-driven random injection. |
//! | [`HistoryContainer`] | Append-only observation record with the real/synthetic flag. |
//! | [`RlProposer`](rl::RlProposer) | Warmup/episode state machine around a trainable [`Policy`](rl::Policy). |
//!
//! # Maximizer Guide
//!
//! | Strategy | Approach | Space |
//! |----------|----------|-------|
//! | [`LocalSearch`](maximizer::LocalSearch) | One-exchange hill climbing from promising starts | any |
//! | [`RandomSearch`](maximizer::RandomSearch) | Uniform sampling, optionally acquisition-sorted | any |
//! | [`InterleavedLocalAndRandomSearch`](maximizer::InterleavedLocalAndRandomSearch) | Local search blended with sorted random search | any |
//! | [`ContinuousOptimizer`](maximizer::ContinuousOptimizer) | Single-start simplex minimization | numeric |
//! | [`GlobalContinuousOptimizer`](maximizer::GlobalContinuousOptimizer) | Differential evolution | numeric |
//! | [`MultiStartContinuousOptimizer`](maximizer::MultiStartContinuousOptimizer) | Random-seeded restarts | numeric |
//! | [`StagedBatchOptimizer`](maximizer::StagedBatchOptimizer) | Joint minimization of seed batches | numeric |
//! | [`McGradientOptimizer`](maximizer::McGradientOptimizer) | Monte-Carlo pool plus local refinement | numeric |
//! | [`UncertaintySelector`](maximizer::UncertaintySelector) | Ranks precomputed Pareto candidates | any |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public value types | off |
//! | `checkpoint` | JSON persistence of the RL metric normalizer (enables `serde`) | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key decision points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
pub mod challenger;
pub mod chooser;
mod config;
mod distribution;
mod error;
pub mod history;
pub mod maximizer;
mod param;
pub mod rl;
mod rng_util;
pub mod space;
mod types;

pub use config::{sort_by_acq_value, sort_by_acq_value_stable, Configuration, ScoredConfiguration};
pub use distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
pub use error::{Error, Result};
pub use history::{HistoryContainer, Observation};
pub use param::ParamValue;
pub use types::{Direction, Origin, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use acqmax::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::{AcquisitionFunction, PrecomputedCandidates};
    pub use crate::challenger::ChallengerList;
    pub use crate::chooser::{ChooserPolicy, RandomChooser};
    pub use crate::config::{Configuration, ScoredConfiguration};
    pub use crate::error::{Error, Result};
    pub use crate::history::{HistoryContainer, Observation};
    pub use crate::maximizer::{
        AcquisitionMaximizer, ContinuousOptimizer, GlobalContinuousOptimizer,
        InterleavedLocalAndRandomSearch, LocalSearch, McGradientOptimizer,
        MultiStartContinuousOptimizer, RandomSearch, StagedBatchOptimizer, UncertaintySelector,
    };
    pub use crate::param::ParamValue;
    pub use crate::rl::{
        InitStrategy, MetricNormalizer, Policy, PolicyBuilder, RlConfig, RlPhase, RlProposer,
    };
    pub use crate::space::{ConfigurationSpace, ParameterDef};
    pub use crate::types::{Direction, Origin, TrialState};
}
