//! Core types shared across the crate.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The direction of optimization for the external objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Smaller objective values are better.
    Minimize,
    /// Larger objective values are better.
    Maximize,
}

impl Direction {
    /// Returns `true` if `a` is a strictly better objective value than `b`.
    #[must_use]
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Minimize => a < b,
            Direction::Maximize => a > b,
        }
    }
}

/// The terminal state of an externally evaluated trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrialState {
    /// The benchmark run completed and produced a valid objective value.
    Success,
    /// The benchmark run failed; the objective value is not trustworthy.
    Failed,
}

/// Provenance tag recording which strategy produced a configuration.
///
/// Used only for diagnostics; it never participates in equality or hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Origin {
    /// The configuration space's default configuration.
    Default,
    /// Produced by hill climbing over the one-exchange neighborhood.
    LocalSearch,
    /// Drawn uniformly at random from the configuration space.
    RandomSearch,
    /// Drawn at random, then ranked by acquisition value.
    RandomSearchSorted,
    /// Produced by a single-start continuous minimizer run.
    ContinuousMinimizer,
    /// Produced by a jointly optimized batch of continuous seeds.
    BatchMinimizer,
    /// Produced by population-based global continuous search.
    GlobalMinimizer,
    /// Part of a precomputed initial design (warmup phase).
    InitialDesign,
    /// Ranked from precomputed multi-objective uncertainty scores.
    Uncertainty,
    /// Proposed by the trainable reinforcement-learning policy.
    Policy,
}

impl core::fmt::Display for Origin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Origin::Default => "Default",
            Origin::LocalSearch => "Local Search",
            Origin::RandomSearch => "Random Search",
            Origin::RandomSearchSorted => "Random Search (sorted)",
            Origin::ContinuousMinimizer => "Continuous Minimizer",
            Origin::BatchMinimizer => "Batch Minimizer",
            Origin::GlobalMinimizer => "Global Minimizer",
            Origin::InitialDesign => "Initial Design",
            Origin::Uncertainty => "Uncertainty",
            Origin::Policy => "Policy",
        };
        f.write_str(s)
    }
}
