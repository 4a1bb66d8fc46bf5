#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds for '{name}': low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The name of the offending parameter.
        name: String,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when categorical choices are empty.
    #[error("categorical parameter '{0}' must have at least one choice")]
    EmptyChoices(String),

    /// Returned when a maximizer is constructed over a space it cannot handle.
    ///
    /// This is a programming/configuration error and is reported at
    /// construction time, e.g. a categorical dimension fed to a
    /// continuous-only optimizer.
    #[error("unsupported parameter '{name}': {reason}")]
    UnsupportedParameter {
        /// The name of the offending parameter.
        name: String,
        /// Why the parameter cannot be handled.
        reason: String,
    },

    /// Returned when a vector has the wrong dimensionality for the space.
    #[error("dimension mismatch: expected {expected} dimensions but got {got}")]
    DimensionMismatch {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of dimensions.
        got: usize,
    },

    /// Returned when an acquisition evaluation fails for a candidate.
    ///
    /// Callers treat this as a recoverable, per-candidate condition: the
    /// candidate is skipped and the proposal round continues.
    #[error("acquisition evaluation failed: {0}")]
    Acquisition(String),

    /// Returned when a continuous minimizer run produces no usable point.
    #[error("minimizer failed: {0}")]
    MinimizerFailed(String),

    /// Returned when an ensemble round is recorded with no observations.
    #[error("ensemble round requires at least one observation")]
    EmptyEnsembleRound,

    /// Returned when metric statistics are requested with no samples.
    #[error("no internal metrics available for normalization")]
    NoInternalMetrics,

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when a checkpoint read or write fails.
    #[cfg(feature = "checkpoint")]
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

pub type Result<T> = core::result::Result<T, Error>;
