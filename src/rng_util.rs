/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Sample a value from the standard normal distribution using the
/// Box-Muller transform.
pub(crate) fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    let u1 = f64::EPSILON + rng.f64() * (1.0 - f64::EPSILON);
    let u2 = rng.f64() * core::f64::consts::TAU;
    (-2.0 * u1.ln()).sqrt() * u2.cos()
}

/// Fork a child RNG from a parent, keeping determinism under a fixed seed.
#[inline]
pub(crate) fn fork(rng: &mut fastrand::Rng) -> fastrand::Rng {
    fastrand::Rng::with_seed(rng.u64(..))
}
