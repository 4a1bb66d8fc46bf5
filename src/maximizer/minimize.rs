//! Gradient-free minimization primitives over the unit hypercube.
//!
//! All continuous maximizer variants minimize the negated acquisition
//! function with these routines. Evaluation failures propagate as errors so
//! callers can treat a restart as failed and move on.

use crate::error::Result;
use crate::rng_util;

/// Result of a minimization run.
pub(crate) struct MinimizeOutcome {
    /// Best point found, inside `[0, 1]^d`.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Whether the run met its convergence tolerance before the
    /// iteration cap.
    pub converged: bool,
}

/// Simplex spread below which Nelder-Mead is considered converged.
const SIMPLEX_TOLERANCE: f64 = 1e-9;

/// Initial simplex edge length per dimension.
const SIMPLEX_EDGE: f64 = 0.05;

/// Nelder-Mead simplex minimization clamped to the unit hypercube.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn nelder_mead(
    f: &mut dyn FnMut(&[f64]) -> Result<f64>,
    x0: &[f64],
    max_iter: usize,
) -> Result<MinimizeOutcome> {
    let d = x0.len();
    let clamp = |x: &mut Vec<f64>| {
        for v in x.iter_mut() {
            *v = v.clamp(0.0, 1.0);
        }
    };

    // Initial simplex: x0 plus one perturbed vertex per dimension.
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(d + 1);
    let base = x0.to_vec();
    let base_val = f(&base)?;
    simplex.push((base, base_val));
    for i in 0..d {
        let mut vertex = x0.to_vec();
        vertex[i] = if vertex[i] + SIMPLEX_EDGE <= 1.0 {
            vertex[i] + SIMPLEX_EDGE
        } else {
            vertex[i] - SIMPLEX_EDGE
        };
        clamp(&mut vertex);
        let value = f(&vertex)?;
        simplex.push((vertex, value));
    }

    let mut converged = false;
    for _ in 0..max_iter {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let spread = simplex[d].1 - simplex[0].1;
        if spread.abs() < SIMPLEX_TOLERANCE {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; d];
        for (vertex, _) in &simplex[..d] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / d as f64;
            }
        }

        let worst = simplex[d].clone();
        let mut reflected: Vec<f64> = centroid
            .iter()
            .zip(&worst.0)
            .map(|(c, w)| c + (c - w))
            .collect();
        clamp(&mut reflected);
        let reflected_val = f(&reflected)?;

        if reflected_val < simplex[0].1 {
            // Try expanding past the reflection.
            let mut expanded: Vec<f64> = centroid
                .iter()
                .zip(&worst.0)
                .map(|(c, w)| c + 2.0 * (c - w))
                .collect();
            clamp(&mut expanded);
            let expanded_val = f(&expanded)?;
            simplex[d] = if expanded_val < reflected_val {
                (expanded, expanded_val)
            } else {
                (reflected, reflected_val)
            };
        } else if reflected_val < simplex[d - 1].1 {
            simplex[d] = (reflected, reflected_val);
        } else {
            let mut contracted: Vec<f64> = centroid
                .iter()
                .zip(&worst.0)
                .map(|(c, w)| c + 0.5 * (w - c))
                .collect();
            clamp(&mut contracted);
            let contracted_val = f(&contracted)?;
            if contracted_val < worst.1 {
                simplex[d] = (contracted, contracted_val);
            } else {
                // Shrink toward the best vertex.
                let best = simplex[0].0.clone();
                for entry in simplex.iter_mut().skip(1) {
                    let mut shrunk: Vec<f64> = best
                        .iter()
                        .zip(&entry.0)
                        .map(|(b, v)| b + 0.5 * (v - b))
                        .collect();
                    clamp(&mut shrunk);
                    let value = f(&shrunk)?;
                    *entry = (shrunk, value);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex.swap_remove(0);
    Ok(MinimizeOutcome { x, value, converged })
}

/// DE/rand/1/bin global minimization over `[0, 1]^d`.
pub(crate) fn differential_evolution(
    f: &mut dyn FnMut(&[f64]) -> Result<f64>,
    dim: usize,
    rng: &mut fastrand::Rng,
    population_size: usize,
    max_generations: usize,
    mutation_factor: f64,
    crossover_rate: f64,
) -> Result<MinimizeOutcome> {
    let pop_size = population_size.max(4);
    let mut population: Vec<Vec<f64>> = (0..pop_size)
        .map(|_| (0..dim).map(|_| rng.f64()).collect())
        .collect();
    let mut values: Vec<f64> = Vec::with_capacity(pop_size);
    for member in &population {
        values.push(f(member)?);
    }

    for _ in 0..max_generations {
        for i in 0..pop_size {
            // Three distinct members, all different from i.
            let mut pick = || loop {
                let r = rng.usize(0..pop_size);
                if r != i {
                    return r;
                }
            };
            let (r1, r2, r3) = (pick(), pick(), pick());

            let forced = rng.usize(0..dim);
            let mut trial: Vec<f64> = (0..dim)
                .map(|j| {
                    if j == forced || rng.f64() < crossover_rate {
                        let v = population[r1][j]
                            + mutation_factor * (population[r2][j] - population[r3][j]);
                        v.clamp(0.0, 1.0)
                    } else {
                        population[i][j]
                    }
                })
                .collect();
            let trial_val = f(&trial)?;
            if trial_val <= values[i] {
                core::mem::swap(&mut population[i], &mut trial);
                values[i] = trial_val;
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    Ok(MinimizeOutcome {
        x: population.swap_remove(best),
        value: values[best],
        converged: true,
    })
}

/// Uniform random point in the unit hypercube.
pub(crate) fn random_point(rng: &mut fastrand::Rng, dim: usize) -> Vec<f64> {
    (0..dim).map(|_| rng_util::f64_range(rng, 0.0, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(center: f64) -> impl FnMut(&[f64]) -> Result<f64> {
        move |x: &[f64]| Ok(x.iter().map(|v| (v - center).powi(2)).sum())
    }

    #[test]
    fn test_nelder_mead_finds_interior_minimum() {
        let mut f = sphere(0.3);
        let outcome = nelder_mead(&mut f, &[0.9, 0.9], 500).unwrap();
        assert!(outcome.converged);
        for v in &outcome.x {
            assert!((v - 0.3).abs() < 1e-3);
        }
    }

    #[test]
    fn test_nelder_mead_stays_in_bounds() {
        // Minimum outside the cube pulls toward the boundary.
        let mut f = sphere(1.5);
        let outcome = nelder_mead(&mut f, &[0.2, 0.2], 500).unwrap();
        for v in &outcome.x {
            assert!((0.0..=1.0).contains(v));
            assert!((v - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_nelder_mead_propagates_evaluation_failure() {
        let mut calls = 0;
        let mut f = |_: &[f64]| {
            calls += 1;
            if calls > 3 {
                Err(crate::Error::Acquisition("surrogate went away".into()))
            } else {
                Ok(1.0)
            }
        };
        assert!(nelder_mead(&mut f, &[0.5, 0.5, 0.5], 100).is_err());
    }

    #[test]
    fn test_differential_evolution_finds_minimum() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut f = sphere(0.6);
        let outcome = differential_evolution(&mut f, 3, &mut rng, 20, 60, 0.8, 0.9).unwrap();
        assert!(outcome.value < 1e-3);
    }
}
