//! Bounded, mixed-type configuration space.
//!
//! The space owns the parameter definitions and is the only place where
//! [`Configuration`]s are built, so every configuration in circulation is
//! canonical: values are clamped into bounds, snapped onto step grids, and
//! paired with a matching unit-hypercube encoding. Strategies consume the
//! space through sampling, the default configuration, and one-exchange
//! neighborhood generation.

use crate::config::Configuration;
use crate::distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::rng_util;
use crate::types::Origin;

/// Number of gaussian draws per numeric dimension when generating the
/// one-exchange neighborhood.
const NEIGHBORS_PER_NUMERIC_DIM: usize = 4;

/// Relative standard deviation of neighborhood moves in unit space.
const NEIGHBOR_STDDEV: f64 = 0.2;

/// Attempts before duplicate-avoiding sampling gives up and accepts a repeat.
const MAX_DISTINCT_SAMPLE_ATTEMPTS: usize = 1000;

/// A named parameter with its distribution and default value.
#[derive(Clone, Debug)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. a database knob name).
    pub name: String,
    /// The value distribution of this parameter.
    pub distribution: Distribution,
    /// The default value, used for the space's default configuration.
    pub default: ParamValue,
}

impl ParameterDef {
    /// Defines a float parameter on `[low, high]`.
    pub fn float(name: impl Into<String>, low: f64, high: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Float(FloatDistribution {
                low,
                high,
                step: None,
            }),
            default: ParamValue::Float(default),
        }
    }

    /// Defines a float parameter discretized onto a step grid.
    pub fn float_step(name: impl Into<String>, low: f64, high: f64, step: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Float(FloatDistribution {
                low,
                high,
                step: Some(step),
            }),
            default: ParamValue::Float(default),
        }
    }

    /// Defines an integer parameter on `[low, high]`.
    pub fn int(name: impl Into<String>, low: i64, high: i64, default: i64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Int(IntDistribution {
                low,
                high,
                step: None,
            }),
            default: ParamValue::Int(default),
        }
    }

    /// Defines a categorical parameter with `n_choices` choices.
    pub fn categorical(name: impl Into<String>, n_choices: usize, default: usize) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Categorical(CategoricalDistribution { n_choices }),
            default: ParamValue::Categorical(default),
        }
    }
}

/// Bounded, possibly mixed-type parameter space.
#[derive(Clone, Debug)]
pub struct ConfigurationSpace {
    params: Vec<ParameterDef>,
}

impl ConfigurationSpace {
    /// Creates a space from parameter definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if any parameter has `low > high`
    /// and [`Error::EmptyChoices`] for a categorical with zero choices.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(params: Vec<ParameterDef>) -> Result<Self> {
        for p in &params {
            match &p.distribution {
                Distribution::Float(d) => {
                    if d.low > d.high {
                        return Err(Error::InvalidBounds {
                            name: p.name.clone(),
                            low: d.low,
                            high: d.high,
                        });
                    }
                }
                Distribution::Int(d) => {
                    if d.low > d.high {
                        return Err(Error::InvalidBounds {
                            name: p.name.clone(),
                            low: d.low as f64,
                            high: d.high as f64,
                        });
                    }
                }
                Distribution::Categorical(d) => {
                    if d.n_choices == 0 {
                        return Err(Error::EmptyChoices(p.name.clone()));
                    }
                }
            }
        }
        Ok(Self { params })
    }

    /// Returns the number of parameters (dimensions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the space has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the parameter definitions.
    #[must_use]
    pub fn params(&self) -> &[ParameterDef] {
        &self.params
    }

    /// Returns `true` if every dimension is numeric (float or int).
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.params.iter().all(|p| p.distribution.is_numeric())
    }

    /// Returns the first non-numeric parameter, if any.
    #[must_use]
    pub fn first_categorical(&self) -> Option<&ParameterDef> {
        self.params.iter().find(|p| !p.distribution.is_numeric())
    }

    /// Returns the default configuration of the space.
    #[must_use]
    pub fn default_configuration(&self) -> Configuration {
        let values: Vec<ParamValue> = self
            .params
            .iter()
            .map(|p| self.canonicalize(&p.distribution, &p.default))
            .collect();
        let vector = self.encode(&values);
        Configuration::new(values, vector, Origin::Default)
    }

    /// Draws one configuration uniformly at random.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Configuration {
        let values: Vec<ParamValue> = self
            .params
            .iter()
            .map(|p| sample_random(rng, &p.distribution))
            .collect();
        let vector = self.encode(&values);
        Configuration::new(values, vector, Origin::RandomSearch)
    }

    /// Draws `n` configurations uniformly at random.
    pub fn sample_many(&self, rng: &mut fastrand::Rng, n: usize) -> Vec<Configuration> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Draws `n` configurations avoiding duplicates among themselves and
    /// against `excluded`.
    ///
    /// Gives up on distinctness for a slot after a bounded number of
    /// attempts and accepts the repeat, so small or heavily discretized
    /// spaces cannot stall the caller.
    pub fn sample_distinct(
        &self,
        rng: &mut fastrand::Rng,
        n: usize,
        excluded: &[Configuration],
    ) -> Vec<Configuration> {
        let mut configs: Vec<Configuration> = Vec::with_capacity(n);
        let mut attempts = 0usize;
        while configs.len() < n {
            let config = self.sample(rng);
            attempts += 1;
            if !configs.contains(&config) && !excluded.contains(&config) {
                configs.push(config);
                attempts = 0;
                continue;
            }
            if attempts >= MAX_DISTINCT_SAMPLE_ATTEMPTS {
                trace_warn!(
                    "could not sample a non-duplicate configuration after {} attempts",
                    MAX_DISTINCT_SAMPLE_ATTEMPTS
                );
                configs.push(config);
                attempts = 0;
            }
        }
        configs
    }

    /// Builds a canonical configuration from decoded values.
    ///
    /// Values are clamped into bounds and snapped onto step grids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `values` has the wrong length.
    pub fn from_values(&self, values: &[ParamValue], origin: Origin) -> Result<Configuration> {
        if values.len() != self.params.len() {
            return Err(Error::DimensionMismatch {
                expected: self.params.len(),
                got: values.len(),
            });
        }
        let canonical: Vec<ParamValue> = self
            .params
            .iter()
            .zip(values)
            .map(|(p, v)| self.canonicalize(&p.distribution, v))
            .collect();
        let vector = self.encode(&canonical);
        Ok(Configuration::new(canonical, vector, origin))
    }

    /// Builds a canonical configuration from a unit-hypercube vector.
    ///
    /// Out-of-range components are clamped into `[0, 1]` first, which guards
    /// against numerical overshoot from continuous minimizers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `vector` has the wrong length.
    pub fn from_unit_vector(&self, vector: &[f64], origin: Origin) -> Result<Configuration> {
        if vector.len() != self.params.len() {
            return Err(Error::DimensionMismatch {
                expected: self.params.len(),
                got: vector.len(),
            });
        }
        let values: Vec<ParamValue> = self
            .params
            .iter()
            .zip(vector)
            .map(|(p, &u)| decode_unit(&p.distribution, u.clamp(0.0, 1.0)))
            .collect();
        let encoded = self.encode(&values);
        Ok(Configuration::new(values, encoded, origin))
    }

    /// Generates the one-exchange neighborhood of `base`.
    ///
    /// Each neighbor differs from `base` in exactly one parameter: every
    /// alternative choice for categorical dimensions, full enumeration for
    /// tiny integer ranges, and gaussian moves in unit space otherwise. The
    /// result is shuffled and truncated to `cap` entries.
    #[allow(clippy::cast_possible_wrap)]
    pub fn one_exchange_neighborhood(
        &self,
        base: &Configuration,
        rng: &mut fastrand::Rng,
        cap: usize,
    ) -> Vec<Configuration> {
        let mut neighbors: Vec<Configuration> = Vec::new();
        for (i, p) in self.params.iter().enumerate() {
            match &p.distribution {
                Distribution::Categorical(d) => {
                    let current = match base.values()[i] {
                        ParamValue::Categorical(idx) => idx,
                        _ => continue,
                    };
                    for choice in 0..d.n_choices {
                        if choice != current {
                            neighbors.push(self.replace_dim(
                                base,
                                i,
                                ParamValue::Categorical(choice),
                            ));
                        }
                    }
                }
                Distribution::Int(d) if span_steps(d) <= NEIGHBORS_PER_NUMERIC_DIM as i64 => {
                    let step = d.step.unwrap_or(1);
                    let mut v = d.low;
                    while v <= d.high {
                        if ParamValue::Int(v) != base.values()[i] {
                            neighbors.push(self.replace_dim(base, i, ParamValue::Int(v)));
                        }
                        v = v.saturating_add(step.max(1));
                    }
                }
                dist => {
                    let u = base.unit_vector()[i];
                    for _ in 0..NEIGHBORS_PER_NUMERIC_DIM {
                        let moved =
                            (u + NEIGHBOR_STDDEV * rng_util::standard_normal(rng)).clamp(0.0, 1.0);
                        let value = decode_unit(dist, moved);
                        if value != base.values()[i] {
                            neighbors.push(self.replace_dim(base, i, value));
                        }
                    }
                }
            }
        }
        rng.shuffle(&mut neighbors);
        neighbors.truncate(cap);
        neighbors
    }

    fn replace_dim(&self, base: &Configuration, dim: usize, value: ParamValue) -> Configuration {
        let mut values = base.values().to_vec();
        values[dim] = self.canonicalize(&self.params[dim].distribution, &value);
        let vector = self.encode(&values);
        Configuration::new(values, vector, base.origin())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn canonicalize(&self, dist: &Distribution, value: &ParamValue) -> ParamValue {
        match (dist, value) {
            (Distribution::Float(d), ParamValue::Float(v)) => {
                let v = if let Some(step) = d.step {
                    let k = ((v - d.low) / step).round();
                    d.low + k * step
                } else {
                    *v
                };
                ParamValue::Float(v.clamp(d.low, d.high))
            }
            (Distribution::Int(d), ParamValue::Int(v)) => {
                let v = if let Some(step) = d.step {
                    let k = ((v - d.low) as f64 / step as f64).round() as i64;
                    d.low.saturating_add(k.saturating_mul(step))
                } else {
                    *v
                };
                ParamValue::Int(v.clamp(d.low, d.high))
            }
            (Distribution::Categorical(d), ParamValue::Categorical(idx)) => {
                ParamValue::Categorical((*idx).min(d.n_choices - 1))
            }
            // Type mismatches fall back to the unit-cube midpoint; the space
            // constructors make this unreachable for well-formed callers.
            (dist, _) => decode_unit(dist, 0.5),
        }
    }

    fn encode(&self, values: &[ParamValue]) -> Vec<f64> {
        self.params
            .iter()
            .zip(values)
            .map(|(p, v)| encode_unit(&p.distribution, v))
            .collect()
    }
}

fn span_steps(d: &IntDistribution) -> i64 {
    let step = d.step.unwrap_or(1).max(1);
    (d.high - d.low) / step
}

/// Encode a canonical value into `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
fn encode_unit(dist: &Distribution, value: &ParamValue) -> f64 {
    match (dist, value) {
        (Distribution::Float(d), ParamValue::Float(v)) => {
            if d.high > d.low {
                (v - d.low) / (d.high - d.low)
            } else {
                0.0
            }
        }
        (Distribution::Int(d), ParamValue::Int(v)) => {
            if d.high > d.low {
                (v - d.low) as f64 / (d.high - d.low) as f64
            } else {
                0.0
            }
        }
        (Distribution::Categorical(d), ParamValue::Categorical(idx)) => {
            if d.n_choices > 1 {
                *idx as f64 / (d.n_choices - 1) as f64
            } else {
                0.0
            }
        }
        _ => 0.5,
    }
}

/// Decode a unit-cube coordinate into a canonical value.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn decode_unit(dist: &Distribution, u: f64) -> ParamValue {
    match dist {
        Distribution::Float(d) => {
            let v = d.low + u * (d.high - d.low);
            let v = if let Some(step) = d.step {
                let k = ((v - d.low) / step).round();
                d.low + k * step
            } else {
                v
            };
            ParamValue::Float(v.clamp(d.low, d.high))
        }
        Distribution::Int(d) => {
            let raw = d.low as f64 + u * (d.high - d.low) as f64;
            let v = if let Some(step) = d.step {
                let k = ((raw - d.low as f64) / step as f64).round() as i64;
                d.low.saturating_add(k.saturating_mul(step))
            } else {
                raw.round() as i64
            };
            ParamValue::Int(v.clamp(d.low, d.high))
        }
        Distribution::Categorical(d) => {
            let idx = (u * (d.n_choices - 1) as f64).round() as usize;
            ParamValue::Categorical(idx.min(d.n_choices - 1))
        }
    }
}

/// Sample a random value for any distribution.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn sample_random(rng: &mut fastrand::Rng, dist: &Distribution) -> ParamValue {
    match dist {
        Distribution::Float(d) => {
            let v = if let Some(step) = d.step {
                let n_steps = ((d.high - d.low) / step).floor() as i64;
                let k = rng.i64(0..=n_steps.max(0));
                d.low + (k as f64) * step
            } else {
                rng_util::f64_range(rng, d.low, d.high)
            };
            ParamValue::Float(v.clamp(d.low, d.high))
        }
        Distribution::Int(d) => {
            let v = if let Some(step) = d.step {
                let n_steps = (d.high - d.low) / step.max(1);
                let k = rng.i64(0..=n_steps.max(0));
                d.low + k * step
            } else {
                rng.i64(d.low..=d.high)
            };
            ParamValue::Int(v.clamp(d.low, d.high))
        }
        Distribution::Categorical(d) => ParamValue::Categorical(rng.usize(0..d.n_choices)),
    }
}

/// Greedy farthest-point selection over unit-vector euclidean distance.
///
/// Starts from `first` (typically the default configuration) and repeatedly
/// picks the pool entry maximizing its minimum distance to everything
/// selected so far. Returns `first` followed by up to `n` selections; used to
/// build space-filling initial designs.
#[must_use]
pub fn max_min_distance(
    first: Configuration,
    mut pool: Vec<Configuration>,
    n: usize,
) -> Vec<Configuration> {
    let mut selected = vec![first];
    for _ in 0..n {
        if pool.is_empty() {
            break;
        }
        let (best_idx, _) = pool
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let min_dist = selected
                    .iter()
                    .map(|s| euclidean(c.unit_vector(), s.unit_vector()))
                    .fold(f64::INFINITY, f64::min);
                (i, min_dist)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        selected.push(pool.swap_remove(best_idx));
    }
    selected
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
