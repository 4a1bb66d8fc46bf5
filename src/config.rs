//! Configuration value objects and shared ranking helpers.

use crate::param::ParamValue;
use crate::types::Origin;

/// An immutable point in the configuration space.
///
/// A configuration carries both its canonical decoded values and its
/// unit-hypercube encoding. Equality and hashing are defined over the decoded
/// values, not the float vector, so duplicate detection works across
/// representations (e.g. two nearby vectors decoding to the same step-grid
/// value compare equal). The [`Origin`] tag is diagnostics-only and excluded
/// from equality.
#[derive(Clone, Debug)]
pub struct Configuration {
    values: Vec<ParamValue>,
    vector: Vec<f64>,
    origin: Origin,
}

impl Configuration {
    /// Built only by `ConfigurationSpace`, which guarantees that `values`
    /// and `vector` are canonical for each other.
    pub(crate) fn new(values: Vec<ParamValue>, vector: Vec<f64>, origin: Origin) -> Self {
        Self {
            values,
            vector,
            origin,
        }
    }

    /// Returns the decoded parameter values.
    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    /// Returns the unit-hypercube encoding of this configuration.
    #[must_use]
    pub fn unit_vector(&self) -> &[f64] {
        &self.vector
    }

    /// Returns the provenance tag.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Replaces the provenance tag, consuming and returning the configuration.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Replaces the provenance tag in place.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the configuration has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for Configuration {}

impl core::hash::Hash for Configuration {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

/// A configuration paired with its acquisition value.
#[derive(Clone, Debug)]
pub struct ScoredConfiguration {
    /// The acquisition value; higher is better.
    pub acq_value: f64,
    /// The scored configuration.
    pub config: Configuration,
}

/// Shuffle-then-sort ranking shared by every maximizer.
///
/// The effective sort key is `(acq_value, random_tiebreak)`, descending on
/// acquisition value: a seeded random permutation is applied first, then a
/// stable sort, so entries with equal acquisition values end up in a
/// seed-deterministic random order.
pub fn sort_by_acq_value(rng: &mut fastrand::Rng, scored: &mut [ScoredConfiguration]) {
    rng.shuffle(scored);
    scored.sort_by(|a, b| b.acq_value.total_cmp(&a.acq_value));
}

/// Stable descending sort without reshuffling.
///
/// Used where per-source ordering already encodes the intended tie-break,
/// e.g. when sorted random-search output is concatenated in front of local
/// search results and ties must keep the random entries first.
pub fn sort_by_acq_value_stable(scored: &mut [ScoredConfiguration]) {
    scored.sort_by(|a, b| b.acq_value.total_cmp(&a.acq_value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(acq: f64, tag: i64) -> ScoredConfiguration {
        ScoredConfiguration {
            acq_value: acq,
            config: Configuration::new(
                vec![ParamValue::Int(tag)],
                vec![0.0],
                Origin::RandomSearch,
            ),
        }
    }

    #[test]
    fn test_sort_descending() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut list = vec![scored(0.1, 0), scored(0.9, 1), scored(0.5, 2)];
        sort_by_acq_value(&mut rng, &mut list);
        assert!(list.windows(2).all(|w| w[0].acq_value >= w[1].acq_value));
    }

    #[test]
    fn test_tie_break_is_seed_deterministic() {
        let build = || vec![scored(0.5, 0), scored(0.5, 1), scored(0.5, 2)];

        let mut rng1 = fastrand::Rng::with_seed(42);
        let mut a = build();
        sort_by_acq_value(&mut rng1, &mut a);

        let mut rng2 = fastrand::Rng::with_seed(42);
        let mut b = build();
        sort_by_acq_value(&mut rng2, &mut b);

        let tags = |l: &[ScoredConfiguration]| -> Vec<ParamValue> {
            l.iter().map(|s| s.config.values()[0].clone()).collect()
        };
        assert_eq!(tags(&a), tags(&b));
    }

    #[test]
    fn test_equality_ignores_origin() {
        let a = Configuration::new(vec![ParamValue::Float(0.5)], vec![0.5], Origin::LocalSearch);
        let b = Configuration::new(vec![ParamValue::Float(0.5)], vec![0.5], Origin::RandomSearch);
        assert_eq!(a, b);
    }
}
