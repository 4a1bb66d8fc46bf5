//! Parameter value storage types.

/// Represents a decoded parameter value.
///
/// This enum stores different parameter value types uniformly. For
/// categorical parameters, the `Categorical` variant stores the index into
/// the choices array.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// A floating-point parameter value.
    Float(f64),
    /// An integer parameter value.
    Int(i64),
    /// A categorical parameter value, stored as an index into the choices array.
    Categorical(usize),
}

// Values are only ever produced by canonical decoding in
// `ConfigurationSpace`, which clamps into finite bounds, so `Float` is never
// NaN and equality is total.
impl Eq for ParamValue {}

impl core::hash::Hash for ParamValue {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        match self {
            ParamValue::Float(v) => {
                0u8.hash(state);
                // `-0.0 == 0.0`, so the two must hash identically.
                (v + 0.0).to_bits().hash(state);
            }
            ParamValue::Int(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            ParamValue::Categorical(v) => {
                2u8.hash(state);
                v.hash(state);
            }
        }
    }
}
