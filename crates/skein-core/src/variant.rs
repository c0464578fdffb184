//! The tagged runtime value used throughout the variable system.

use serde::{Deserialize, Serialize};

use crate::id::StringHash;

/// A small tagged-union value: null, bool, int, float, or string hash.
///
/// Equality is value-based within a matching tag; comparing across
/// mismatched tags is a well-defined `false`, never an error. The derived
/// `PartialEq` gives exactly that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// The absent value; also what failed lookups resolve to.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A hashed string id.
    Str(StringHash),
}

impl Variant {
    /// Whether this value counts as true: `Bool(true)`, nonzero numbers,
    /// and non-empty string hashes.
    pub fn truthy(self) -> bool {
        match self {
            Variant::Null => false,
            Variant::Bool(b) => b,
            Variant::Int(n) => n != 0,
            Variant::Float(x) => x != 0.0,
            Variant::Str(h) => !h.is_empty(),
        }
    }

    /// The value as an integer, bridging floats by truncation.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Variant::Int(n) => Some(n),
            Variant::Float(x) => Some(x as i64),
            _ => None,
        }
    }

    /// The value as a float, bridging integers.
    pub fn as_float(self) -> Option<f64> {
        match self {
            Variant::Float(x) => Some(x),
            Variant::Int(n) => Some(n as f64),
            _ => None,
        }
    }

    /// The value as a string hash.
    pub fn as_str_hash(self) -> Option<StringHash> {
        match self {
            Variant::Str(h) => Some(h),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_tags_compare_false() {
        assert_ne!(Variant::Int(1), Variant::Bool(true));
        assert_ne!(Variant::Int(1), Variant::Float(1.0));
        assert_ne!(Variant::Null, Variant::Bool(false));
    }

    #[test]
    fn matching_tags_compare_by_value() {
        assert_eq!(Variant::Int(3), Variant::Int(3));
        assert_ne!(Variant::Int(3), Variant::Int(4));
        assert_eq!(
            Variant::Str(StringHash::hash("docks")),
            Variant::Str(StringHash::hash("docks"))
        );
    }

    #[test]
    fn truthiness() {
        assert!(!Variant::Null.truthy());
        assert!(!Variant::Bool(false).truthy());
        assert!(Variant::Bool(true).truthy());
        assert!(!Variant::Int(0).truthy());
        assert!(Variant::Int(-2).truthy());
        assert!(!Variant::Str(StringHash::EMPTY).truthy());
        assert!(Variant::Str(StringHash::hash("x")).truthy());
    }

    #[test]
    fn numeric_bridging() {
        assert_eq!(Variant::Float(2.9).as_int(), Some(2));
        assert_eq!(Variant::Int(2).as_float(), Some(2.0));
        assert_eq!(Variant::Bool(true).as_int(), None);
    }
}
