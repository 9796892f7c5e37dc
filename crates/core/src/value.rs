//! Typed scalar values
//!
//! This module defines `Val`, the typed scalar that forms the prefix of a
//! temporal key. The nine variants map 1:1 onto the key types the store can
//! be configured with.
//!
//! ## Equality
//!
//! Different variants are NEVER equal, even when they hold the same numeric
//! quantity: `Int(1) != Long(1)`. Floating point variants compare **bitwise**
//! (`to_bits`), not by IEEE-754 semantics: a value decoded from storage must
//! always equal the value that was encoded, including NaN payloads and the
//! sign of zero. Ordering is total for the same reason (`total_cmp`).

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Typed scalar key-prefix value
///
/// The variant determines both the logical type and the encoded byte width
/// (fixed for primitives, variable for strings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Val {
    /// Boolean value
    Bool(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Instant in time
    Date(Timestamp),
}

impl Val {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Bool(_) => "Bool",
            Val::Byte(_) => "Byte",
            Val::Short(_) => "Short",
            Val::Int(_) => "Int",
            Val::Long(_) => "Long",
            Val::Float(_) => "Float",
            Val::Double(_) => "Double",
            Val::String(_) => "String",
            Val::Date(_) => "Date",
        }
    }

    /// Get as bool if this is a `Bool` value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i8 if this is a `Byte` value
    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Val::Byte(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i16 if this is a `Short` value
    pub fn as_short(&self) -> Option<i16> {
        match self {
            Val::Short(s) => Some(*s),
            _ => None,
        }
    }

    /// Get as i32 if this is an `Int` value
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Val::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 if this is a `Long` value
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Val::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Get as f32 if this is a `Float` value
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Val::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as f64 if this is a `Double` value
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Val::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as &str if this is a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as timestamp if this is a `Date` value
    pub fn as_date(&self) -> Option<Timestamp> {
        match self {
            Val::Date(t) => Some(*t),
            _ => None,
        }
    }

    // Variant rank used for cross-variant ordering.
    fn rank(&self) -> u8 {
        match self {
            Val::Bool(_) => 0,
            Val::Byte(_) => 1,
            Val::Short(_) => 2,
            Val::Int(_) => 3,
            Val::Long(_) => 4,
            Val::Float(_) => 5,
            Val::Double(_) => 6,
            Val::String(_) => 7,
            Val::Date(_) => 8,
        }
    }
}

// Bitwise float comparison: storage round-trips must preserve identity,
// so NaN == NaN here and -0.0 != 0.0.
impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Byte(a), Val::Byte(b)) => a == b,
            (Val::Short(a), Val::Short(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Long(a), Val::Long(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a.to_bits() == b.to_bits(),
            (Val::Double(a), Val::Double(b)) => a.to_bits() == b.to_bits(),
            (Val::String(a), Val::String(b)) => a == b,
            (Val::Date(a), Val::Date(b)) => a == b,
            // Different variants are never equal
            _ => false,
        }
    }
}

impl Eq for Val {}

impl Hash for Val {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Val::Bool(b) => b.hash(state),
            Val::Byte(b) => b.hash(state),
            Val::Short(s) => s.hash(state),
            Val::Int(i) => i.hash(state),
            Val::Long(l) => l.hash(state),
            Val::Float(f) => f.to_bits().hash(state),
            Val::Double(d) => d.to_bits().hash(state),
            Val::String(s) => s.hash(state),
            Val::Date(t) => t.hash(state),
        }
    }
}

impl PartialOrd for Val {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Val {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Val::Bool(a), Val::Bool(b)) => a.cmp(b),
            (Val::Byte(a), Val::Byte(b)) => a.cmp(b),
            (Val::Short(a), Val::Short(b)) => a.cmp(b),
            (Val::Int(a), Val::Int(b)) => a.cmp(b),
            (Val::Long(a), Val::Long(b)) => a.cmp(b),
            (Val::Float(a), Val::Float(b)) => a.total_cmp(b),
            (Val::Double(a), Val::Double(b)) => a.total_cmp(b),
            (Val::String(a), Val::String(b)) => a.cmp(b),
            (Val::Date(a), Val::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::String(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::String(s)
    }
}

impl From<i64> for Val {
    fn from(l: i64) -> Self {
        Val::Long(l)
    }
}

impl From<Timestamp> for Val {
    fn from(t: Timestamp) -> Self {
        Val::Date(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Equality ===

    #[test]
    fn test_same_variant_equality() {
        assert_eq!(Val::Long(42), Val::Long(42));
        assert_ne!(Val::Long(42), Val::Long(43));
        assert_eq!(Val::String("a".into()), Val::String("a".into()));
    }

    #[test]
    fn test_different_variants_never_equal() {
        assert_ne!(Val::Int(1), Val::Long(1));
        assert_ne!(Val::Byte(1), Val::Short(1));
        assert_ne!(Val::Float(1.0), Val::Double(1.0));
    }

    #[test]
    fn test_float_bitwise_equality() {
        assert_eq!(Val::Double(f64::NAN), Val::Double(f64::NAN));
        assert_ne!(Val::Double(0.0), Val::Double(-0.0));
        assert_eq!(Val::Float(f32::INFINITY), Val::Float(f32::INFINITY));
    }

    // === Ordering ===

    #[test]
    fn test_ordering_within_variant() {
        assert!(Val::Long(1) < Val::Long(2));
        assert!(Val::String("a".into()) < Val::String("b".into()));
        assert!(Val::Double(-1.0) < Val::Double(1.0));
    }

    #[test]
    fn test_ordering_is_total_for_floats() {
        // total_cmp gives NaN a defined position
        let mut vals = vec![
            Val::Double(f64::NAN),
            Val::Double(1.0),
            Val::Double(f64::NEG_INFINITY),
        ];
        vals.sort();
        assert_eq!(vals[0], Val::Double(f64::NEG_INFINITY));
        assert_eq!(vals[1], Val::Double(1.0));
    }

    // === Accessors ===

    #[test]
    fn test_accessors() {
        assert_eq!(Val::Bool(true).as_bool(), Some(true));
        assert_eq!(Val::Long(7).as_long(), Some(7));
        assert_eq!(Val::Long(7).as_int(), None);
        assert_eq!(Val::String("x".into()).as_str(), Some("x"));
        assert_eq!(
            Val::Date(Timestamp::from_secs(5)).as_date(),
            Some(Timestamp::from_secs(5))
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Val::Bool(true).type_name(), "Bool");
        assert_eq!(Val::Double(0.0).type_name(), "Double");
        assert_eq!(Val::Date(Timestamp::EPOCH).type_name(), "Date");
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Val::Double(f64::NAN));
        assert!(set.contains(&Val::Double(f64::NAN)));
        assert!(!set.contains(&Val::Double(0.0)));
    }

    // === Properties ===

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_val() -> impl Strategy<Value = Val> {
            prop_oneof![
                any::<bool>().prop_map(Val::Bool),
                any::<i8>().prop_map(Val::Byte),
                any::<i16>().prop_map(Val::Short),
                any::<i32>().prop_map(Val::Int),
                any::<i64>().prop_map(Val::Long),
                any::<f32>().prop_map(Val::Float),
                any::<f64>().prop_map(Val::Double),
                ".{0,40}".prop_map(Val::String),
                any::<u64>().prop_map(|m| Val::Date(Timestamp::from_micros(m))),
            ]
        }

        proptest! {
            #[test]
            fn prop_json_roundtrip_preserves_identity(val in arb_val()) {
                // JSON has no encoding for non-finite floats.
                prop_assume!(!matches!(val, Val::Float(f) if !f.is_finite()));
                prop_assume!(!matches!(val, Val::Double(d) if !d.is_finite()));
                let json = serde_json::to_string(&val).unwrap();
                let restored: Val = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(restored, val);
            }

            #[test]
            fn prop_ordering_is_total(a in arb_val(), b in arb_val(), c in arb_val()) {
                // Antisymmetry and transitivity over random triples.
                if a < b && b < c {
                    prop_assert!(a < c);
                }
                prop_assert_eq!(a == b, b == a);
            }
        }
    }
}
