//! Constant values bound to primitive parameters.

use icepick_common::Bits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A constant parameter value.
///
/// Sized bit patterns (`PIN_TYPE`, `LUT_INIT`) are [`ConstValue::Bits`];
/// vendor string parameters such as `CLKHF_DIV = "0b01"` are
/// [`ConstValue::String`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    /// An integer constant.
    Int(i64),
    /// A floating-point constant.
    Real(f64),
    /// A sized bit pattern.
    Bits(Bits),
    /// A string constant.
    String(String),
    /// A boolean constant.
    Bool(bool),
}

impl ConstValue {
    /// Returns the integer value, if this is an [`Int`](ConstValue::Int).
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the bit pattern, if this is a [`Bits`](ConstValue::Bits).
    pub fn as_bits(&self) -> Option<&Bits> {
        match self {
            ConstValue::Bits(b) => Some(b),
            _ => None,
        }
    }

    /// Interprets the value as a flag: `true`, non-zero integers, and the
    /// strings `"1"`/`"true"` (any case) are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConstValue::Bool(b) => *b,
            ConstValue::Int(v) => *v != 0,
            ConstValue::Real(v) => *v != 0.0,
            ConstValue::Bits(b) => !b.is_zero(),
            ConstValue::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Real(v) => write!(f, "{v:?}"),
            ConstValue::Bits(b) => write!(f, "{}'b{b}", b.width()),
            ConstValue::String(s) => write!(f, "{s:?}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(ConstValue::Bool(true).is_truthy());
        assert!(!ConstValue::Bool(false).is_truthy());
        assert!(ConstValue::Int(1).is_truthy());
        assert!(!ConstValue::Int(0).is_truthy());
        assert!(ConstValue::String("TRUE".into()).is_truthy());
        assert!(!ConstValue::String("no".into()).is_truthy());
    }

    #[test]
    fn display_forms() {
        assert_eq!(ConstValue::Int(3).to_string(), "3");
        assert_eq!(ConstValue::Real(1.5).to_string(), "1.5");
        assert_eq!(ConstValue::Real(2.0).to_string(), "2.0");
        assert_eq!(
            ConstValue::Bits(Bits::from_u64(0b101001, 6)).to_string(),
            "6'b101001"
        );
        assert_eq!(ConstValue::String("0b01".into()).to_string(), "\"0b01\"");
    }

    #[test]
    fn serde_roundtrip() {
        for val in [
            ConstValue::Int(-4),
            ConstValue::Real(1.5),
            ConstValue::Bits(Bits::from_u64(1, 16)),
            ConstValue::String("SB_LVCMOS".into()),
            ConstValue::Bool(false),
        ] {
            let json = serde_json::to_string(&val).unwrap();
            let back: ConstValue = serde_json::from_str(&json).unwrap();
            assert_eq!(val, back);
        }
    }
}
