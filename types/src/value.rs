//! Deterministic values for contract arguments, results, and state entries.
//!
//! There is deliberately no floating-point variant: every node must derive
//! byte-identical encodings from the same logical value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A contract-level value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i128),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Rough encoded size, used to enforce argument size limits at intake.
    pub fn approx_size(&self) -> usize {
        match self {
            Self::Null | Self::Bool(_) => 1,
            Self::Int(_) => 16,
            Self::Str(s) => s.len(),
            Self::Bytes(b) => b.len(),
            Self::List(items) => items.iter().map(Value::approx_size).sum::<usize>() + 1,
            Self::Map(entries) => {
                entries
                    .iter()
                    .map(|(k, v)| k.len() + v.approx_size())
                    .sum::<usize>()
                    + 1
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v as i128)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Int(v as i128)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_encoding_is_insertion_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("to".to_string(), Value::from("bob"));
        a.insert("amount".to_string(), Value::from(5i64));

        let mut b = BTreeMap::new();
        b.insert("amount".to_string(), Value::from(5i64));
        b.insert("to".to_string(), Value::from("bob"));

        assert_eq!(
            bincode::serialize(&Value::Map(a)).unwrap(),
            bincode::serialize(&Value::Map(b)).unwrap()
        );
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::from(7u64).as_int(), Some(7));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from("x").as_int(), None);
    }

    #[test]
    fn display_renders_nested_values() {
        let v = Value::List(vec![Value::Int(1), Value::from("a"), Value::Null]);
        assert_eq!(v.to_string(), "[1, \"a\", null]");
    }
}
