//! Plain data values exchanged with the file-access layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric literal; integers keep their integer rendering on write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Build a number from user input, collapsing integral floats to `Int`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite(),
        }
    }
}

// Numeric equality, so `1` and `1.0` compare equal.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Data tree without layout. Object members keep document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Parse a standalone value (comments allowed).
    pub fn parse(text: &str) -> Result<Value, crate::DocumentError> {
        Ok(crate::Document::parse(text)?.root_value())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(members) => members.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// False if any number in the tree is NaN or infinite.
    pub fn is_representable(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite(),
            Value::Array(items) => items.iter().all(Value::is_representable),
            Value::Object(members) => members.iter().all(|(_, v)| v.is_representable()),
            _ => true,
        }
    }

    /// Compact single-line rendering of a scalar; containers use `Display`.
    pub(crate) fn scalar_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => quote(s),
            Value::Array(_) | Value::Object(_) => self.to_string(),
        }
    }
}

pub(crate) fn quote(s: &str) -> String {
    // serde_json never fails on a plain string
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(members) => {
                write!(f, "{{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", quote(key), value)?;
                }
                write!(f, "}}")
            }
            scalar => f.write_str(&scalar.scalar_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Int(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::from_f64(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(Number::Int(1), Number::Float(1.0));
        assert_ne!(Number::Int(1), Number::Float(1.5));
        assert_eq!(Value::from(2.0), Value::from(2_i64));
    }

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(Value::from(100000.0).to_string(), "100000");
        assert_eq!(Value::from(0.2).to_string(), "0.2");
    }

    #[test]
    fn display_is_compact_json() {
        let value = Value::Object(vec![
            ("a".to_string(), Value::Array(vec![Value::Null, Value::from(true)])),
            ("b".to_string(), Value::from("x\"y")),
        ]);
        assert_eq!(value.to_string(), r#"{"a":[null,true],"b":"x\"y"}"#);
    }

    #[test]
    fn nan_is_not_representable() {
        let value = Value::Array(vec![Value::Number(Number::Float(f64::NAN))]);
        assert!(!value.is_representable());
        assert!(Value::from(3.5).is_representable());
    }
}
