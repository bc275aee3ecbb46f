use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handle::{EntityRef, EventRef};

/// A dynamically typed value.
///
/// Literal bindings, evaluated expressions, and chooser picks all produce a
/// `Value`; entity and event records store one per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A text value.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A handle to a live entity.
    Entity(EntityRef),
    /// A handle to a materialized event.
    Event(EventRef),
}

impl Value {
    /// Short name of this value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Entity(_) => "entity",
            Self::Event(_) => "event",
        }
    }

    /// The value as an integer, if it is one. Floats with no fractional part
    /// also qualify.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 => Some(*x as i64),
            _ => None,
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by `and`, `or` and `not`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Float(x) => *x != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Entity(_) | Self::Event(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Entity(r) => write!(f, "{r}"),
            Self::Event(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<EntityRef> for Value {
    fn from(r: EntityRef) -> Self {
        Self::Entity(r)
    }
}

impl From<EventRef> for Value {
    fn from(r: EventRef) -> Self {
        Self::Event(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_float_counts_as_integer() {
        assert_eq!(Value::Float(60.0).as_integer(), Some(60));
        assert_eq!(Value::Float(60.5).as_integer(), None);
        assert_eq!(Value::from("60").as_integer(), None);
    }

    #[test]
    fn display_formats() {
        let list = Value::List(vec![Value::Integer(1), Value::from("a"), Value::Null]);
        assert_eq!(list.to_string(), "[1, a, null]");
        assert_eq!(
            Value::Entity(EntityRef::new("Customer", 2)).to_string(),
            "Customer#2"
        );
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
    }

    #[test]
    fn deserializes_json_scalars() {
        let v: Value = serde_json::from_str("5").unwrap();
        assert_eq!(v, Value::Integer(5));
        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::Float(2.5));
        let v: Value = serde_json::from_str("null").unwrap();
        assert_eq!(v, Value::Null);
        let v: Value = serde_json::from_str(r#"["a", true]"#).unwrap();
        assert_eq!(
            v,
            Value::List(vec![Value::from("a"), Value::Boolean(true)])
        );
    }
}
