use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dynamically typed value produced by evaluating an expression or
/// stored in a response slot.
///
/// "Undefined" is not a variant; evaluation results use `Option<Value>`
/// with `None` meaning undefined.
///
/// The serialized form is untagged: booleans, numbers, RFC 3339 date
/// strings, plain strings, and arrays. A string that parses as an
/// RFC 3339 timestamp deserializes as a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),

    /// An integer value.
    Int(i64),

    /// A floating-point value.
    Float(f64),

    /// A point in time, serialized as an RFC 3339 string.
    Date(DateTime<Utc>),

    /// A string value.
    Str(String),

    /// An array of values.
    List(Vec<Value>),
}

impl Value {
    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as a number, coercing integers to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a date.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get this value as a list slice.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    /// Check if this value is exactly `Bool(true)`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// Check if this value has the given declared type.
    pub fn matches(&self, value_type: ValueType) -> bool {
        match value_type {
            ValueType::String => matches!(self, Self::Str(_)),
            ValueType::Number => matches!(self, Self::Int(_) | Self::Float(_)),
            ValueType::Boolean => matches!(self, Self::Bool(_)),
            ValueType::Date => matches!(self, Self::Date(_)),
        }
    }

    /// Get the type name of this value for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Date(_) => "Date",
            Self::Str(_) => "String",
            Self::List(_) => "List",
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

/// The declared type of a value a component can produce, used by the
/// declaration registry and typed context lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Date,
}
