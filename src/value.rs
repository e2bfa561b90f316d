//! Untyped value slot shared by every parameter variant.
//!
//! Parameters expose their value as a [`Value`] so that hosts and foreign
//! components can exchange them without knowing the variant. Each variant
//! narrows that slot to its own Rust type through [`ParameterValueType`].

use crate::{CapeError, CapeResult, ParameterType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed parameter value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Empty,
    Real(f64),
    Integer(i32),
    Boolean(bool),
    Text(String),
    Array(Vec<Value>),
}

impl Value {
    /// Returns true for the empty slot.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Short name of the carried type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Real(_) => "real",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
        }
    }

    /// Builds a text value.
    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("<empty>"),
            Value::Real(x) => write!(f, "{}", x),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// A Rust type that backs one parameter variant.
///
/// `from_value` narrows an untyped [`Value`] (failing with `InvalidArgument`
/// when the slot cannot represent the type) and `into_value` widens back.
pub trait ParameterValueType: Clone + PartialEq + fmt::Debug + 'static {
    /// Variant this type backs.
    const TYPE: ParameterType;

    /// Narrows an untyped value.
    fn from_value(value: &Value) -> CapeResult<Self>;

    /// Widens into an untyped value.
    fn into_value(self) -> Value;
}

fn mismatch(expected: ParameterType, got: &Value) -> CapeError {
    let message = format!("Cannot convert {} value {} to {}", got.type_name(), got, expected);
    CapeError::InvalidArgument(message)
}

/// Whole reals inside the `i32` range narrow without loss.
fn is_whole_i32(x: f64) -> bool {
    x.fract() == 0.0 && x >= f64::from(i32::MIN) && x <= f64::from(i32::MAX)
}

impl ParameterValueType for f64 {
    const TYPE: ParameterType = ParameterType::Real;

    fn from_value(value: &Value) -> CapeResult<Self> {
        match value {
            Value::Real(x) => Ok(*x),
            Value::Integer(i) => Ok(f64::from(*i)),
            other => Err(mismatch(Self::TYPE, other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl ParameterValueType for i32 {
    const TYPE: ParameterType = ParameterType::Integer;

    fn from_value(value: &Value) -> CapeResult<Self> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::Real(x) if is_whole_i32(*x) => Ok(*x as i32),
            other => Err(mismatch(Self::TYPE, other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl ParameterValueType for bool {
    const TYPE: ParameterType = ParameterType::Boolean;

    fn from_value(value: &Value) -> CapeResult<Self> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            Value::Real(x) => Ok(*x != 0.0),
            Value::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(mismatch(Self::TYPE, other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl ParameterValueType for String {
    const TYPE: ParameterType = ParameterType::Option;

    fn from_value(value: &Value) -> CapeResult<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(Self::TYPE, other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl ParameterValueType for Vec<Value> {
    const TYPE: ParameterType = ParameterType::Array;

    fn from_value(value: &Value) -> CapeResult<Self> {
        match value {
            Value::Array(items) => Ok(items.clone()),
            other => Err(mismatch(Self::TYPE, other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Array(self)
    }
}
