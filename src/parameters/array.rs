//! Array parameter: an ordered list of values of one element type.
//!
//! Writes reject elements that cannot be narrowed to the element type. A
//! length mismatch against `fixed_length` is only reported by `validate()`.

use super::{Constraints, NativeParameter, ParameterConstraint};
use crate::value::{ParameterValueType, Value};
use crate::{CapeError, CapeResult, ParameterType};

/// Constraints of an array parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySpec {
    pub element_type: ParameterType,
    pub fixed_length: Option<usize>,
}

fn admit_element(element_type: ParameterType, element: &Value) -> CapeResult<()> {
    match element_type {
        ParameterType::Real => f64::from_value(element).map(|_| ()),
        ParameterType::Integer => i32::from_value(element).map(|_| ()),
        ParameterType::Boolean => bool::from_value(element).map(|_| ()),
        ParameterType::Option => String::from_value(element).map(|_| ()),
        ParameterType::Array => Vec::<Value>::from_value(element).map(|_| ()),
    }
}

impl ParameterConstraint for ArraySpec {
    type Value = Vec<Value>;

    fn admit(&self, value: &Vec<Value>) -> CapeResult<()> {
        for (i, element) in value.iter().enumerate() {
            admit_element(self.element_type, element)
                .map_err(|e| CapeError::InvalidArgument(format!("Element {}: {}", i, e)))?;
        }
        Ok(())
    }

    fn check(&self, value: &Vec<Value>) -> Result<(), String> {
        match self.fixed_length {
            Some(len) if value.len() != len => {
                Err(format!("Array has {} elements but exactly {} are required", value.len(), len))
            }
            _ => Ok(()),
        }
    }

    fn describe(&self) -> Constraints {
        Constraints::Array { element_type: self.element_type, fixed_length: self.fixed_length }
    }
}

/// Array parameter.
pub type ArrayParameter = NativeParameter<ArraySpec>;

impl NativeParameter<ArraySpec> {
    /// Creates a variable-length array parameter.
    pub fn new(name: &str, element_type: ParameterType, default: Vec<Value>) -> Self {
        let spec = ArraySpec { element_type, fixed_length: None };
        NativeParameter::with_constraint(name, default, spec)
    }

    /// Requires exactly `len` elements.
    pub fn with_fixed_length(mut self, len: usize) -> Self {
        self.update_spec(|spec| spec.fixed_length = Some(len));
        self
    }

    pub fn element_type(&self) -> ParameterType {
        self.spec().element_type
    }

    pub fn fixed_length(&self) -> Option<usize> {
        self.spec().fixed_length
    }

    /// Number of elements in the current value.
    pub fn len(&self) -> usize {
        self.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }
}
