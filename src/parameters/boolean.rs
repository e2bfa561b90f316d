//! Boolean parameter. Always valid.

use super::{Constraints, NativeParameter, ParameterConstraint};

/// Boolean parameters carry no constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanSpec;

impl ParameterConstraint for BooleanSpec {
    type Value = bool;

    fn check(&self, _value: &bool) -> Result<(), String> {
        Ok(())
    }

    fn describe(&self) -> Constraints {
        Constraints::Boolean
    }
}

/// Boolean parameter.
pub type BooleanParameter = NativeParameter<BooleanSpec>;

impl NativeParameter<BooleanSpec> {
    /// Creates a boolean parameter.
    pub fn new(name: &str, default: bool) -> Self {
        NativeParameter::with_constraint(name, default, BooleanSpec)
    }
}
