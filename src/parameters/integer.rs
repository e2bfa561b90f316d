//! Integer parameter with optional bounds.

use super::{Constraints, NativeParameter, ParameterConstraint};

/// Constraints of an integer parameter. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerSpec {
    pub lower: Option<i32>,
    pub upper: Option<i32>,
}

impl ParameterConstraint for IntegerSpec {
    type Value = i32;

    fn check(&self, value: &i32) -> Result<(), String> {
        match (self.lower, self.upper) {
            (Some(lower), _) if *value < lower => {
                Err(format!("Value {} is below the lower bound {}", value, lower))
            }
            (_, Some(upper)) if *value > upper => {
                Err(format!("Value {} is above the upper bound {}", value, upper))
            }
            _ => Ok(()),
        }
    }

    fn describe(&self) -> Constraints {
        Constraints::Integer { lower: self.lower, upper: self.upper }
    }
}

/// Integer parameter.
pub type IntegerParameter = NativeParameter<IntegerSpec>;

impl NativeParameter<IntegerSpec> {
    /// Creates an unbounded integer parameter.
    pub fn new(name: &str, default: i32) -> Self {
        NativeParameter::with_constraint(name, default, IntegerSpec::default())
    }

    /// Sets the bounds.
    pub fn with_bounds(mut self, lower: Option<i32>, upper: Option<i32>) -> Self {
        self.set_bounds(lower, upper);
        self
    }

    /// Replaces the bounds.
    pub fn set_bounds(&mut self, lower: Option<i32>, upper: Option<i32>) {
        self.update_spec(|spec| {
            spec.lower = lower;
            spec.upper = upper;
        });
    }

    pub fn lower_bound(&self) -> Option<i32> {
        self.spec().lower
    }

    pub fn upper_bound(&self) -> Option<i32> {
        self.spec().upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{Validatable, Valuable};
    use crate::{ValidationStatus, Value};

    #[test]
    fn test_out_of_range_reported_not_thrown() {
        let mut p = IntegerParameter::new("stages", 5).with_bounds(Some(1), Some(50));

        p.set_value(Value::Integer(60)).unwrap();
        let report = p.validate().unwrap();
        assert!(!report.valid);
        assert_eq!(report.message, "Value 60 is above the upper bound 50");

        p.set_value(Value::Integer(0)).unwrap();
        assert!(p.validate().unwrap().message.contains("below"));

        p.set(25).unwrap();
        assert!(p.validate().unwrap().valid);
        assert_eq!(p.validation_status().unwrap(), ValidationStatus::Valid);
    }

    #[test]
    fn test_bound_change_clears_status() {
        let mut p = IntegerParameter::new("n", 5);
        p.validate().unwrap();
        p.set_bounds(Some(6), None);
        assert_eq!(p.validation_status().unwrap(), ValidationStatus::NotValidated);
        assert!(!p.validate().unwrap().valid);
        assert_eq!(p.lower_bound(), Some(6));
        assert_eq!(p.upper_bound(), None);
    }

    #[test]
    fn test_fractional_write_rejected() {
        let mut p = IntegerParameter::new("n", 1);
        assert!(p.set_value(Value::Real(2.5)).is_err());
        assert_eq!(*p.get(), 1);
        p.set_value(Value::Real(3.0)).unwrap();
        assert_eq!(p.value().unwrap(), Value::Integer(3));
    }
}
