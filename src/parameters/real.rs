//! Real-valued parameter with optional bounds.
//!
//! Bounds never reject a write. They are checked by `validate()`, which
//! reports `Invalid` for values outside `[lower, upper]` (or NaN).

use super::{Constraints, NativeParameter, ParameterConstraint};

/// Constraints of a real parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealSpec {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Unit-of-measure label, informational only
    pub unit: Option<String>,
}

impl ParameterConstraint for RealSpec {
    type Value = f64;

    fn check(&self, value: &f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Value is not a number".to_string());
        }
        if let Some(lower) = self.lower {
            if *value < lower {
                return Err(format!("Value {} is below the lower bound {}", value, lower));
            }
        }
        if let Some(upper) = self.upper {
            if *value > upper {
                return Err(format!("Value {} is above the upper bound {}", value, upper));
            }
        }
        Ok(())
    }

    fn describe(&self) -> Constraints {
        Constraints::Real { lower: self.lower, upper: self.upper, unit: self.unit.clone() }
    }
}

/// Real-valued parameter.
pub type RealParameter = NativeParameter<RealSpec>;

impl NativeParameter<RealSpec> {
    /// Creates an unbounded real parameter.
    pub fn new(name: &str, default: f64) -> Self {
        NativeParameter::with_constraint(name, default, RealSpec::default())
    }

    /// Sets the bounds.
    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.set_bounds(lower, upper);
        self
    }

    /// Sets the unit-of-measure label.
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.update_spec(|spec| spec.unit = Some(unit.to_string()));
        self
    }

    /// Replaces the bounds.
    pub fn set_bounds(&mut self, lower: Option<f64>, upper: Option<f64>) {
        self.update_spec(|spec| {
            spec.lower = lower;
            spec.upper = upper;
        });
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.spec().lower
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.spec().upper
    }

    pub fn unit(&self) -> Option<&str> {
        self.spec().unit.as_deref()
    }
}
