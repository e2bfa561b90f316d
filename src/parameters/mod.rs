//! Typed parameters owned by a unit operation.
//!
//! A parameter is a named, typed, validatable value slot. Its behavior is
//! split into independent capability traits so that foreign adapters can
//! compose exactly what the foreign boundary supports:
//!
//! - [`Valuable`]: current value and mode
//! - [`Validatable`]: validation status and `validate()`
//! - [`Resettable`]: `reset()` to the default value
//! - [`Specifiable`]: variant tag, default value and constraints
//!
//! [`Parameter`] bundles all of them (plus [`Identified`]) into the object
//! the [`ParameterCollection`] stores.
//!
//! Native parameters are a single generic type, [`NativeParameter<C>`],
//! parametrized by the variant's constraint type:
//!
//! | Alias | Constraint | Value type |
//! |---|---|---|
//! | [`RealParameter`] | [`RealSpec`] | `f64` |
//! | [`IntegerParameter`] | [`IntegerSpec`] | `i32` |
//! | [`BooleanParameter`] | [`BooleanSpec`] | `bool` |
//! | [`OptionParameter`] | [`OptionSpec`] | `String` |
//! | [`ArrayParameter`] | [`ArraySpec`] | `Vec<Value>` |
//!
//! # Value and status semantics
//!
//! ```
//! use nomata_cape::{RealParameter, Resettable, Valuable, Validatable, ValidationStatus, Value};
//!
//! let mut t = RealParameter::new("T", 298.15).with_bounds(Some(200.0), Some(400.0));
//!
//! t.set_value(Value::Real(500.0)).unwrap(); // accepted: bounds are advisory here
//! assert_eq!(t.validation_status().unwrap(), ValidationStatus::NotValidated);
//!
//! let report = t.validate().unwrap();
//! assert!(!report.valid);
//! assert_eq!(t.validation_status().unwrap(), ValidationStatus::Invalid);
//!
//! t.reset().unwrap(); // back to default, status untouched
//! assert_eq!(t.value().unwrap(), Value::Real(298.15));
//! assert_eq!(t.validation_status().unwrap(), ValidationStatus::Invalid);
//! ```

use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::value::{ParameterValueType, Value};
use crate::{CapeResult, ParameterMode, ParameterType, ValidationReport, ValidationStatus};
use std::fmt;

pub mod array;
pub mod boolean;
pub mod collection;
pub mod integer;
pub mod option;
pub mod real;

pub use array::{ArrayParameter, ArraySpec};
pub use boolean::{BooleanParameter, BooleanSpec};
pub use collection::ParameterCollection;
pub use integer::{IntegerParameter, IntegerSpec};
pub use option::{OptionParameter, OptionSpec};
pub use real::{RealParameter, RealSpec};

/// Capability: the parameter carries a current value and a mode.
pub trait Valuable {
    /// Current value.
    fn value(&self) -> CapeResult<Value>;

    /// Replaces the current value.
    ///
    /// Fails with `InvalidArgument` (value unchanged) when the value cannot be
    /// represented by the variant or is rejected by a set-time constraint.
    /// On success the validation status becomes `NotValidated`.
    fn set_value(&mut self, value: Value) -> CapeResult<()>;

    /// Input, output or both.
    fn mode(&self) -> CapeResult<ParameterMode>;

    /// Changes the mode.
    fn set_mode(&mut self, mode: ParameterMode) -> CapeResult<()>;
}

/// Capability: the parameter can be validated.
pub trait Validatable {
    /// Status as of the last `validate()` or mutation.
    fn validation_status(&self) -> CapeResult<ValidationStatus>;

    /// Checks the current value against the constraints.
    ///
    /// Never changes the value. Always updates the status and emits a
    /// `Validated` event carrying the previous and new status.
    fn validate(&mut self) -> CapeResult<ValidationReport>;
}

/// Capability: the parameter can be reset to its default.
pub trait Resettable {
    /// Sets the value to the default and emits `Reset`. Does not validate.
    fn reset(&mut self) -> CapeResult<()>;
}

/// Capability: the parameter describes its own specification.
pub trait Specifiable {
    /// Variant tag.
    fn parameter_type(&self) -> ParameterType;

    /// Default value.
    fn default_value(&self) -> CapeResult<Value>;

    /// Replaces the default value.
    fn set_default_value(&mut self, value: Value) -> CapeResult<()>;

    /// Type-specific constraints.
    fn constraints(&self) -> CapeResult<Constraints>;
}

/// A complete parameter, native or adapted.
pub trait Parameter: Identified + Valuable + Validatable + Resettable + Specifiable {
    /// Deep copy sharing no mutable state with `self`. Listeners are not copied.
    fn clone_parameter(&self) -> CapeResult<Box<dyn Parameter>>;
}

impl fmt::Debug for dyn Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name())
            .field("type", &self.parameter_type())
            .finish()
    }
}

/// Type-specific constraints of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraints {
    Real { lower: Option<f64>, upper: Option<f64>, unit: Option<String> },
    Integer { lower: Option<i32>, upper: Option<i32> },
    Boolean,
    Option { options: Vec<String>, restricted: bool },
    Array { element_type: ParameterType, fixed_length: Option<usize> },
}

impl Constraints {
    /// Variant these constraints belong to.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Constraints::Real { .. } => ParameterType::Real,
            Constraints::Integer { .. } => ParameterType::Integer,
            Constraints::Boolean => ParameterType::Boolean,
            Constraints::Option { .. } => ParameterType::Option,
            Constraints::Array { .. } => ParameterType::Array,
        }
    }
}

/// Constraint type of one parameter variant.
pub trait ParameterConstraint: Clone + fmt::Debug + 'static {
    /// Rust type backing the variant's value.
    type Value: ParameterValueType;

    /// Set-time check. A failure rejects the write and leaves the value unchanged.
    fn admit(&self, _value: &Self::Value) -> CapeResult<()> {
        Ok(())
    }

    /// Validate-time check, returning the reason on failure.
    fn check(&self, value: &Self::Value) -> Result<(), String>;

    /// Introspectable form.
    fn describe(&self) -> Constraints;
}

/// A natively implemented parameter of variant `C`.
#[derive(Debug, Clone)]
pub struct NativeParameter<C: ParameterConstraint> {
    ident: Identification,
    mode: ParameterMode,
    status: ValidationStatus,
    value: C::Value,
    default: C::Value,
    spec: C,
}

impl<C: ParameterConstraint> NativeParameter<C> {
    /// Creates a parameter whose value starts at `default`.
    pub fn with_constraint(name: &str, default: C::Value, spec: C) -> Self {
        NativeParameter {
            ident: Identification::new(name),
            mode: ParameterMode::Input,
            status: ValidationStatus::NotValidated,
            value: default.clone(),
            default,
            spec,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.ident = Identification::with_description(self.ident.name(), description);
        self
    }

    /// Sets the mode.
    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Typed current value.
    pub fn get(&self) -> &C::Value {
        &self.value
    }

    /// Typed write. Same semantics as [`Valuable::set_value`].
    pub fn set(&mut self, value: C::Value) -> CapeResult<()> {
        self.spec.admit(&value)?;
        let old = std::mem::replace(&mut self.value, value);
        self.status = ValidationStatus::NotValidated;
        self.ident.emit(ComponentEvent::ValueChanged {
            component: self.ident.name().to_string(),
            old: old.into_value(),
            new: self.value.clone().into_value(),
        });
        Ok(())
    }

    /// Typed default value.
    pub fn get_default(&self) -> &C::Value {
        &self.default
    }

    /// Typed default write. The default must pass the same set-time check as a value.
    pub fn set_default(&mut self, default: C::Value) -> CapeResult<()> {
        self.spec.admit(&default)?;
        let old = std::mem::replace(&mut self.default, default);
        self.ident.emit(ComponentEvent::DefaultValueChanged {
            component: self.ident.name().to_string(),
            old: old.into_value(),
            new: self.default.clone().into_value(),
        });
        Ok(())
    }

    /// Variant constraints.
    pub fn spec(&self) -> &C {
        &self.spec
    }

    /// Mutates the constraints. The value may no longer satisfy them, so the
    /// status drops back to `NotValidated`.
    pub(crate) fn update_spec(&mut self, f: impl FnOnce(&mut C)) {
        f(&mut self.spec);
        self.status = ValidationStatus::NotValidated;
    }
}

impl<C: ParameterConstraint> Identified for NativeParameter<C> {
    fn identification(&self) -> &Identification {
        &self.ident
    }

    fn set_name(&mut self, name: &str) -> CapeResult<()> {
        self.ident.set_name(name);
        Ok(())
    }

    fn set_description(&mut self, description: &str) -> CapeResult<()> {
        self.ident.set_description(description);
        Ok(())
    }

    fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.ident.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.ident.unsubscribe(id)
    }
}

impl<C: ParameterConstraint> Valuable for NativeParameter<C> {
    fn value(&self) -> CapeResult<Value> {
        Ok(self.value.clone().into_value())
    }

    fn set_value(&mut self, value: Value) -> CapeResult<()> {
        let typed = C::Value::from_value(&value)?;
        self.set(typed)
    }

    fn mode(&self) -> CapeResult<ParameterMode> {
        Ok(self.mode)
    }

    fn set_mode(&mut self, mode: ParameterMode) -> CapeResult<()> {
        let old = std::mem::replace(&mut self.mode, mode);
        let component = self.ident.name().to_string();
        self.ident.emit(ComponentEvent::ModeChanged { component, old, new: mode });
        Ok(())
    }
}

impl<C: ParameterConstraint> Validatable for NativeParameter<C> {
    fn validation_status(&self) -> CapeResult<ValidationStatus> {
        Ok(self.status)
    }

    fn validate(&mut self) -> CapeResult<ValidationReport> {
        let report = match self.spec.check(&self.value) {
            Ok(()) => ValidationReport::valid(),
            Err(message) => ValidationReport::invalid(message),
        };
        let old = std::mem::replace(&mut self.status, report.status());
        self.ident.emit(ComponentEvent::Validated {
            component: self.ident.name().to_string(),
            old,
            new: self.status,
            message: report.message.clone(),
        });
        Ok(report)
    }
}

impl<C: ParameterConstraint> Resettable for NativeParameter<C> {
    fn reset(&mut self) -> CapeResult<()> {
        self.value = self.default.clone();
        self.ident.emit(ComponentEvent::Reset { component: self.ident.name().to_string() });
        Ok(())
    }
}

impl<C: ParameterConstraint> Specifiable for NativeParameter<C> {
    fn parameter_type(&self) -> ParameterType {
        C::Value::TYPE
    }

    fn default_value(&self) -> CapeResult<Value> {
        Ok(self.default.clone().into_value())
    }

    fn set_default_value(&mut self, value: Value) -> CapeResult<()> {
        let typed = C::Value::from_value(&value)?;
        self.set_default(typed)
    }

    fn constraints(&self) -> CapeResult<Constraints> {
        Ok(self.spec.describe())
    }
}

impl<C: ParameterConstraint> Parameter for NativeParameter<C> {
    fn clone_parameter(&self) -> CapeResult<Box<dyn Parameter>> {
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foreign::fixtures::{every_variant, sample_for};
    use crate::identification::recorder;
    use proptest::prelude::*;

    #[test]
    fn test_set_value_marks_not_validated() {
        for mut p in every_variant() {
            p.validate().unwrap();
            assert_ne!(p.validation_status().unwrap(), ValidationStatus::NotValidated);

            let v = sample_for(p.parameter_type(), 1);
            p.set_value(v.clone()).unwrap();
            assert_eq!(p.value().unwrap(), v);
            assert_eq!(p.validation_status().unwrap(), ValidationStatus::NotValidated);
        }
    }

    #[test]
    fn test_reset_keeps_status() {
        for mut p in every_variant() {
            let default = p.default_value().unwrap();
            p.set_value(sample_for(p.parameter_type(), 3)).unwrap();
            p.validate().unwrap();
            let status = p.validation_status().unwrap();

            p.reset().unwrap();
            assert_eq!(p.value().unwrap(), default);
            assert_eq!(p.validation_status().unwrap(), status);
        }
    }

    #[test]
    fn test_events_carry_before_and_after() {
        let mut p = RealParameter::new("duty", 5.0).with_bounds(None, Some(10.0));
        let (events, listener) = recorder();
        p.subscribe(listener);

        p.set_value(Value::Real(20.0)).unwrap();
        p.validate().unwrap();
        p.reset().unwrap();

        let events = events.borrow();
        assert_eq!(
            events[0],
            ComponentEvent::ValueChanged {
                component: "duty".into(),
                old: Value::Real(5.0),
                new: Value::Real(20.0)
            }
        );
        assert!(matches!(
            &events[1],
            ComponentEvent::Validated {
                old: ValidationStatus::NotValidated,
                new: ValidationStatus::Invalid,
                ..
            }
        ));
        assert_eq!(events[2], ComponentEvent::Reset { component: "duty".into() });
    }

    #[test]
    fn test_rejected_write_emits_nothing() {
        let mut p = OptionParameter::new("o", "A", &["A", "B"]);
        let (events, listener) = recorder();
        p.subscribe(listener);

        assert!(p.set_value(Value::text("C")).is_err());
        assert!(p.set_value(Value::Real(1.0)).is_err());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_mode_change() {
        let mut p = IntegerParameter::new("stages", 10);
        let (events, listener) = recorder();
        p.subscribe(listener);

        p.set_mode(ParameterMode::Output).unwrap();
        assert_eq!(p.mode().unwrap(), ParameterMode::Output);
        assert_eq!(
            events.borrow()[0],
            ComponentEvent::ModeChanged {
                component: "stages".into(),
                old: ParameterMode::Input,
                new: ParameterMode::Output
            }
        );
    }

    #[test]
    fn test_default_value_write() {
        let mut p = BooleanParameter::new("flag", false);
        p.set_default_value(Value::Boolean(true)).unwrap();
        p.reset().unwrap();
        assert_eq!(p.value().unwrap(), Value::Boolean(true));
        assert!(p.set_default_value(Value::text("nope")).is_err());
    }

    #[test]
    fn test_constraints_match_type() {
        for p in every_variant() {
            assert_eq!(p.constraints().unwrap().parameter_type(), p.parameter_type());
        }
    }

    #[test]
    fn test_clone_drops_listeners() {
        let mut p = RealParameter::new("x", 1.0);
        let (events, listener) = recorder();
        p.subscribe(listener);

        let mut copy = p.clone_parameter().unwrap();
        copy.set_value(Value::Real(2.0)).unwrap();
        assert!(events.borrow().is_empty());
        assert_eq!(copy.name(), "x");
    }

    proptest! {
        #[test]
        fn prop_set_then_read_back(seed in -1000i32..1000) {
            for mut p in every_variant() {
                let v = sample_for(p.parameter_type(), seed);
                p.set_value(v.clone()).unwrap();
                prop_assert_eq!(p.value().unwrap(), v);
                prop_assert_eq!(p.validation_status().unwrap(), ValidationStatus::NotValidated);
            }
        }

        #[test]
        fn prop_reset_restores_default(seed in -1000i32..1000) {
            for mut p in every_variant() {
                let default = p.default_value().unwrap();
                p.set_value(sample_for(p.parameter_type(), seed)).unwrap();
                p.reset().unwrap();
                prop_assert_eq!(p.value().unwrap(), default);
            }
        }

        #[test]
        fn prop_clone_independence(a in -1000i32..1000, b in -1000i32..1000) {
            for mut original in every_variant() {
                let ty = original.parameter_type();
                original.set_value(sample_for(ty, a)).unwrap();
                let mut copy = original.clone_parameter().unwrap();

                copy.set_value(sample_for(ty, b)).unwrap();
                prop_assert_eq!(original.value().unwrap(), sample_for(ty, a));

                original.set_value(sample_for(ty, b.wrapping_add(1))).unwrap();
                prop_assert_eq!(copy.value().unwrap(), sample_for(ty, b));
            }
        }
    }
}
