//! Option (string choice) parameter.
//!
//! When restricted to its list, writes of values outside the list are
//! rejected with `InvalidArgument`. Membership is an exact, case-sensitive
//! match. The list itself may change later, so `validate()` repeats the
//! membership check.

use super::{Constraints, NativeParameter, ParameterConstraint};
use crate::{CapeError, CapeResult};

/// Constraints of an option parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSpec {
    pub options: Vec<String>,
    pub restricted: bool,
}

impl OptionSpec {
    fn allows(&self, value: &str) -> bool {
        !self.restricted || self.options.iter().any(|o| o == value)
    }

    fn rejection(&self, value: &str) -> String {
        format!("Value \"{}\" is not one of [{}]", value, self.options.join(", "))
    }
}

impl ParameterConstraint for OptionSpec {
    type Value = String;

    fn admit(&self, value: &String) -> CapeResult<()> {
        if self.allows(value) {
            Ok(())
        } else {
            Err(CapeError::InvalidArgument(self.rejection(value)))
        }
    }

    fn check(&self, value: &String) -> Result<(), String> {
        if self.allows(value) { Ok(()) } else { Err(self.rejection(value)) }
    }

    fn describe(&self) -> Constraints {
        Constraints::Option { options: self.options.clone(), restricted: self.restricted }
    }
}

/// Option parameter.
pub type OptionParameter = NativeParameter<OptionSpec>;

impl NativeParameter<OptionSpec> {
    /// Creates an option parameter restricted to `options`.
    ///
    /// The default is not checked against the list here; `validate()`
    /// reports an unlisted default, and `set_default` enforces the list.
    pub fn new(name: &str, default: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        let spec = OptionSpec { options, restricted: true };
        NativeParameter::with_constraint(name, default.to_string(), spec)
    }

    /// Allows values outside the list.
    pub fn unrestricted(mut self) -> Self {
        self.set_restricted(false);
        self
    }

    /// Ordered option list.
    pub fn options(&self) -> &[String] {
        &self.spec().options
    }

    pub fn is_restricted(&self) -> bool {
        self.spec().restricted
    }

    /// Replaces the option list. The current value is kept even if it is no
    /// longer listed; `validate()` will report it.
    pub fn set_options(&mut self, options: &[&str]) {
        self.update_spec(|spec| spec.options = options.iter().map(|o| o.to_string()).collect());
    }

    pub fn set_restricted(&mut self, restricted: bool) {
        self.update_spec(|spec| spec.restricted = restricted);
    }
}
