//! # Nomata CAPE: Parameters, Ports and Foreign Unit Adapters
//!
//! Exposes process-simulation unit operations to a host simulation
//! environment through a single component contract. A unit publishes a named,
//! ordered collection of typed **parameters** and **ports**, supports
//! validation and reset-to-default semantics, and may be implemented either
//! natively or by a foreign component living behind a binary boundary.
//!
//! The host cannot tell the two apart: a [`foreign::ForeignUnitAdapter`]
//! wraps the foreign instance, introspects its parameters and ports during
//! `initialize`, and re-exposes everything through the same [`Unit`],
//! [`Parameter`] and [`Port`] traits a [`NativeUnit`] implements.
//!
//! ## Example
//!
//! ```
//! use nomata_cape::{
//!     NativeUnit, NativePort, PortDirection, PortKind, RealParameter, OptionParameter,
//!     Unit, Valuable, Validatable, Value, ValidationStatus,
//! };
//!
//! let mut heater = NativeUnit::new("Heater", "Simple heater")
//!     .with_parameter(RealParameter::new("duty", 0.0).with_bounds(Some(0.0), Some(1.0e6)))
//!     .with_parameter(OptionParameter::new("mode", "Duty", &["Duty", "Outlet T"]))
//!     .with_port(NativePort::new("feed", PortDirection::Input, PortKind::Material));
//!
//! heater.initialize().unwrap();
//!
//! let duty = heater.parameters_mut().by_name_mut("duty").unwrap();
//! duty.set_value(Value::Real(2.0e6)).unwrap();
//! assert_eq!(duty.validation_status().unwrap(), ValidationStatus::NotValidated);
//!
//! // Bounds are advisory when writing, enforced when validating
//! assert!(!duty.validate().unwrap().valid);
//! ```
//!
//! ## Layout
//!
//! - [`value`]: the untyped value slot and typed narrowing
//! - [`identification`]: names, descriptions and change notification
//! - [`parameters`]: capability traits, native parameter variants, collection
//! - [`ports`]: connection capabilities, native ports, collection
//! - [`streams`]: concrete connectable objects
//! - [`unit`]: lifecycle state machine and native units
//! - [`foreign`]: foreign boundary contracts and their adapters
//! - [`persistence`]: persisted adapter state
//! - [`discovery`]: candidate listing and reference resolution

use serde::{Deserialize, Serialize};

pub mod discovery;
pub mod foreign;
pub mod identification;
pub mod parameters;
pub mod persistence;
pub mod ports;
pub mod streams;
pub mod unit;
pub mod value;

pub use discovery::{
    Capability, Discovery, Implementation, ReferenceResolver, SourceKind, StaticResolver,
    UnitDescriptor,
};
pub use foreign::{ForeignFactory, ForeignObject, ForeignOrigin, ForeignUnitAdapter, TypeDescriptor};
pub use identification::{
    ComponentEvent, Identification, Identified, Listener, ListenerId, Notifier,
};
pub use parameters::{
    ArrayParameter, BooleanParameter, Constraints, IntegerParameter, NativeParameter,
    OptionParameter, Parameter, ParameterCollection, RealParameter, Resettable, Specifiable,
    Validatable, Valuable,
};
pub use persistence::{ConnectionResolver, ConnectionTarget, PersistedUnit};
pub use ports::{Connectable, MaterialObject, NativePort, Port, PortCollection, ValueCarrier};
pub use streams::{InformationStream, MaterialStream};
pub use unit::{Lifecycle, LifecycleState, NativeUnit, Unit};
pub use value::{ParameterValueType, Value};

/// Result type for every component operation.
pub type CapeResult<T> = Result<T, CapeError>;

/// Errors surfaced by parameters, ports, units and their foreign adapters.
///
/// Validation problems are never reported through this type: they come back
/// as a [`ValidationReport`] and a [`ComponentEvent::Validated`] event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapeError {
    /// Caller-supplied value violates a declared constraint; state is unchanged
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Lookup by name or reference failed
    #[error("Not found: {0}")]
    NotFound(String),
    /// Operation has no meaningful implementation for this component
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    /// Lifecycle method called outside its allowed state
    #[error("Bad invocation order: {0}")]
    BadInvocationOrder(String),
    /// Wrapped foreign instance reported an error; category is passed through as reported
    #[error("Foreign failure [{category}]: {message}")]
    ForeignFailure { category: String, message: String },
    /// Foreign parameter reported a type tag with no matching variant
    #[error("Unknown parameter variant tag: {0}")]
    UnknownVariant(i32),
    /// Persisted state could not be encoded or decoded
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl CapeError {
    /// Shorthand for a foreign-reported failure.
    pub fn foreign(category: &str, message: &str) -> Self {
        CapeError::ForeignFailure { category: category.to_string(), message: message.to_string() }
    }
}

impl From<serde_json::Error> for CapeError {
    fn from(err: serde_json::Error) -> Self {
        CapeError::Persistence(err.to_string())
    }
}

/// Validation status of a parameter or unit.
///
/// Only `validate()` moves a component out of `NotValidated`; any value
/// mutation moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValidationStatus {
    #[default]
    NotValidated,
    Invalid,
    Valid,
}

impl ValidationStatus {
    /// Numeric code used on the foreign boundary.
    pub fn code(self) -> i32 {
        match self {
            ValidationStatus::NotValidated => 0,
            ValidationStatus::Invalid => 1,
            ValidationStatus::Valid => 2,
        }
    }

    /// Decodes a foreign status code.
    pub fn from_code(code: i32) -> CapeResult<Self> {
        match code {
            0 => Ok(ValidationStatus::NotValidated),
            1 => Ok(ValidationStatus::Invalid),
            2 => Ok(ValidationStatus::Valid),
            other => {
                Err(CapeError::InvalidArgument(format!("Unknown validation status code {}", other)))
            }
        }
    }
}

/// Outcome of a `validate()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// True iff the new status is `Valid`
    pub valid: bool,
    /// Human-readable reason (empty when valid)
    pub message: String,
}

impl ValidationReport {
    /// A passing report.
    pub fn valid() -> Self {
        ValidationReport { valid: true, message: String::new() }
    }

    /// A failing report with a reason.
    pub fn invalid(message: impl Into<String>) -> Self {
        ValidationReport { valid: false, message: message.into() }
    }

    /// Status implied by this report.
    pub fn status(&self) -> ValidationStatus {
        if self.valid { ValidationStatus::Valid } else { ValidationStatus::Invalid }
    }
}

/// Whether a parameter is specified by the user, computed by the unit, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterMode {
    #[default]
    Input,
    Output,
    InputOutput,
}

impl ParameterMode {
    /// Numeric code used on the foreign boundary.
    pub fn code(self) -> i32 {
        match self {
            ParameterMode::Input => 0,
            ParameterMode::Output => 1,
            ParameterMode::InputOutput => 2,
        }
    }

    /// Decodes a foreign mode code.
    pub fn from_code(code: i32) -> CapeResult<Self> {
        match code {
            0 => Ok(ParameterMode::Input),
            1 => Ok(ParameterMode::Output),
            2 => Ok(ParameterMode::InputOutput),
            other => {
                Err(CapeError::InvalidArgument(format!("Unknown parameter mode code {}", other)))
            }
        }
    }
}

/// Closed set of parameter variants.
///
/// Foreign parameters report their variant as a numeric tag; [`ParameterType::from_tag`]
/// is the only place that tag is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    Real,
    Integer,
    Option,
    Boolean,
    Array,
}

impl ParameterType {
    /// Numeric tag used on the foreign boundary.
    pub fn tag(self) -> i32 {
        match self {
            ParameterType::Real => 0,
            ParameterType::Integer => 1,
            ParameterType::Option => 2,
            ParameterType::Boolean => 3,
            ParameterType::Array => 4,
        }
    }

    /// Decodes a foreign type tag, failing with `UnknownVariant` for unsupported tags.
    pub fn from_tag(tag: i32) -> CapeResult<Self> {
        match tag {
            0 => Ok(ParameterType::Real),
            1 => Ok(ParameterType::Integer),
            2 => Ok(ParameterType::Option),
            3 => Ok(ParameterType::Boolean),
            4 => Ok(ParameterType::Array),
            other => Err(CapeError::UnknownVariant(other)),
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParameterType::Real => "real",
            ParameterType::Integer => "integer",
            ParameterType::Option => "option",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
        };
        f.write_str(name)
    }
}

/// Flow direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
    InputOutput,
}

/// Kind of object a port carries.
///
/// Material ports require a [`MaterialObject`] capability on the connected
/// object; energy and information ports require a [`ValueCarrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    Material,
    Energy,
    Information,
}

impl std::fmt::Display for PortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortKind::Material => "material",
            PortKind::Energy => "energy",
            PortKind::Information => "information",
        };
        f.write_str(name)
    }
}
