//! Foreign components and their adapters.
//!
//! A foreign component lives behind a binary boundary: it shares no memory
//! model with this crate, may fail independently, and is reached only
//! through the narrow contracts defined here. Every contract method takes
//! `&self` and returns a [`CapeResult`], because any call may cross a process
//! boundary and fail.
//!
//! Capabilities are discovered, not assumed. A [`ForeignObject`] answers
//! capability queries (`as_unit`, `as_parameter_collection`, ...) much like an
//! interface query; an adapter binds to exactly the capabilities it needs and
//! refuses to bind when one is missing.
//!
//! The adapters re-expose foreign components through the native contracts:
//!
//! - [`ForeignUnitAdapter`] implements [`Unit`](crate::Unit)
//! - [`ForeignParameterAdapter`] implements [`Parameter`](crate::Parameter), one alias per variant
//! - [`ForeignPortAdapter`] implements [`Port`](crate::Port)
//!
//! Adapters hold foreign instances by `Rc` but never decide their lifetime:
//! dropping an adapter only drops its reference, and nothing is torn down on
//! the foreign side unless `terminate` is called explicitly.

use crate::parameters::Constraints;
use crate::ports::Connectable;
use crate::value::Value;
use crate::{CapeResult, ParameterMode, PortDirection, PortKind, ValidationReport, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub mod parameter;
pub mod port;
pub mod unit;

#[cfg(test)]
pub(crate) mod fixtures;

pub use parameter::{
    ForeignArrayParameter, ForeignBooleanParameter, ForeignIntegerParameter, ForeignOptionParameter,
    ForeignParameterAdapter, ForeignRealParameter, adapt_parameter,
};
pub use port::{ForeignPortAdapter, MaterialObjectAdapter};
pub use unit::ForeignUnitAdapter;

/// Descriptor of an in-process implementation, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub module: String,
    pub type_name: String,
}

impl TypeDescriptor {
    pub fn new(module: &str, type_name: &str) -> Self {
        TypeDescriptor { module: module.to_string(), type_name: type_name.to_string() }
    }
}

/// How a foreign instance was created, and therefore how to create another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignOrigin {
    /// Shareable (possibly out-of-process) component, created by class identifier
    Shared { class_id: String },
    /// In-process component, created from a type descriptor
    InProcess { descriptor: TypeDescriptor },
}

/// Name and description of a foreign component.
pub trait ForeignIdentification {
    fn component_name(&self) -> CapeResult<String>;

    fn set_component_name(&self, name: &str) -> CapeResult<()>;

    fn component_description(&self) -> CapeResult<String>;

    fn set_component_description(&self, description: &str) -> CapeResult<()>;
}

/// Lifecycle and calculation of a foreign unit.
pub trait ForeignUnit {
    /// Creates the foreign unit's parameters and ports.
    fn initialize(&self) -> CapeResult<()>;

    fn terminate(&self) -> CapeResult<()>;

    fn calculate(&self) -> CapeResult<()>;

    fn validate(&self) -> CapeResult<ValidationReport>;

    fn validation_status(&self) -> CapeResult<ValidationStatus>;
}

/// Positional enumeration of a foreign unit's parameters.
pub trait ForeignParameterCollection {
    fn count(&self) -> CapeResult<usize>;

    fn item(&self, index: usize) -> CapeResult<Rc<dyn ForeignParameter>>;
}

/// Positional enumeration of a foreign unit's ports.
pub trait ForeignPortCollection {
    fn count(&self) -> CapeResult<usize>;

    fn item(&self, index: usize) -> CapeResult<Rc<dyn ForeignPort>>;
}

/// A foreign instance answering capability queries.
pub trait ForeignObject {
    /// How this instance was created.
    fn origin(&self) -> ForeignOrigin;

    fn as_identification(self: Rc<Self>) -> Option<Rc<dyn ForeignIdentification>> {
        None
    }

    fn as_unit(self: Rc<Self>) -> Option<Rc<dyn ForeignUnit>> {
        None
    }

    fn as_parameter_collection(self: Rc<Self>) -> Option<Rc<dyn ForeignParameterCollection>> {
        None
    }

    fn as_port_collection(self: Rc<Self>) -> Option<Rc<dyn ForeignPortCollection>> {
        None
    }
}

/// A foreign parameter. The value slot is untyped; the variant is reported
/// as a numeric tag (see [`ParameterType::from_tag`](crate::ParameterType::from_tag)).
pub trait ForeignParameter: ForeignIdentification {
    fn type_tag(&self) -> CapeResult<i32>;

    fn value(&self) -> CapeResult<Value>;

    fn set_value(&self, value: Value) -> CapeResult<()>;

    fn mode(&self) -> CapeResult<ParameterMode>;

    fn set_mode(&self, mode: ParameterMode) -> CapeResult<()>;

    fn validation_status(&self) -> CapeResult<ValidationStatus>;

    fn validate(&self) -> CapeResult<ValidationReport>;

    fn reset(&self) -> CapeResult<()>;

    fn default_value(&self) -> CapeResult<Value>;

    fn constraints(&self) -> CapeResult<Constraints>;

    /// A new, independent foreign parameter with the same state.
    fn duplicate(&self) -> CapeResult<Rc<dyn ForeignParameter>>;

    /// Optional capability: writable default value.
    fn as_default_mutator(&self) -> Option<&dyn ForeignDefaultMutator> {
        None
    }
}

/// Capability of foreign parameters whose default value can be written.
pub trait ForeignDefaultMutator {
    fn set_default_value(&self, value: Value) -> CapeResult<()>;
}

/// Material object as seen from the foreign side of the boundary.
pub trait ForeignMaterial {
    fn component_ids(&self) -> CapeResult<Vec<String>>;

    fn property(&self, name: &str) -> CapeResult<Vec<f64>>;

    fn set_property(&self, name: &str, values: &[f64]) -> CapeResult<()>;
}

/// What a foreign port receives on `connect`.
#[derive(Clone)]
pub enum ForeignConnection {
    /// Material object, already wrapped for the boundary
    Material(Rc<dyn ForeignMaterial>),
    /// Parameter-like object for energy and information ports
    Value(Rc<dyn Connectable>),
}

/// A foreign port.
pub trait ForeignPort: ForeignIdentification {
    fn direction(&self) -> CapeResult<PortDirection>;

    fn kind(&self) -> CapeResult<PortKind>;

    fn connect(&self, object: ForeignConnection) -> CapeResult<()>;

    fn disconnect(&self) -> CapeResult<()>;
}

/// Instantiation mechanism for foreign units, injected by the host.
pub trait ForeignFactory {
    /// Creates a shareable component from its class identifier.
    fn create(&self, class_id: &str) -> CapeResult<Rc<dyn ForeignObject>>;

    /// Creates an in-process component from its type descriptor.
    fn create_in_process(&self, descriptor: &TypeDescriptor) -> CapeResult<Rc<dyn ForeignObject>>;

    /// Creates a new instance with the given origin.
    fn instantiate(&self, origin: &ForeignOrigin) -> CapeResult<Rc<dyn ForeignObject>> {
        match origin {
            ForeignOrigin::Shared { class_id } => self.create(class_id),
            ForeignOrigin::InProcess { descriptor } => self.create_in_process(descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_json() {
        let descriptor = TypeDescriptor::new("units.dll", "Units.Heater");
        let origin = ForeignOrigin::InProcess { descriptor };
        let json = serde_json::to_string(&origin).unwrap();
        assert_eq!(serde_json::from_str::<ForeignOrigin>(&json).unwrap(), origin);
    }
}
