//! Persisted state of a foreign unit adapter.
//!
//! The layout records how to re-create the foreign instance, its
//! identification, the ordered parameter values and modes, and one optional
//! connection target per port. Parameters and ports are matched by
//! position on restore. Names are stored too, but only to detect drift.
//!
//! Restore runs in a fixed order:
//!
//! 1. resolve the origin (class identifier or type descriptor)
//! 2. instantiate through the factory
//! 3. initialize, which populates the collections
//! 4. overwrite name and description
//! 5. assign modes and values positionally
//! 6. reconnect ports positionally
//!
//! Steps 5 and 6 never abort the restore: a rejected value, a target that
//! cannot be resolved or a refused connection is logged and skipped.

use crate::foreign::{ForeignFactory, ForeignOrigin, ForeignUnitAdapter, TypeDescriptor};
use crate::identification::Identified;
use crate::ports::Connectable;
use crate::unit::Unit;
use crate::value::Value;
use crate::{CapeError, CapeResult, ParameterMode};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, warn};

/// Reference to whatever a port was connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub name: String,
}

impl ConnectionTarget {
    pub fn new(name: &str) -> Self {
        ConnectionTarget { name: name.to_string() }
    }
}

/// Reconstructs connection targets during restore.
pub trait ConnectionResolver {
    fn resolve(&self, target: &ConnectionTarget) -> CapeResult<Rc<dyn Connectable>>;
}

impl<F> ConnectionResolver for F
where
    F: Fn(&ConnectionTarget) -> CapeResult<Rc<dyn Connectable>>,
{
    fn resolve(&self, target: &ConnectionTarget) -> CapeResult<Rc<dyn Connectable>> {
        self(target)
    }
}

/// Serialized adapter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUnit {
    pub is_foreign: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_descriptor: Option<TypeDescriptor>,
    pub name: String,
    pub description: String,
    pub parameter_values: Vec<Value>,
    pub parameter_modes: Vec<ParameterMode>,
    #[serde(default)]
    pub parameter_names: Vec<String>,
    pub port_connections: Vec<Option<ConnectionTarget>>,
}

impl PersistedUnit {
    /// Origin recorded in this state.
    ///
    /// Fails with `Persistence` when the identifier matching `is_foreign` is absent.
    pub fn origin(&self) -> CapeResult<ForeignOrigin> {
        if self.is_foreign {
            match &self.class_id {
                Some(class_id) => Ok(ForeignOrigin::Shared { class_id: class_id.clone() }),
                None => Err(CapeError::Persistence(
                    "shared unit state has no class identifier".to_string(),
                )),
            }
        } else {
            match &self.type_descriptor {
                Some(descriptor) => Ok(ForeignOrigin::InProcess { descriptor: descriptor.clone() }),
                None => Err(CapeError::Persistence(
                    "in-process unit state has no type descriptor".to_string(),
                )),
            }
        }
    }

    pub fn to_json(&self) -> CapeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CapeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ForeignUnitAdapter {
    /// Captures the adapter's current state.
    pub fn persist(&self) -> CapeResult<PersistedUnit> {
        let (is_foreign, class_id, type_descriptor) = match self.origin() {
            ForeignOrigin::Shared { class_id } => (true, Some(class_id.clone()), None),
            ForeignOrigin::InProcess { descriptor } => (false, None, Some(descriptor.clone())),
        };

        let parameters = self.parameters();
        let mut parameter_values = Vec::with_capacity(parameters.len());
        let mut parameter_modes = Vec::with_capacity(parameters.len());
        for parameter in parameters.iter() {
            parameter_values.push(parameter.value()?);
            parameter_modes.push(parameter.mode()?);
        }

        Ok(PersistedUnit {
            is_foreign,
            class_id,
            type_descriptor,
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameter_values,
            parameter_modes,
            parameter_names: parameters.names(),
            port_connections: self
                .ports()
                .iter()
                .map(|port| {
                    port.connected_object().map(|object| ConnectionTarget { name: object.name() })
                })
                .collect(),
        })
    }

    /// Re-creates an adapter from persisted state.
    ///
    /// Only the first four steps can fail the restore; see the module docs.
    pub fn restore(
        state: &PersistedUnit,
        factory: Rc<dyn ForeignFactory>,
        resolver: &dyn ConnectionResolver,
    ) -> CapeResult<Self> {
        let origin = state.origin()?;
        let mut adapter = ForeignUnitAdapter::instantiate(&origin, factory)?;
        adapter.initialize()?;
        adapter.set_name(&state.name)?;
        adapter.set_description(&state.description)?;
        adapter.restore_parameters(state);
        adapter.restore_connections(state, resolver);
        debug!(unit = adapter.name(), "foreign unit restored");
        Ok(adapter)
    }

    fn restore_parameters(&mut self, state: &PersistedUnit) {
        let unit = self.name().to_string();
        let parameters = self.parameters_mut();
        if state.parameter_values.len() != parameters.len() {
            warn!(
                %unit,
                persisted = state.parameter_values.len(),
                reported = parameters.len(),
                "persisted parameter count differs from the foreign unit"
            );
        }

        for (index, value) in state.parameter_values.iter().enumerate() {
            let Ok(parameter) = parameters.get_mut(index) else {
                warn!(%unit, index, "no parameter at persisted position, value dropped");
                continue;
            };
            if let Some(expected) = state.parameter_names.get(index) {
                if expected != parameter.name() {
                    warn!(
                        %unit,
                        index,
                        %expected,
                        found = parameter.name(),
                        "parameter order drifted since persisted"
                    );
                }
            }
            if let Some(mode) = state.parameter_modes.get(index) {
                if let Err(e) = parameter.set_mode(*mode) {
                    let parameter = parameter.name();
                    warn!(%unit, parameter, error = %e, "could not restore parameter mode");
                }
            }
            if let Err(e) = parameter.set_value(value.clone()) {
                let parameter = parameter.name();
                warn!(%unit, parameter, error = %e, "could not restore parameter value");
            }
        }
    }

    fn restore_connections(&mut self, state: &PersistedUnit, resolver: &dyn ConnectionResolver) {
        let unit = self.name().to_string();
        for (index, target) in state.port_connections.iter().enumerate() {
            let Some(target) = target else {
                continue;
            };
            let object = match resolver.resolve(target) {
                Ok(object) => object,
                Err(e) => {
                    warn!(
                        %unit,
                        target = %target.name,
                        error = %e,
                        "connection target could not be reconstructed"
                    );
                    continue;
                }
            };
            match self.ports_mut().get_mut(index) {
                Ok(port) => {
                    if let Err(e) = port.connect(object) {
                        let port = port.name();
                        warn!(%unit, port, error = %e, "could not restore port connection");
                    }
                }
                Err(_) => warn!(%unit, index, "no port at persisted position, connection dropped"),
            }
        }
    }
}
