//! Foreign units re-exposed as native [`Unit`]s.
//!
//! The adapter binds to four capabilities of the foreign instance once, at
//! construction: identification, unit, parameter collection and port
//! collection. It builds its own parameter and port collections only after
//! the foreign `initialize` has run, because a foreign unit creates them
//! there.

use super::parameter::adapt_parameter;
use super::port::ForeignPortAdapter;
use super::{
    ForeignFactory, ForeignIdentification, ForeignObject, ForeignOrigin, ForeignParameterCollection,
    ForeignPortCollection, ForeignUnit,
};
use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::parameters::ParameterCollection;
use crate::persistence::ConnectionTarget;
use crate::ports::{Connectable, PortCollection};
use crate::unit::{Lifecycle, LifecycleState, Unit};
use crate::{CapeError, CapeResult, ValidationReport, ValidationStatus};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Reported by `validate` once the foreign instance has been released.
pub const NO_FOREIGN_UNIT: &str = "No foreign unit is bound to this adapter";

/// Capabilities of a bound foreign instance.
struct ForeignUnitBinding {
    identification: Rc<dyn ForeignIdentification>,
    unit: Rc<dyn ForeignUnit>,
    parameters: Rc<dyn ForeignParameterCollection>,
    ports: Rc<dyn ForeignPortCollection>,
}

impl ForeignUnitBinding {
    fn bind(object: Rc<dyn ForeignObject>) -> CapeResult<Self> {
        let missing = |capability: &str| {
            let message = format!("Foreign object lacks the {} capability", capability);
            CapeError::InvalidArgument(message)
        };
        let identification =
            object.clone().as_identification().ok_or_else(|| missing("identification"))?;
        let unit = object.clone().as_unit().ok_or_else(|| missing("unit"))?;
        let parameters = object
            .clone()
            .as_parameter_collection()
            .ok_or_else(|| missing("parameter collection"))?;
        let ports = object.as_port_collection().ok_or_else(|| missing("port collection"))?;
        Ok(ForeignUnitBinding { identification, unit, parameters, ports })
    }
}

/// Adapter presenting a foreign unit as a [`Unit`].
///
/// Collections are empty until `initialize` succeeds. Dropping the adapter
/// releases the foreign instance without terminating it.
pub struct ForeignUnitAdapter {
    ident: Identification,
    origin: ForeignOrigin,
    factory: Rc<dyn ForeignFactory>,
    binding: Option<ForeignUnitBinding>,
    lifecycle: Lifecycle,
    parameters: ParameterCollection,
    ports: PortCollection,
}

impl ForeignUnitAdapter {
    /// Creates a shareable foreign unit through `factory` and binds to it.
    pub fn from_class_id(class_id: &str, factory: Rc<dyn ForeignFactory>) -> CapeResult<Self> {
        let object = factory.create(class_id)?;
        info!(class_id, "foreign unit created");
        Self::from_instance(object, factory)
    }

    /// Creates a foreign unit of the given origin through `factory` and binds to it.
    pub fn instantiate(
        origin: &ForeignOrigin,
        factory: Rc<dyn ForeignFactory>,
    ) -> CapeResult<Self> {
        let object = factory.instantiate(origin)?;
        debug!(?origin, "foreign unit created");
        Self::from_instance(object, factory)
    }

    /// Binds to an existing foreign instance.
    ///
    /// Fails with `InvalidArgument`, naming the capability, when the instance
    /// is missing one the adapter needs. `factory` is kept for clones.
    pub fn from_instance(
        object: Rc<dyn ForeignObject>,
        factory: Rc<dyn ForeignFactory>,
    ) -> CapeResult<Self> {
        let origin = object.origin();
        let binding = ForeignUnitBinding::bind(object)?;
        let ident = Identification::with_description(
            &binding.identification.component_name()?,
            &binding.identification.component_description()?,
        );
        Ok(ForeignUnitAdapter {
            ident,
            origin,
            factory,
            binding: Some(binding),
            lifecycle: Lifecycle::new(),
            parameters: ParameterCollection::new(),
            ports: PortCollection::new(),
        })
    }

    /// How the wrapped instance was created.
    pub fn origin(&self) -> &ForeignOrigin {
        &self.origin
    }

    /// Factory used for clones and restores.
    pub fn factory(&self) -> &Rc<dyn ForeignFactory> {
        &self.factory
    }

    /// Whether a foreign instance is still bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn binding(&self) -> CapeResult<&ForeignUnitBinding> {
        let binding = self.binding.as_ref();
        binding.ok_or_else(|| CapeError::BadInvocationOrder(NO_FOREIGN_UNIT.to_string()))
    }

    fn wrap_collections(&mut self) -> CapeResult<()> {
        let binding = self.binding()?;
        let foreign_ports = binding.ports.clone();
        let foreign_parameters = binding.parameters.clone();

        for index in 0..foreign_ports.count()? {
            let port = ForeignPortAdapter::wrap(foreign_ports.item(index)?)?;
            self.ports.add(Box::new(port))?;
        }
        for index in 0..foreign_parameters.count()? {
            self.parameters.add(adapt_parameter(foreign_parameters.item(index)?)?)?;
        }
        Ok(())
    }

    /// Fresh foreign instance with this unit's name, description and
    /// parameter state. Ports come back disconnected.
    fn duplicate(&self) -> CapeResult<ForeignUnitAdapter> {
        if self.lifecycle.state() == LifecycleState::Initialized {
            let mut state = self.persist()?;
            for connection in state.port_connections.iter_mut() {
                *connection = None;
            }
            let unresolvable = |target: &ConnectionTarget| -> CapeResult<Rc<dyn Connectable>> {
                Err(CapeError::NotFound(target.name.clone()))
            };
            return ForeignUnitAdapter::restore(&state, self.factory.clone(), &unresolvable);
        }

        let mut copy = ForeignUnitAdapter::instantiate(&self.origin, self.factory.clone())?;
        copy.set_name(self.ident.name())?;
        copy.set_description(self.ident.description())?;
        Ok(copy)
    }
}

impl fmt::Debug for ForeignUnitAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignUnitAdapter")
            .field("name", &self.ident.name())
            .field("origin", &self.origin)
            .field("bound", &self.binding.is_some())
            .field("state", &self.lifecycle.state())
            .field("parameters", &self.parameters)
            .field("ports", &self.ports)
            .finish()
    }
}

impl Identified for ForeignUnitAdapter {
    fn identification(&self) -> &Identification {
        &self.ident
    }

    fn set_name(&mut self, name: &str) -> CapeResult<()> {
        let identification = self.binding()?.identification.clone();
        identification.set_component_name(name)?;
        let confirmed = identification.component_name()?;
        self.ident.set_name(&confirmed);
        Ok(())
    }

    fn set_description(&mut self, description: &str) -> CapeResult<()> {
        let identification = self.binding()?.identification.clone();
        identification.set_component_description(description)?;
        let confirmed = identification.component_description()?;
        self.ident.set_description(&confirmed);
        Ok(())
    }

    fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.ident.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.ident.unsubscribe(id)
    }
}

impl Unit for ForeignUnitAdapter {
    /// Forwards `initialize`, then wraps whatever parameters and ports the
    /// foreign unit reports, in its order. An unknown parameter tag fails the
    /// whole call and leaves both collections empty.
    fn initialize(&mut self) -> CapeResult<()> {
        self.lifecycle.check_can_initialize()?;
        let unit = self.binding()?.unit.clone();
        unit.initialize()?;

        if let Err(e) = self.wrap_collections() {
            warn!(unit = self.ident.name(), error = %e, "could not wrap foreign collections");
            self.parameters.clear();
            self.ports.clear();
            return Err(e);
        }
        self.lifecycle.mark_initialized();
        info!(
            unit = self.ident.name(),
            parameters = self.parameters.len(),
            ports = self.ports.len(),
            "foreign unit initialized"
        );
        Ok(())
    }

    /// Forwards `terminate`, then disconnects and drops every wrapper and
    /// releases the foreign instance. Local teardown happens even when the
    /// foreign call fails; that failure is returned afterwards.
    fn terminate(&mut self) -> CapeResult<()> {
        if self.lifecycle.is_terminated() {
            return Ok(());
        }
        let forwarded = match &self.binding {
            Some(binding) => binding.unit.terminate(),
            None => Ok(()),
        };
        if let Err(e) = self.ports.disconnect_all() {
            warn!(unit = self.ident.name(), error = %e, "port disconnect failed during terminate");
        }
        self.ports.clear();
        self.parameters.clear();
        self.binding = None;
        self.lifecycle.mark_terminated();
        info!(unit = self.ident.name(), "foreign unit terminated");
        forwarded
    }

    /// Reports [`NO_FOREIGN_UNIT`] once unbound; otherwise requires
    /// `initialize` before forwarding.
    fn validate(&mut self) -> CapeResult<ValidationReport> {
        let Some(binding) = &self.binding else {
            return Ok(ValidationReport::invalid(NO_FOREIGN_UNIT));
        };
        let unit = binding.unit.clone();
        self.lifecycle.require_initialized("validate")?;
        let old = self.validation_status();
        let report = unit.validate()?;
        let new = self.validation_status();
        self.ident.emit(ComponentEvent::Validated {
            component: self.ident.name().to_string(),
            old,
            new,
            message: report.message.clone(),
        });
        Ok(report)
    }

    fn calculate(&mut self) -> CapeResult<()> {
        self.lifecycle.require_initialized("calculate")?;
        let unit = self.binding()?.unit.clone();
        debug!(unit = self.ident.name(), "forwarding calculate");
        unit.calculate()
    }

    fn parameters(&self) -> &ParameterCollection {
        &self.parameters
    }

    fn parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.parameters
    }

    fn ports(&self) -> &PortCollection {
        &self.ports
    }

    fn ports_mut(&mut self) -> &mut PortCollection {
        &mut self.ports
    }

    /// `Invalid` when unbound or when the foreign status cannot be read.
    fn validation_status(&self) -> ValidationStatus {
        let Some(binding) = &self.binding else {
            return ValidationStatus::Invalid;
        };
        match binding.unit.validation_status() {
            Ok(status) => status,
            Err(e) => {
                let unit = self.ident.name();
                warn!(unit, error = %e, "could not read foreign validation status");
                ValidationStatus::Invalid
            }
        }
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Creates a new foreign instance and copies this unit's state into it.
    fn clone_unit(&self) -> CapeResult<Box<dyn Unit>> {
        Ok(Box::new(self.duplicate()?))
    }
}
