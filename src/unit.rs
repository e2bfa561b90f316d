//! Unit operations: the host-facing component contract.
//!
//! A unit exposes a [`ParameterCollection`], a [`PortCollection`], a
//! validation status and a calculation entry point, and follows a fixed
//! lifecycle:
//!
//! ```text
//! Constructed --initialize--> Initialized --terminate--> Terminated
//! ```
//!
//! `validate` and `calculate` are only allowed while `Initialized`;
//! `initialize` only from `Constructed`. `terminate` may be called in any
//! state and is idempotent.

use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::parameters::{Parameter, ParameterCollection, Validatable};
use crate::ports::{NativePort, Port, PortCollection};
use crate::{CapeError, CapeResult, ValidationReport, ValidationStatus};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// Position of a unit in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Constructed,
    Initialized,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Constructed => "constructed",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Lifecycle state machine shared by native units and adapters.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle { state: LifecycleState::Constructed }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Fails unless `initialize` is allowed now.
    pub fn check_can_initialize(&self) -> CapeResult<()> {
        match self.state {
            LifecycleState::Constructed => Ok(()),
            other => {
                Err(CapeError::BadInvocationOrder(format!("initialize called on a {} unit", other)))
            }
        }
    }

    /// Fails unless the unit is initialized.
    pub fn require_initialized(&self, operation: &str) -> CapeResult<()> {
        match self.state {
            LifecycleState::Initialized => Ok(()),
            other => Err(CapeError::BadInvocationOrder(format!(
                "{} called on a {} unit",
                operation, other
            ))),
        }
    }

    pub fn mark_initialized(&mut self) {
        self.state = LifecycleState::Initialized;
    }

    pub fn mark_terminated(&mut self) {
        self.state = LifecycleState::Terminated;
    }

    pub fn is_terminated(&self) -> bool {
        self.state == LifecycleState::Terminated
    }
}

/// Host-facing unit operation contract, implemented identically by native
/// units and foreign adapters.
pub trait Unit: Identified {
    /// Creates the unit's parameters and ports.
    fn initialize(&mut self) -> CapeResult<()>;

    /// Releases connections and collections. Idempotent.
    fn terminate(&mut self) -> CapeResult<()>;

    /// Checks whether the unit is ready to calculate. Problems are reported,
    /// not returned as errors.
    fn validate(&mut self) -> CapeResult<ValidationReport>;

    /// Runs the unit's calculation.
    fn calculate(&mut self) -> CapeResult<()>;

    fn parameters(&self) -> &ParameterCollection;

    fn parameters_mut(&mut self) -> &mut ParameterCollection;

    fn ports(&self) -> &PortCollection;

    fn ports_mut(&mut self) -> &mut PortCollection;

    fn validation_status(&self) -> ValidationStatus;

    fn lifecycle_state(&self) -> LifecycleState;

    /// Independent copy of this unit.
    fn clone_unit(&self) -> CapeResult<Box<dyn Unit>>;

    /// Opens an editor; returns true if the user accepted. Headless units
    /// have none.
    fn edit(&mut self) -> CapeResult<bool> {
        Err(CapeError::NotImplemented(format!("Unit '{}' has no editor", self.name())))
    }
}

/// Calculation hook of a native unit.
pub type Calculation = Rc<dyn Fn(&mut ParameterCollection, &mut PortCollection) -> CapeResult<()>>;

/// A natively implemented unit operation.
///
/// Parameters and ports are declared up front as templates and materialized
/// into the unit's collections by `initialize`.
///
/// # Examples
///
/// ```
/// use nomata_cape::{
///     InformationStream, IntegerParameter, NativePort, NativeUnit, PortDirection, PortKind, Unit,
///     Valuable, Value,
/// };
/// use std::rc::Rc;
///
/// let mut column = NativeUnit::new("Column", "Shortcut column")
///     .with_parameter(IntegerParameter::new("stages", 10).with_bounds(Some(2), Some(200)))
///     .with_port(NativePort::new("reboiler duty", PortDirection::Input, PortKind::Energy))
///     .with_calculation(|params, _ports| {
///         params.by_name_mut("stages")?.set_value(Value::Integer(12))
///     });
///
/// assert!(column.calculate().is_err()); // not initialized yet
///
/// column.initialize().unwrap();
/// column
///     .ports_mut()
///     .by_name_mut("reboiler duty")
///     .unwrap()
///     .connect(Rc::new(InformationStream::new("Q", Value::Real(1.0e6))))
///     .unwrap();
///
/// assert!(column.validate().unwrap().valid);
/// column.calculate().unwrap();
/// assert_eq!(column.parameters().by_name("stages").unwrap().value().unwrap(), Value::Integer(12));
/// ```
pub struct NativeUnit {
    ident: Identification,
    status: ValidationStatus,
    lifecycle: Lifecycle,
    parameter_templates: Vec<Box<dyn Parameter>>,
    port_templates: Vec<NativePort>,
    parameters: ParameterCollection,
    ports: PortCollection,
    calculation: Option<Calculation>,
}

impl NativeUnit {
    /// Creates a unit with no parameters, ports or calculation.
    pub fn new(name: &str, description: &str) -> Self {
        NativeUnit {
            ident: Identification::with_description(name, description),
            status: ValidationStatus::NotValidated,
            lifecycle: Lifecycle::new(),
            parameter_templates: Vec::new(),
            port_templates: Vec::new(),
            parameters: ParameterCollection::new(),
            ports: PortCollection::new(),
            calculation: None,
        }
    }

    /// Declares a parameter. It is copied into the collection by `initialize`.
    pub fn with_parameter(mut self, parameter: impl Parameter + 'static) -> Self {
        self.parameter_templates.push(Box::new(parameter));
        self
    }

    /// Declares a port. It is copied into the collection by `initialize`.
    pub fn with_port(mut self, port: NativePort) -> Self {
        self.port_templates.push(port);
        self
    }

    /// Sets the calculation hook.
    pub fn with_calculation<F>(mut self, calculation: F) -> Self
    where
        F: Fn(&mut ParameterCollection, &mut PortCollection) -> CapeResult<()> + 'static,
    {
        self.calculation = Some(Rc::new(calculation));
        self
    }

    fn populate(&mut self) -> CapeResult<()> {
        for template in &self.parameter_templates {
            self.parameters.add(template.clone_parameter()?)?;
        }
        for template in &self.port_templates {
            self.ports.add(Box::new(template.detached()))?;
        }
        Ok(())
    }

    fn record_validation(&mut self, report: &ValidationReport) {
        let old = std::mem::replace(&mut self.status, report.status());
        self.ident.emit(ComponentEvent::Validated {
            component: self.ident.name().to_string(),
            old,
            new: self.status,
            message: report.message.clone(),
        });
    }
}

impl fmt::Debug for NativeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeUnit")
            .field("name", &self.ident.name())
            .field("state", &self.lifecycle.state())
            .field("status", &self.status)
            .field("parameters", &self.parameters)
            .field("ports", &self.ports)
            .finish()
    }
}

impl Identified for NativeUnit {
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

impl Unit for NativeUnit {
    fn initialize(&mut self) -> CapeResult<()> {
        self.lifecycle.check_can_initialize()?;
        if let Err(e) = self.populate() {
            self.parameters.clear();
            self.ports.clear();
            return Err(e);
        }
        self.lifecycle.mark_initialized();
        self.status = ValidationStatus::NotValidated;
        info!(
            unit = self.ident.name(),
            parameters = self.parameters.len(),
            ports = self.ports.len(),
            "unit initialized"
        );
        Ok(())
    }

    fn terminate(&mut self) -> CapeResult<()> {
        if self.lifecycle.is_terminated() {
            return Ok(());
        }
        let disconnected = self.ports.disconnect_all();
        self.ports.clear();
        self.parameters.clear();
        self.lifecycle.mark_terminated();
        info!(unit = self.ident.name(), "unit terminated");
        disconnected
    }

    fn validate(&mut self) -> CapeResult<ValidationReport> {
        self.lifecycle.require_initialized("validate")?;

        let mut problem = None;
        for parameter in self.parameters.iter_mut() {
            let report = parameter.validate()?;
            if !report.valid && problem.is_none() {
                problem = Some(format!("Parameter '{}': {}", parameter.name(), report.message));
            }
        }
        if problem.is_none() {
            problem = self
                .ports
                .iter()
                .find(|p| !p.is_connected())
                .map(|p| format!("Port '{}' is not connected", p.name()));
        }

        let report = match problem {
            Some(message) => ValidationReport::invalid(message),
            None => ValidationReport::valid(),
        };
        self.record_validation(&report);
        Ok(report)
    }

    fn calculate(&mut self) -> CapeResult<()> {
        self.lifecycle.require_initialized("calculate")?;
        debug!(unit = self.ident.name(), "calculating");
        match &self.calculation {
            Some(calculation) => calculation(&mut self.parameters, &mut self.ports),
            None => Ok(()),
        }
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

    fn validation_status(&self) -> ValidationStatus {
        self.status
    }

    fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn clone_unit(&self) -> CapeResult<Box<dyn Unit>> {
        let parameter_templates = self
            .parameter_templates
            .iter()
            .map(|p| p.clone_parameter())
            .collect::<CapeResult<Vec<_>>>()?;

        let mut ports = PortCollection::new();
        for port in self.ports.iter() {
            let copy = NativePort::new(port.name(), port.direction()?, port.kind()?)
                .with_description(port.description());
            ports.add(Box::new(copy))?;
        }

        Ok(Box::new(NativeUnit {
            ident: self.ident.clone(),
            status: ValidationStatus::NotValidated,
            lifecycle: self.lifecycle.clone(),
            parameter_templates,
            port_templates: self.port_templates.iter().map(NativePort::detached).collect(),
            parameters: self.parameters.try_clone()?,
            ports,
            calculation: self.calculation.clone(),
        }))
    }
}
