//! In-memory foreign components for adapter tests.
//!
//! [`FakeUnit`] behaves like a foreign unit: it creates its parameters and
//! ports only when initialized, reports a numeric type tag per parameter,
//! and records every call it receives.

use super::{
    ForeignConnection, ForeignDefaultMutator, ForeignFactory, ForeignIdentification, ForeignObject,
    ForeignOrigin, ForeignParameter, ForeignParameterCollection, ForeignPort, ForeignPortCollection,
    ForeignUnit, TypeDescriptor,
};
use crate::identification::Identified;
use crate::parameters::{
    ArrayParameter, BooleanParameter, Constraints, IntegerParameter, OptionParameter, Parameter,
    RealParameter, Resettable, Specifiable, Validatable, Valuable,
};
use crate::value::Value;
use crate::{
    CapeError, CapeResult, ParameterMode, ParameterType, PortDirection, PortKind, ValidationReport,
    ValidationStatus,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) const HEATER_CLASS: &str = "{7D3C51A0-HEATER}";

/// One native parameter of every variant, each with a constraint to check.
pub(crate) fn every_variant() -> Vec<Box<dyn Parameter>> {
    let mut params: Vec<Box<dyn Parameter>> = Vec::new();
    params.push(Box::new(RealParameter::new("r", 1.0).with_bounds(Some(0.0), Some(100.0))));
    params.push(Box::new(IntegerParameter::new("i", 2).with_bounds(Some(0), Some(10))));
    params.push(Box::new(BooleanParameter::new("b", false)));
    params.push(Box::new(OptionParameter::new("o", "A", &["A", "B"])));
    params.push(Box::new(ArrayParameter::new("a", ParameterType::Real, vec![Value::Real(0.0)])));
    params
}

/// A value every parameter of [`every_variant`] accepts, derived from `seed`.
pub(crate) fn sample_for(ty: ParameterType, seed: i32) -> Value {
    match ty {
        ParameterType::Real => Value::Real(f64::from(seed) * 0.5),
        ParameterType::Integer => Value::Integer(seed),
        ParameterType::Boolean => Value::Boolean(seed % 2 == 0),
        ParameterType::Option => Value::text(if seed % 2 == 0 { "A" } else { "B" }),
        ParameterType::Array => {
            let len = (seed.unsigned_abs() % 4) as usize;
            Value::Array(vec![Value::Real(f64::from(seed)); len])
        }
    }
}

/// Foreign parameter backed by a native one.
pub(crate) struct FakeParameter {
    inner: RefCell<Box<dyn Parameter>>,
    tag_override: Option<i32>,
    writable_default: bool,
    fail_writes: Cell<bool>,
}

impl FakeParameter {
    pub(crate) fn new(inner: impl Parameter + 'static) -> Self {
        FakeParameter::from_boxed(Box::new(inner))
    }

    pub(crate) fn from_boxed(inner: Box<dyn Parameter>) -> Self {
        FakeParameter {
            inner: RefCell::new(inner),
            tag_override: None,
            writable_default: false,
            fail_writes: Cell::new(false),
        }
    }

    pub(crate) fn with_tag(mut self, tag: i32) -> Self {
        self.tag_override = Some(tag);
        self
    }

    pub(crate) fn with_writable_default(mut self) -> Self {
        self.writable_default = true;
        self
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writable(&self) -> CapeResult<()> {
        if self.fail_writes.get() {
            return Err(CapeError::foreign("E_ACCESS", "parameter is read-only"));
        }
        Ok(())
    }
}

impl ForeignIdentification for FakeParameter {
    fn component_name(&self) -> CapeResult<String> {
        Ok(self.inner.borrow().name().to_string())
    }

    fn set_component_name(&self, name: &str) -> CapeResult<()> {
        self.inner.borrow_mut().set_name(name)
    }

    fn component_description(&self) -> CapeResult<String> {
        Ok(self.inner.borrow().description().to_string())
    }

    fn set_component_description(&self, description: &str) -> CapeResult<()> {
        self.inner.borrow_mut().set_description(description)
    }
}

impl ForeignParameter for FakeParameter {
    fn type_tag(&self) -> CapeResult<i32> {
        Ok(self.tag_override.unwrap_or_else(|| self.inner.borrow().parameter_type().tag()))
    }

    fn value(&self) -> CapeResult<Value> {
        self.inner.borrow().value()
    }

    fn set_value(&self, value: Value) -> CapeResult<()> {
        self.check_writable()?;
        self.inner.borrow_mut().set_value(value)
    }

    fn mode(&self) -> CapeResult<ParameterMode> {
        self.inner.borrow().mode()
    }

    fn set_mode(&self, mode: ParameterMode) -> CapeResult<()> {
        self.inner.borrow_mut().set_mode(mode)
    }

    fn validation_status(&self) -> CapeResult<ValidationStatus> {
        self.inner.borrow().validation_status()
    }

    fn validate(&self) -> CapeResult<ValidationReport> {
        self.inner.borrow_mut().validate()
    }

    fn reset(&self) -> CapeResult<()> {
        self.inner.borrow_mut().reset()
    }

    fn default_value(&self) -> CapeResult<Value> {
        self.inner.borrow().default_value()
    }

    fn constraints(&self) -> CapeResult<Constraints> {
        self.inner.borrow().constraints()
    }

    fn duplicate(&self) -> CapeResult<Rc<dyn ForeignParameter>> {
        Ok(Rc::new(FakeParameter {
            inner: RefCell::new(self.inner.borrow().clone_parameter()?),
            tag_override: self.tag_override,
            writable_default: self.writable_default,
            fail_writes: Cell::new(false),
        }))
    }

    fn as_default_mutator(&self) -> Option<&dyn ForeignDefaultMutator> {
        if self.writable_default { Some(self) } else { None }
    }
}

impl ForeignDefaultMutator for FakeParameter {
    fn set_default_value(&self, value: Value) -> CapeResult<()> {
        self.inner.borrow_mut().set_default_value(value)
    }
}

/// Foreign port recording what it was connected to.
pub(crate) struct FakePort {
    name: RefCell<String>,
    direction: PortDirection,
    kind: PortKind,
    connected: RefCell<Option<ForeignConnection>>,
    fail_disconnect: Cell<bool>,
}

impl FakePort {
    pub(crate) fn new(name: &str, direction: PortDirection, kind: PortKind) -> Self {
        FakePort {
            name: RefCell::new(name.to_string()),
            direction,
            kind,
            connected: RefCell::new(None),
            fail_disconnect: Cell::new(false),
        }
    }

    pub(crate) fn connection(&self) -> Option<ForeignConnection> {
        self.connected.borrow().clone()
    }

    pub(crate) fn fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.set(fail);
    }
}

impl ForeignIdentification for FakePort {
    fn component_name(&self) -> CapeResult<String> {
        Ok(self.name.borrow().clone())
    }

    fn set_component_name(&self, name: &str) -> CapeResult<()> {
        *self.name.borrow_mut() = name.to_string();
        Ok(())
    }

    fn component_description(&self) -> CapeResult<String> {
        Ok(String::new())
    }

    fn set_component_description(&self, _description: &str) -> CapeResult<()> {
        Err(CapeError::foreign("E_NOTIMPL", "port descriptions are fixed"))
    }
}

impl ForeignPort for FakePort {
    fn direction(&self) -> CapeResult<PortDirection> {
        Ok(self.direction)
    }

    fn kind(&self) -> CapeResult<PortKind> {
        Ok(self.kind)
    }

    fn connect(&self, object: ForeignConnection) -> CapeResult<()> {
        *self.connected.borrow_mut() = Some(object);
        Ok(())
    }

    fn disconnect(&self) -> CapeResult<()> {
        if self.fail_disconnect.get() {
            return Err(CapeError::foreign("E_FAIL", "port refused to disconnect"));
        }
        *self.connected.borrow_mut() = None;
        Ok(())
    }
}

/// Blueprint of the parameters and ports a [`FakeUnit`] creates on initialize.
#[derive(Clone)]
pub(crate) struct Blueprint {
    pub(crate) parameters: Vec<Rc<dyn Fn() -> FakeParameter>>,
    pub(crate) ports: Vec<(String, PortDirection, PortKind)>,
}

impl Blueprint {
    /// Two parameters (real "temperature" in [0, 100], option "phase" in
    /// {A, B}) and one material inlet.
    pub(crate) fn heater() -> Self {
        let temperature: Rc<dyn Fn() -> FakeParameter> = Rc::new(|| {
            let temperature = RealParameter::new("temperature", 25.0);
            FakeParameter::new(temperature.with_bounds(Some(0.0), Some(100.0)).with_unit("C"))
        });
        let phase: Rc<dyn Fn() -> FakeParameter> =
            Rc::new(|| FakeParameter::new(OptionParameter::new("phase", "A", &["A", "B"])));
        Blueprint {
            parameters: vec![temperature, phase],
            ports: vec![("inlet".to_string(), PortDirection::Input, PortKind::Material)],
        }
    }
}

/// Foreign unit whose collections appear on initialize.
pub(crate) struct FakeUnit {
    origin: ForeignOrigin,
    name: RefCell<String>,
    description: RefCell<String>,
    blueprint: Blueprint,
    parameters: RefCell<Vec<Rc<FakeParameter>>>,
    ports: RefCell<Vec<Rc<FakePort>>>,
    status: Cell<ValidationStatus>,
    calls: RefCell<Vec<&'static str>>,
    fail_terminate: Cell<bool>,
    hide_ports: bool,
}

impl FakeUnit {
    pub(crate) fn new(origin: ForeignOrigin, blueprint: Blueprint) -> Self {
        FakeUnit {
            origin,
            name: RefCell::new("Heater".to_string()),
            description: RefCell::new("Foreign heater".to_string()),
            blueprint,
            parameters: RefCell::new(Vec::new()),
            ports: RefCell::new(Vec::new()),
            status: Cell::new(ValidationStatus::NotValidated),
            calls: RefCell::new(Vec::new()),
            fail_terminate: Cell::new(false),
            hide_ports: false,
        }
    }

    pub(crate) fn heater() -> Self {
        let origin = ForeignOrigin::Shared { class_id: HEATER_CLASS.to_string() };
        FakeUnit::new(origin, Blueprint::heater())
    }

    /// Does not answer the port collection query.
    pub(crate) fn without_ports(mut self) -> Self {
        self.hide_ports = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub(crate) fn parameter(&self, index: usize) -> Rc<FakeParameter> {
        self.parameters.borrow()[index].clone()
    }

    pub(crate) fn port(&self, index: usize) -> Rc<FakePort> {
        self.ports.borrow()[index].clone()
    }

    pub(crate) fn fail_terminate(&self, fail: bool) {
        self.fail_terminate.set(fail);
    }

    pub(crate) fn set_status(&self, status: ValidationStatus) {
        self.status.set(status);
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl ForeignObject for FakeUnit {
    fn origin(&self) -> ForeignOrigin {
        self.origin.clone()
    }

    fn as_identification(self: Rc<Self>) -> Option<Rc<dyn ForeignIdentification>> {
        Some(self)
    }

    fn as_unit(self: Rc<Self>) -> Option<Rc<dyn ForeignUnit>> {
        Some(self)
    }

    fn as_parameter_collection(self: Rc<Self>) -> Option<Rc<dyn ForeignParameterCollection>> {
        Some(self)
    }

    fn as_port_collection(self: Rc<Self>) -> Option<Rc<dyn ForeignPortCollection>> {
        if self.hide_ports { None } else { Some(self) }
    }
}

impl ForeignIdentification for FakeUnit {
    fn component_name(&self) -> CapeResult<String> {
        Ok(self.name.borrow().clone())
    }

    fn set_component_name(&self, name: &str) -> CapeResult<()> {
        *self.name.borrow_mut() = name.to_string();
        Ok(())
    }

    fn component_description(&self) -> CapeResult<String> {
        Ok(self.description.borrow().clone())
    }

    fn set_component_description(&self, description: &str) -> CapeResult<()> {
        *self.description.borrow_mut() = description.to_string();
        Ok(())
    }
}

impl ForeignUnit for FakeUnit {
    fn initialize(&self) -> CapeResult<()> {
        self.record("initialize");
        let parameters: Vec<_> =
            self.blueprint.parameters.iter().map(|make| Rc::new(make())).collect();
        *self.parameters.borrow_mut() = parameters;
        *self.ports.borrow_mut() = self
            .blueprint
            .ports
            .iter()
            .map(|(name, direction, kind)| Rc::new(FakePort::new(name, *direction, *kind)))
            .collect();
        Ok(())
    }

    fn terminate(&self) -> CapeResult<()> {
        self.record("terminate");
        if self.fail_terminate.get() {
            return Err(CapeError::foreign("E_FAIL", "terminate failed"));
        }
        Ok(())
    }

    fn calculate(&self) -> CapeResult<()> {
        self.record("calculate");
        Ok(())
    }

    fn validate(&self) -> CapeResult<ValidationReport> {
        self.record("validate");
        for parameter in self.parameters.borrow().iter() {
            let report = parameter.validate()?;
            if !report.valid {
                self.status.set(ValidationStatus::Invalid);
                return Ok(report);
            }
        }
        self.status.set(ValidationStatus::Valid);
        Ok(ValidationReport::valid())
    }

    fn validation_status(&self) -> CapeResult<ValidationStatus> {
        Ok(self.status.get())
    }
}

impl ForeignParameterCollection for FakeUnit {
    fn count(&self) -> CapeResult<usize> {
        Ok(self.parameters.borrow().len())
    }

    fn item(&self, index: usize) -> CapeResult<Rc<dyn ForeignParameter>> {
        match self.parameters.borrow().get(index) {
            Some(parameter) => Ok(parameter.clone()),
            None => Err(CapeError::foreign("E_BOUNDS", "parameter index out of range")),
        }
    }
}

impl ForeignPortCollection for FakeUnit {
    fn count(&self) -> CapeResult<usize> {
        Ok(self.ports.borrow().len())
    }

    fn item(&self, index: usize) -> CapeResult<Rc<dyn ForeignPort>> {
        match self.ports.borrow().get(index) {
            Some(port) => Ok(port.clone()),
            None => Err(CapeError::foreign("E_BOUNDS", "port index out of range")),
        }
    }
}

/// Factory creating [`FakeUnit`]s and keeping a handle to every instance.
#[derive(Default)]
pub(crate) struct FakeFactory {
    blueprints: HashMap<String, Blueprint>,
    created: RefCell<Vec<Rc<FakeUnit>>>,
}

impl FakeFactory {
    /// Knows the heater under both its class identifier and an in-process descriptor.
    pub(crate) fn heater() -> Self {
        let mut factory = FakeFactory::default();
        factory.blueprints.insert(HEATER_CLASS.to_string(), Blueprint::heater());
        factory.blueprints.insert(Self::key(&Self::heater_descriptor()), Blueprint::heater());
        factory
    }

    pub(crate) fn heater_descriptor() -> TypeDescriptor {
        TypeDescriptor::new("units.dll", "Units.Heater")
    }

    pub(crate) fn with_blueprint(mut self, class_id: &str, blueprint: Blueprint) -> Self {
        self.blueprints.insert(class_id.to_string(), blueprint);
        self
    }

    /// Every instance created so far, oldest first.
    pub(crate) fn created(&self) -> Vec<Rc<FakeUnit>> {
        self.created.borrow().clone()
    }

    fn key(descriptor: &TypeDescriptor) -> String {
        format!("{}::{}", descriptor.module, descriptor.type_name)
    }

    fn build(&self, key: &str, origin: ForeignOrigin) -> CapeResult<Rc<dyn ForeignObject>> {
        let blueprint = self.blueprints.get(key).cloned().ok_or_else(|| {
            CapeError::NotFound(format!("No foreign class registered as '{}'", key))
        })?;
        let unit = Rc::new(FakeUnit::new(origin, blueprint));
        self.created.borrow_mut().push(unit.clone());
        Ok(unit)
    }
}

impl ForeignFactory for FakeFactory {
    fn create(&self, class_id: &str) -> CapeResult<Rc<dyn ForeignObject>> {
        self.build(class_id, ForeignOrigin::Shared { class_id: class_id.to_string() })
    }

    fn create_in_process(&self, descriptor: &TypeDescriptor) -> CapeResult<Rc<dyn ForeignObject>> {
        let origin = ForeignOrigin::InProcess { descriptor: descriptor.clone() };
        self.build(&Self::key(descriptor), origin)
    }
}
