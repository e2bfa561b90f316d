//! Foreign parameters re-exposed as native [`Parameter`]s.
//!
//! One generic adapter covers every variant; the type parameter fixes which
//! typed value the adapter narrows to before anything crosses the boundary.
//! The foreign side stays authoritative: the adapter caches nothing but the
//! identification, and every read goes back to the wrapped instance.

use super::ForeignParameter;
use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::parameters::{Constraints, Parameter, Resettable, Specifiable, Validatable, Valuable};
use crate::value::{ParameterValueType, Value};
use crate::{
    CapeError, CapeResult, ParameterMode, ParameterType, ValidationReport, ValidationStatus,
};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::debug;

/// Adapter presenting a foreign parameter of value type `T` as a [`Parameter`].
pub struct ForeignParameterAdapter<T: ParameterValueType> {
    ident: Identification,
    foreign: Rc<dyn ForeignParameter>,
    _variant: PhantomData<T>,
}

pub type ForeignRealParameter = ForeignParameterAdapter<f64>;
pub type ForeignIntegerParameter = ForeignParameterAdapter<i32>;
pub type ForeignBooleanParameter = ForeignParameterAdapter<bool>;
pub type ForeignOptionParameter = ForeignParameterAdapter<String>;
pub type ForeignArrayParameter = ForeignParameterAdapter<Vec<Value>>;

impl<T: ParameterValueType> ForeignParameterAdapter<T> {
    /// Wraps `foreign`, checking that its type tag matches `T`.
    pub fn wrap(foreign: Rc<dyn ForeignParameter>) -> CapeResult<Self> {
        let reported = ParameterType::from_tag(foreign.type_tag()?)?;
        if reported != T::TYPE {
            return Err(CapeError::InvalidArgument(format!(
                "Foreign parameter is a {} parameter, not {}",
                reported,
                T::TYPE
            )));
        }
        let ident = Identification::with_description(
            &foreign.component_name()?,
            &foreign.component_description()?,
        );
        Ok(ForeignParameterAdapter { ident, foreign, _variant: PhantomData })
    }

    /// Typed current value, read from the foreign instance.
    pub fn typed_value(&self) -> CapeResult<T> {
        T::from_value(&self.foreign.value()?)
    }

    /// The wrapped foreign instance.
    pub fn foreign(&self) -> &Rc<dyn ForeignParameter> {
        &self.foreign
    }

    fn component(&self) -> String {
        self.ident.name().to_string()
    }

    fn read_default(&self) -> CapeResult<Value> {
        Ok(T::from_value(&self.foreign.default_value()?)?.into_value())
    }
}

impl<T: ParameterValueType> fmt::Debug for ForeignParameterAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignParameterAdapter")
            .field("name", &self.ident.name())
            .field("type", &T::TYPE)
            .finish()
    }
}

impl<T: ParameterValueType> Identified for ForeignParameterAdapter<T> {
    fn identification(&self) -> &Identification {
        &self.ident
    }

    fn set_name(&mut self, name: &str) -> CapeResult<()> {
        self.foreign.set_component_name(name)?;
        let confirmed = self.foreign.component_name()?;
        self.ident.set_name(&confirmed);
        Ok(())
    }

    fn set_description(&mut self, description: &str) -> CapeResult<()> {
        self.foreign.set_component_description(description)?;
        let confirmed = self.foreign.component_description()?;
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

impl<T: ParameterValueType> Valuable for ForeignParameterAdapter<T> {
    fn value(&self) -> CapeResult<Value> {
        Ok(self.typed_value()?.into_value())
    }

    fn set_value(&mut self, value: Value) -> CapeResult<()> {
        let typed = T::from_value(&value)?;
        let old = self.value()?;
        self.foreign.set_value(typed.into_value())?;
        let new = self.value()?;
        debug!(parameter = self.ident.name(), %old, %new, "foreign parameter written");
        self.ident.emit(ComponentEvent::ValueChanged { component: self.component(), old, new });
        Ok(())
    }

    fn mode(&self) -> CapeResult<ParameterMode> {
        self.foreign.mode()
    }

    fn set_mode(&mut self, mode: ParameterMode) -> CapeResult<()> {
        let old = self.foreign.mode()?;
        self.foreign.set_mode(mode)?;
        let new = self.foreign.mode()?;
        self.ident.emit(ComponentEvent::ModeChanged { component: self.component(), old, new });
        Ok(())
    }
}

impl<T: ParameterValueType> Validatable for ForeignParameterAdapter<T> {
    fn validation_status(&self) -> CapeResult<ValidationStatus> {
        self.foreign.validation_status()
    }

    fn validate(&mut self) -> CapeResult<ValidationReport> {
        let old = self.foreign.validation_status()?;
        let report = self.foreign.validate()?;
        let new = self.foreign.validation_status()?;
        self.ident.emit(ComponentEvent::Validated {
            component: self.component(),
            old,
            new,
            message: report.message.clone(),
        });
        Ok(report)
    }
}

impl<T: ParameterValueType> Resettable for ForeignParameterAdapter<T> {
    fn reset(&mut self) -> CapeResult<()> {
        self.foreign.reset()?;
        self.ident.emit(ComponentEvent::Reset { component: self.component() });
        Ok(())
    }
}

impl<T: ParameterValueType> Specifiable for ForeignParameterAdapter<T> {
    fn parameter_type(&self) -> ParameterType {
        T::TYPE
    }

    fn default_value(&self) -> CapeResult<Value> {
        self.read_default()
    }

    /// Forwarded only when the foreign parameter has a writable default.
    /// Otherwise the write is accepted and has no effect.
    fn set_default_value(&mut self, value: Value) -> CapeResult<()> {
        let typed = T::from_value(&value)?;
        match self.foreign.as_default_mutator() {
            Some(mutator) => {
                let old = self.read_default()?;
                mutator.set_default_value(typed.into_value())?;
                let new = self.read_default()?;
                let component = self.component();
                self.ident.emit(ComponentEvent::DefaultValueChanged { component, old, new });
            }
            None => {
                let parameter = self.ident.name();
                debug!(parameter, "foreign default value is read-only, write dropped");
            }
        }
        Ok(())
    }

    fn constraints(&self) -> CapeResult<Constraints> {
        self.foreign.constraints()
    }
}

impl<T: ParameterValueType> Parameter for ForeignParameterAdapter<T> {
    /// Wraps a foreign duplicate, so the copy shares no state with this one.
    fn clone_parameter(&self) -> CapeResult<Box<dyn Parameter>> {
        Ok(Box::new(Self::wrap(self.foreign.duplicate()?)?))
    }
}

/// Wraps a foreign parameter in the adapter matching its reported type tag.
///
/// Fails with [`CapeError::UnknownVariant`] when the tag has no variant.
pub fn adapt_parameter(foreign: Rc<dyn ForeignParameter>) -> CapeResult<Box<dyn Parameter>> {
    let adapted: Box<dyn Parameter> = match ParameterType::from_tag(foreign.type_tag()?)? {
        ParameterType::Real => Box::new(ForeignRealParameter::wrap(foreign)?),
        ParameterType::Integer => Box::new(ForeignIntegerParameter::wrap(foreign)?),
        ParameterType::Boolean => Box::new(ForeignBooleanParameter::wrap(foreign)?),
        ParameterType::Option => Box::new(ForeignOptionParameter::wrap(foreign)?),
        ParameterType::Array => Box::new(ForeignArrayParameter::wrap(foreign)?),
    };
    Ok(adapted)
}
