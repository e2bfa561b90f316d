//! Foreign ports re-exposed as native [`Port`]s.

use super::{ForeignConnection, ForeignMaterial, ForeignPort};
use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::ports::{Connectable, MaterialObject, Port, check_capability};
use crate::{CapeError, CapeResult, PortDirection, PortKind};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// Material object wrapped for delivery across the boundary.
///
/// The foreign side sees it as a [`ForeignMaterial`]; native code still
/// sees the original object's name and material capability.
pub struct MaterialObjectAdapter {
    inner: Rc<dyn Connectable>,
}

impl MaterialObjectAdapter {
    /// Fails with `InvalidArgument` unless `object` is a material object.
    pub fn wrap(object: Rc<dyn Connectable>) -> CapeResult<Self> {
        if object.as_material().is_none() {
            return Err(not_material(&*object));
        }
        Ok(MaterialObjectAdapter { inner: object })
    }

    /// The wrapped native object.
    pub fn inner(&self) -> &Rc<dyn Connectable> {
        &self.inner
    }

    fn material(&self) -> CapeResult<&dyn MaterialObject> {
        self.inner.as_material().ok_or_else(|| not_material(&*self.inner))
    }
}

fn not_material(object: &dyn Connectable) -> CapeError {
    CapeError::InvalidArgument(format!("Object '{}' is not a material object", object.name()))
}

impl fmt::Debug for MaterialObjectAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialObjectAdapter").field("inner", &self.inner.name()).finish()
    }
}

impl ForeignMaterial for MaterialObjectAdapter {
    fn component_ids(&self) -> CapeResult<Vec<String>> {
        Ok(self.material()?.component_ids())
    }

    fn property(&self, name: &str) -> CapeResult<Vec<f64>> {
        self.material()?.property(name)
    }

    fn set_property(&self, name: &str, values: &[f64]) -> CapeResult<()> {
        self.material()?.set_property(name, values)
    }
}

impl MaterialObject for MaterialObjectAdapter {
    fn component_ids(&self) -> Vec<String> {
        self.inner.as_material().map(|m| m.component_ids()).unwrap_or_default()
    }

    fn property(&self, name: &str) -> CapeResult<Vec<f64>> {
        self.material()?.property(name)
    }

    fn set_property(&self, name: &str, values: &[f64]) -> CapeResult<()> {
        self.material()?.set_property(name, values)
    }
}

impl Connectable for MaterialObjectAdapter {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn as_material(&self) -> Option<&dyn MaterialObject> {
        Some(self)
    }
}

/// Adapter presenting a foreign port as a [`Port`].
///
/// The connected object is tracked locally as well as on the foreign side,
/// so `connected_object` never needs to cross the boundary.
pub struct ForeignPortAdapter {
    ident: Identification,
    foreign: Rc<dyn ForeignPort>,
    connected: Option<Rc<dyn Connectable>>,
}

impl ForeignPortAdapter {
    pub fn wrap(foreign: Rc<dyn ForeignPort>) -> CapeResult<Self> {
        let ident = Identification::with_description(
            &foreign.component_name()?,
            &foreign.component_description()?,
        );
        Ok(ForeignPortAdapter { ident, foreign, connected: None })
    }

    /// The wrapped foreign port.
    pub fn foreign(&self) -> &Rc<dyn ForeignPort> {
        &self.foreign
    }
}

impl fmt::Debug for ForeignPortAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignPortAdapter")
            .field("name", &self.ident.name())
            .field("connected", &self.connected.as_ref().map(|o| o.name()))
            .finish()
    }
}

impl Identified for ForeignPortAdapter {
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

impl Port for ForeignPortAdapter {
    fn direction(&self) -> CapeResult<PortDirection> {
        self.foreign.direction()
    }

    fn kind(&self) -> CapeResult<PortKind> {
        self.foreign.kind()
    }

    /// Material objects are wrapped before they are handed over; anything
    /// else is passed through unchanged.
    fn connect(&mut self, object: Rc<dyn Connectable>) -> CapeResult<()> {
        let kind = self.foreign.kind()?;
        check_capability(kind, &*object)?;

        let local: Rc<dyn Connectable> = match kind {
            PortKind::Material => {
                let wrapper = Rc::new(MaterialObjectAdapter::wrap(object)?);
                self.foreign.connect(ForeignConnection::Material(wrapper.clone()))?;
                wrapper
            }
            PortKind::Energy | PortKind::Information => {
                self.foreign.connect(ForeignConnection::Value(object.clone()))?;
                object
            }
        };

        let name = local.name();
        self.connected = Some(local);
        let component = self.ident.name().to_string();
        self.ident.emit(ComponentEvent::Connected { component, object: name });
        Ok(())
    }

    /// Always forwarded to the foreign side, which may hold a connection made
    /// outside this adapter. Local state is cleared even when the foreign
    /// side fails; the foreign error is still returned. `Disconnected` is
    /// emitted only if an object was connected locally.
    fn disconnect(&mut self) -> CapeResult<()> {
        let result = self.foreign.disconnect();
        let was_connected = self.connected.take().is_some();
        if let Err(e) = &result {
            warn!(port = self.ident.name(), error = %e, "foreign port failed to disconnect");
        }
        if was_connected {
            let component = self.ident.name().to_string();
            self.ident.emit(ComponentEvent::Disconnected { component });
        }
        result
    }

    fn connected_object(&self) -> Option<Rc<dyn Connectable>> {
        self.connected.clone()
    }
}
