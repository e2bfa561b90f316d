//! Ports: named, typed, directional connection points on a unit.
//!
//! A port holds at most one connected object. What may be connected is
//! decided by capability, not by concrete type:
//!
//! - [`PortKind::Material`] ports need an object exposing [`MaterialObject`]
//! - [`PortKind::Energy`] and [`PortKind::Information`] ports need a [`ValueCarrier`]
//!
//! ```
//! use std::rc::Rc;
//! use nomata_cape::{
//!     Connectable, InformationStream, MaterialStream, NativePort, Port, PortDirection, PortKind,
//!     Value,
//! };
//!
//! let mut feed = NativePort::new("feed", PortDirection::Input, PortKind::Material);
//!
//! // A signal is not a material: rejected, port stays disconnected
//! let signal = Rc::new(InformationStream::new("signal", Value::Real(1.0)));
//! assert!(feed.connect(signal).is_err());
//! assert!(feed.connected_object().is_none());
//!
//! feed.connect(Rc::new(MaterialStream::new("S1", &["water"]))).unwrap();
//! assert_eq!(feed.connected_object().unwrap().name(), "S1");
//!
//! feed.disconnect().unwrap();
//! feed.disconnect().unwrap(); // idempotent
//! ```

use crate::identification::{ComponentEvent, Identification, Identified, Listener, ListenerId};
use crate::value::Value;
use crate::{CapeError, CapeResult, PortDirection, PortKind};
use std::fmt;
use std::rc::Rc;

/// Capability of a material object: components and named property vectors.
pub trait MaterialObject {
    /// Component identifiers, in order.
    fn component_ids(&self) -> Vec<String>;

    /// Reads a named property (e.g. "temperature", "flow").
    fn property(&self, name: &str) -> CapeResult<Vec<f64>>;

    /// Writes a named property.
    fn set_property(&self, name: &str, values: &[f64]) -> CapeResult<()>;
}

/// Capability of a parameter-like object carried by energy and information ports.
pub trait ValueCarrier {
    fn carried_value(&self) -> CapeResult<Value>;

    fn set_carried_value(&self, value: Value) -> CapeResult<()>;
}

/// Anything that can be connected to a port.
///
/// Capabilities are queried, not assumed: an object that returns `None`
/// from both accessors cannot be connected anywhere.
pub trait Connectable {
    /// Name used for display and as the persisted connection target.
    fn name(&self) -> String;

    fn as_material(&self) -> Option<&dyn MaterialObject> {
        None
    }

    fn as_value_carrier(&self) -> Option<&dyn ValueCarrier> {
        None
    }
}

/// Checks that `object` offers the capability a port of `kind` requires.
pub fn check_capability(kind: PortKind, object: &dyn Connectable) -> CapeResult<()> {
    let satisfied = match kind {
        PortKind::Material => object.as_material().is_some(),
        PortKind::Energy | PortKind::Information => object.as_value_carrier().is_some(),
    };
    if satisfied {
        Ok(())
    } else {
        Err(CapeError::InvalidArgument(format!(
            "Object '{}' cannot be connected to a {} port",
            object.name(),
            kind
        )))
    }
}

/// A port, native or adapted.
pub trait Port: Identified {
    fn direction(&self) -> CapeResult<PortDirection>;

    fn kind(&self) -> CapeResult<PortKind>;

    /// Connects `object`, replacing any existing connection.
    ///
    /// Fails with `InvalidArgument` (connection unchanged) when the object's
    /// capabilities do not match the port kind.
    fn connect(&mut self, object: Rc<dyn Connectable>) -> CapeResult<()>;

    /// Clears the connection. A no-op on a disconnected port.
    fn disconnect(&mut self) -> CapeResult<()>;

    /// Currently connected object.
    fn connected_object(&self) -> Option<Rc<dyn Connectable>>;

    fn is_connected(&self) -> bool {
        self.connected_object().is_some()
    }
}

impl fmt::Debug for dyn Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name())
            .field("connected", &self.connected_object().map(|o| o.name()))
            .finish()
    }
}

/// A natively implemented port.
#[derive(Clone)]
pub struct NativePort {
    ident: Identification,
    direction: PortDirection,
    kind: PortKind,
    connected: Option<Rc<dyn Connectable>>,
}

impl NativePort {
    /// Creates a disconnected port.
    pub fn new(name: &str, direction: PortDirection, kind: PortKind) -> Self {
        NativePort { ident: Identification::new(name), direction, kind, connected: None }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.ident = Identification::with_description(self.ident.name(), description);
        self
    }

    /// Same name, description, direction and kind, without the connection.
    pub fn detached(&self) -> NativePort {
        NativePort {
            ident: self.ident.clone(),
            direction: self.direction,
            kind: self.kind,
            connected: None,
        }
    }
}

impl fmt::Debug for NativePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativePort")
            .field("name", &self.ident.name())
            .field("direction", &self.direction)
            .field("kind", &self.kind)
            .field("connected", &self.connected.as_ref().map(|o| o.name()))
            .finish()
    }
}

impl Identified for NativePort {
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

impl Port for NativePort {
    fn direction(&self) -> CapeResult<PortDirection> {
        Ok(self.direction)
    }

    fn kind(&self) -> CapeResult<PortKind> {
        Ok(self.kind)
    }

    fn connect(&mut self, object: Rc<dyn Connectable>) -> CapeResult<()> {
        check_capability(self.kind, &*object)?;
        let name = object.name();
        self.connected = Some(object);
        let component = self.ident.name().to_string();
        self.ident.emit(ComponentEvent::Connected { component, object: name });
        Ok(())
    }

    fn disconnect(&mut self) -> CapeResult<()> {
        if self.connected.take().is_some() {
            let component = self.ident.name().to_string();
            self.ident.emit(ComponentEvent::Disconnected { component });
        }
        Ok(())
    }

    fn connected_object(&self) -> Option<Rc<dyn Connectable>> {
        self.connected.clone()
    }
}

/// Ports of one unit, in insertion order, with unique names.
#[derive(Debug, Default)]
pub struct PortCollection {
    items: Vec<Box<dyn Port>>,
}

impl PortCollection {
    pub fn new() -> Self {
        PortCollection { items: Vec::new() }
    }

    /// Appends a port. Fails with `InvalidArgument` if the name is taken.
    pub fn add(&mut self, port: Box<dyn Port>) -> CapeResult<()> {
        if self.position(port.name()).is_some() {
            return Err(duplicate_port(port.name()));
        }
        self.items.push(port);
        Ok(())
    }

    /// Renames a port. Fails with `InvalidArgument` if `new_name` is taken
    /// by another port.
    pub fn rename(&mut self, name: &str, new_name: &str) -> CapeResult<()> {
        if name != new_name && self.position(new_name).is_some() {
            return Err(duplicate_port(new_name));
        }
        self.by_name_mut(name)?.set_name(new_name)
    }

    /// Exact, case-sensitive lookup.
    pub fn by_name(&self, name: &str) -> CapeResult<&dyn Port> {
        match self.items.iter().find(|p| p.name() == name) {
            Some(p) => Ok(p.as_ref()),
            None => Err(CapeError::NotFound(format!("Port '{}'", name))),
        }
    }

    /// Renaming through the returned reference bypasses the uniqueness
    /// check; use [`PortCollection::rename`] instead.
    pub fn by_name_mut(&mut self, name: &str) -> CapeResult<&mut dyn Port> {
        match self.items.iter_mut().find(|p| p.name() == name) {
            Some(p) => Ok(p.as_mut()),
            None => Err(CapeError::NotFound(format!("Port '{}'", name))),
        }
    }

    pub fn get(&self, index: usize) -> CapeResult<&dyn Port> {
        match self.items.get(index) {
            Some(p) => Ok(p.as_ref()),
            None => Err(CapeError::NotFound(format!("Port index {}", index))),
        }
    }

    pub fn get_mut(&mut self, index: usize) -> CapeResult<&mut dyn Port> {
        match self.items.get_mut(index) {
            Some(p) => Ok(p.as_mut()),
            None => Err(CapeError::NotFound(format!("Port index {}", index))),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Port + 'static)> {
        self.items.iter().map(|p| p.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Port>> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes every port without disconnecting it.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Disconnects every port, continuing past failures. Returns the first failure.
    pub fn disconnect_all(&mut self) -> CapeResult<()> {
        let mut first_error = None;
        for port in self.items.iter_mut() {
            if let Err(e) = port.disconnect() {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn duplicate_port(name: &str) -> CapeError {
    CapeError::InvalidArgument(format!("Port '{}' already exists in this collection", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identification::recorder;
    use crate::streams::{InformationStream, MaterialStream};

    struct Inert;

    fn water(name: &str) -> Rc<MaterialStream> {
        Rc::new(MaterialStream::new(name, &["water"]))
    }

    fn sample_ports() -> PortCollection {
        let mut ports = PortCollection::new();
        let feed = NativePort::new("feed", PortDirection::Input, PortKind::Material);
        ports.add(Box::new(feed)).unwrap();
        ports.add(Box::new(NativePort::new("Q", PortDirection::Input, PortKind::Energy))).unwrap();
        ports
    }

    impl Connectable for Inert {
        fn name(&self) -> String {
            "inert".to_string()
        }
    }

    #[test]
    fn test_connect_replaces_existing() {
        let mut port = NativePort::new("feed", PortDirection::Input, PortKind::Material);
        port.connect(water("S1")).unwrap();
        port.connect(water("S2")).unwrap();
        assert_eq!(port.connected_object().unwrap().name(), "S2");
    }

    #[test]
    fn test_capability_mismatch_leaves_state() {
        let mut port = NativePort::new("Q", PortDirection::Input, PortKind::Energy);
        port.connect(Rc::new(InformationStream::new("duty", Value::Real(5.0)))).unwrap();

        let err = port.connect(water("S1")).unwrap_err();
        assert!(matches!(err, CapeError::InvalidArgument(_)));
        assert_eq!(port.connected_object().unwrap().name(), "duty");

        assert!(port.connect(Rc::new(Inert)).is_err());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut port = NativePort::new("product", PortDirection::Output, PortKind::Material);
        let (events, listener) = recorder();
        port.subscribe(listener);

        port.disconnect().unwrap();
        assert!(port.connected_object().is_none());
        assert!(events.borrow().is_empty());

        port.connect(water("S3")).unwrap();
        port.disconnect().unwrap();
        port.disconnect().unwrap();
        assert!(!port.is_connected());
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn test_detached_copy() {
        let mut port = NativePort::new("feed", PortDirection::Input, PortKind::Material)
            .with_description("Feed");
        port.connect(water("S1")).unwrap();

        let copy = port.detached();
        assert_eq!(copy.description(), "Feed");
        assert!(!copy.is_connected());
        assert!(port.is_connected());
    }

    #[test]
    fn test_collection_lookup_and_disconnect_all() {
        let mut ports = sample_ports();
        let duplicate = NativePort::new("Q", PortDirection::Output, PortKind::Energy);
        assert!(ports.add(Box::new(duplicate)).is_err());

        ports.by_name_mut("feed").unwrap().connect(water("S1")).unwrap();
        assert!(ports.by_name("feed").unwrap().is_connected());
        assert!(matches!(ports.by_name("FEED"), Err(CapeError::NotFound(_))));

        ports.disconnect_all().unwrap();
        assert!(ports.iter().all(|p| !p.is_connected()));
        assert_eq!(ports.names(), vec!["feed", "Q"]);
    }

    #[test]
    fn test_collection_rename() {
        let mut ports = sample_ports();
        assert!(matches!(ports.rename("Q", "feed"), Err(CapeError::InvalidArgument(_))));
        assert_eq!(ports.names(), vec!["feed", "Q"]);

        ports.rename("Q", "duty").unwrap();
        assert!(ports.by_name("duty").is_ok());
        assert!(matches!(ports.rename("Q", "heat"), Err(CapeError::NotFound(_))));
    }

    #[test]
    fn test_unsubscribe_through_collection() {
        let mut ports = sample_ports();
        let (events, listener) = recorder();
        let feed = ports.by_name_mut("feed").unwrap();
        let id = feed.subscribe(listener);

        feed.connect(water("S1")).unwrap();
        assert!(feed.unsubscribe(id));
        feed.disconnect().unwrap();
        assert_eq!(events.borrow().len(), 1);
    }
}
