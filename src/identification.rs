//! Component identification and change notification.
//!
//! Every parameter, port and unit carries an [`Identification`]: a name, a
//! description and a [`Notifier`] through which the component announces
//! mutations as [`ComponentEvent`]s.

use crate::{CapeResult, ParameterMode, ValidationStatus, Value};
use std::fmt;

/// Something that changed on a component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentEvent {
    NameChanged { old: String, new: String },
    DescriptionChanged { old: String, new: String },
    ValueChanged { component: String, old: Value, new: Value },
    DefaultValueChanged { component: String, old: Value, new: Value },
    ModeChanged { component: String, old: ParameterMode, new: ParameterMode },
    Validated { component: String, old: ValidationStatus, new: ValidationStatus, message: String },
    Reset { component: String },
    Connected { component: String, object: String },
    Disconnected { component: String },
}

/// Callback receiving component events.
pub type Listener = Box<dyn Fn(&ComponentEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

/// Ordered list of event listeners.
///
/// Cloning a notifier yields an empty one: listeners belong to the
/// component they were registered on, never to its copies.
#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: usize,
}

impl Notifier {
    /// Creates a notifier with no listeners.
    pub fn new() -> Self {
        Notifier { listeners: Vec::new(), next_id: 0 }
    }

    /// Registers a listener.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Delivers an event to every listener in subscription order.
    pub fn emit(&self, event: &ComponentEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Clone for Notifier {
    fn clone(&self) -> Self {
        Notifier::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").field("listeners", &self.listeners.len()).finish()
    }
}

/// Name and description of a component, with change notification.
#[derive(Debug, Clone, Default)]
pub struct Identification {
    name: String,
    description: String,
    notifier: Notifier,
}

impl Identification {
    /// Creates an identification with an empty description.
    pub fn new(name: &str) -> Self {
        Identification::with_description(name, "")
    }

    /// Creates an identification with a description.
    pub fn with_description(name: &str, description: &str) -> Self {
        Identification {
            name: name.to_string(),
            description: description.to_string(),
            notifier: Notifier::new(),
        }
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Renames the component and emits `NameChanged`.
    pub fn set_name(&mut self, name: &str) {
        let old = std::mem::replace(&mut self.name, name.to_string());
        self.notifier.emit(&ComponentEvent::NameChanged { old, new: self.name.clone() });
    }

    /// Changes the description and emits `DescriptionChanged`.
    pub fn set_description(&mut self, description: &str) {
        let old = std::mem::replace(&mut self.description, description.to_string());
        let new = self.description.clone();
        self.notifier.emit(&ComponentEvent::DescriptionChanged { old, new });
    }

    /// Registers a listener for this component's events.
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.notifier.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Emits an event on behalf of the owning component.
    pub fn emit(&self, event: ComponentEvent) {
        self.notifier.emit(&event);
    }
}

/// Capability: the component has a name and description and reports changes.
///
/// Foreign adapters implement the setters by forwarding to the foreign
/// instance and caching whatever the foreign side reports back.
pub trait Identified {
    /// Cached identification.
    fn identification(&self) -> &Identification;

    /// Renames the component.
    fn set_name(&mut self, name: &str) -> CapeResult<()>;

    /// Changes the description.
    fn set_description(&mut self, description: &str) -> CapeResult<()>;

    /// Registers a listener for this component's events.
    fn subscribe(&mut self, listener: Listener) -> ListenerId;

    /// Removes a listener registered with `subscribe`. Returns false if the
    /// id is unknown.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;

    /// Component name.
    fn name(&self) -> &str {
        self.identification().name()
    }

    /// Component description.
    fn description(&self) -> &str {
        self.identification().description()
    }
}

/// Collects events into a shared vector. Test helper.
#[cfg(test)]
pub(crate) fn recorder() -> (std::rc::Rc<std::cell::RefCell<Vec<ComponentEvent>>>, Listener) {
    use std::cell::RefCell;
    use std::rc::Rc;

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    (events, Box::new(move |e: &ComponentEvent| sink.borrow_mut().push(e.clone())))
}
