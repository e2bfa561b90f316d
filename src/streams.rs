//! Concrete objects that can be connected to ports.
//!
//! [`MaterialStream`] carries a component list and named property vectors
//! (temperature, pressure, flow, fractions) and satisfies material ports.
//! [`InformationStream`] carries a single [`Value`] and satisfies energy and
//! information ports.

use crate::ports::{Connectable, MaterialObject, ValueCarrier};
use crate::value::Value;
use crate::{CapeError, CapeResult};
use std::cell::RefCell;
use std::collections::HashMap;

/// Process stream with components and named property vectors.
///
/// Interior mutability lets a port and the unit that owns it share the
/// stream through an `Rc` while either side writes properties.
///
/// # Examples
///
/// ```
/// use nomata_cape::{MaterialObject, MaterialStream};
///
/// let feed = MaterialStream::new("S1", &["water", "ethanol"])
///     .at_conditions(298.15, 101325.0);
///
/// feed.set_property("fraction", &[0.6, 0.4]).unwrap();
/// assert_eq!(feed.property("temperature").unwrap(), vec![298.15]);
/// assert!(feed.set_property("fraction", &[1.0]).is_err());
/// ```
#[derive(Debug)]
pub struct MaterialStream {
    name: String,
    components: Vec<String>,
    properties: RefCell<HashMap<String, Vec<f64>>>,
}

impl MaterialStream {
    /// Creates a stream with no properties set.
    pub fn new(name: &str, components: &[&str]) -> Self {
        MaterialStream {
            name: name.to_string(),
            components: components.iter().map(|c| c.to_string()).collect(),
            properties: RefCell::new(HashMap::new()),
        }
    }

    /// Sets temperature (K) and pressure (Pa).
    pub fn at_conditions(self, temperature: f64, pressure: f64) -> Self {
        {
            let mut props = self.properties.borrow_mut();
            props.insert("temperature".to_string(), vec![temperature]);
            props.insert("pressure".to_string(), vec![pressure]);
        }
        self
    }

    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }
}

/// Properties that hold one value per component.
const PER_COMPONENT: &[&str] = &["fraction", "flow"];

impl MaterialObject for MaterialStream {
    fn component_ids(&self) -> Vec<String> {
        self.components.clone()
    }

    fn property(&self, name: &str) -> CapeResult<Vec<f64>> {
        self.properties
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CapeError::NotFound(format!("Property '{}' on stream '{}'", name, self.name))
            })
    }

    fn set_property(&self, name: &str, values: &[f64]) -> CapeResult<()> {
        if PER_COMPONENT.contains(&name) && values.len() != self.components.len() {
            return Err(CapeError::InvalidArgument(format!(
                "Property '{}' needs {} values, got {}",
                name,
                self.components.len(),
                values.len()
            )));
        }
        self.properties.borrow_mut().insert(name.to_string(), values.to_vec());
        Ok(())
    }
}

impl Connectable for MaterialStream {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn as_material(&self) -> Option<&dyn MaterialObject> {
        Some(self)
    }
}

/// Energy or information stream carrying a single value.
#[derive(Debug)]
pub struct InformationStream {
    name: String,
    value: RefCell<Value>,
}

impl InformationStream {
    pub fn new(name: &str, value: Value) -> Self {
        InformationStream { name: name.to_string(), value: RefCell::new(value) }
    }
}

impl ValueCarrier for InformationStream {
    fn carried_value(&self) -> CapeResult<Value> {
        Ok(self.value.borrow().clone())
    }

    fn set_carried_value(&self, value: Value) -> CapeResult<()> {
        *self.value.borrow_mut() = value;
        Ok(())
    }
}

impl Connectable for InformationStream {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn as_value_carrier(&self) -> Option<&dyn ValueCarrier> {
        Some(self)
    }
}
