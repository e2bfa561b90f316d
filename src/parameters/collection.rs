//! Ordered, name-addressable parameter set owned by a unit.
//!
//! Insertion order is significant: it is the positional index used when a
//! unit's parameter values are persisted and restored.

use super::Parameter;
use crate::identification::Identified;
use crate::{CapeError, CapeResult};

/// Parameters of one unit, in insertion order, with unique names.
#[derive(Debug, Default)]
pub struct ParameterCollection {
    items: Vec<Box<dyn Parameter>>,
}

impl ParameterCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ParameterCollection { items: Vec::new() }
    }

    /// Appends a parameter. Fails with `InvalidArgument` if the name is taken.
    pub fn add(&mut self, parameter: Box<dyn Parameter>) -> CapeResult<()> {
        if self.contains(parameter.name()) {
            return Err(CapeError::InvalidArgument(format!(
                "Parameter '{}' already exists in this collection",
                parameter.name()
            )));
        }
        self.items.push(parameter);
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn by_name(&self, name: &str) -> CapeResult<&dyn Parameter> {
        match self.items.iter().find(|p| p.name() == name) {
            Some(p) => Ok(p.as_ref()),
            None => Err(CapeError::NotFound(format!("Parameter '{}'", name))),
        }
    }

    /// Exact, case-sensitive mutable lookup.
    ///
    /// Renaming through the returned reference bypasses the uniqueness
    /// check; use [`ParameterCollection::rename`] instead.
    pub fn by_name_mut(&mut self, name: &str) -> CapeResult<&mut dyn Parameter> {
        match self.items.iter_mut().find(|p| p.name() == name) {
            Some(p) => Ok(p.as_mut()),
            None => Err(CapeError::NotFound(format!("Parameter '{}'", name))),
        }
    }

    /// Positional lookup.
    pub fn get(&self, index: usize) -> CapeResult<&dyn Parameter> {
        match self.items.get(index) {
            Some(p) => Ok(p.as_ref()),
            None => Err(CapeError::NotFound(format!(
                "Parameter index {} (collection has {})",
                index,
                self.len()
            ))),
        }
    }

    /// Positional mutable lookup.
    pub fn get_mut(&mut self, index: usize) -> CapeResult<&mut dyn Parameter> {
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(p) => Ok(p.as_mut()),
            None => Err(CapeError::NotFound(format!(
                "Parameter index {} (collection has {})",
                index, len
            ))),
        }
    }

    /// Position of a parameter by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Renames a parameter, keeping names unique.
    ///
    /// Fails with `NotFound` if `name` is absent and with `InvalidArgument`
    /// if another parameter is already called `new_name`.
    pub fn rename(&mut self, name: &str, new_name: &str) -> CapeResult<()> {
        if name != new_name && self.contains(new_name) {
            let message = format!("Parameter '{}' already exists in this collection", new_name);
            return Err(CapeError::InvalidArgument(message));
        }
        self.by_name_mut(name)?.set_name(new_name)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Parameter + 'static)> {
        self.items.iter().map(|p| p.as_ref())
    }

    /// Iterates mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Parameter>> {
        self.items.iter_mut()
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes every parameter. Parameters already handed out by
    /// [`ParameterCollection::take`] are unaffected.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Removes and returns a parameter by name.
    pub fn take(&mut self, name: &str) -> CapeResult<Box<dyn Parameter>> {
        match self.position(name) {
            Some(index) => Ok(self.items.remove(index)),
            None => Err(CapeError::NotFound(format!("Parameter '{}'", name))),
        }
    }

    /// Deep copy of every parameter, preserving order.
    pub fn try_clone(&self) -> CapeResult<ParameterCollection> {
        let items = self.items.iter().map(|p| p.clone_parameter()).collect::<CapeResult<Vec<_>>>()?;
        Ok(ParameterCollection { items })
    }
}
