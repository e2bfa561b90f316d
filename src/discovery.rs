//! Candidate listing and reference resolution for unit implementations.
//!
//! A [`Discovery`] holds the descriptors of every unit type a host may offer
//! and turns a symbolic reference into a live [`Unit`]. How a reference maps
//! to an implementation is decided by an injected [`ReferenceResolver`];
//! nothing is looked up through process-wide state.

use crate::foreign::{ForeignFactory, ForeignOrigin, ForeignUnitAdapter};
use crate::unit::{NativeUnit, Unit};
use crate::{CapeError, CapeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// Behavior a unit implementation advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Identification,
    Calculation,
    ParameterCollection,
    PortCollection,
    Persistence,
    Editing,
}

/// Where a unit implementation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Native,
    Foreign,
}

/// Catalogue entry for one unit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub name: String,
    /// Symbolic reference passed to [`Discovery::resolve`]
    pub reference: String,
    pub capabilities: Vec<Capability>,
    pub source_kind: SourceKind,
}

impl UnitDescriptor {
    /// Descriptor advertising the capabilities every unit has.
    pub fn new(name: &str, reference: &str, source_kind: SourceKind) -> Self {
        UnitDescriptor {
            name: name.to_string(),
            reference: reference.to_string(),
            capabilities: vec![
                Capability::Identification,
                Capability::Calculation,
                Capability::ParameterCollection,
                Capability::PortCollection,
            ],
            source_kind,
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// A loadable unit implementation.
#[derive(Clone)]
pub enum Implementation {
    /// Constructor of a native unit
    Native(Rc<dyn Fn() -> NativeUnit>),
    /// Origin of a foreign unit, instantiated through the factory
    Foreign(ForeignOrigin),
}

impl Implementation {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Implementation::Native(_) => SourceKind::Native,
            Implementation::Foreign(_) => SourceKind::Foreign,
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Native(_) => f.write_str("Native(..)"),
            Implementation::Foreign(origin) => f.debug_tuple("Foreign").field(origin).finish(),
        }
    }
}

/// Maps a symbolic reference to a loadable implementation.
pub trait ReferenceResolver {
    fn resolve(&self, reference: &str) -> Option<Implementation>;
}

/// Resolver backed by a fixed map.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    entries: HashMap<String, Implementation>,
}

impl StaticResolver {
    pub fn new() -> Self {
        StaticResolver { entries: HashMap::new() }
    }

    /// Maps `reference` to a native constructor.
    pub fn native<F>(mut self, reference: &str, constructor: F) -> Self
    where
        F: Fn() -> NativeUnit + 'static,
    {
        self.entries.insert(reference.to_string(), Implementation::Native(Rc::new(constructor)));
        self
    }

    /// Maps `reference` to a foreign origin.
    pub fn foreign(mut self, reference: &str, origin: ForeignOrigin) -> Self {
        self.entries.insert(reference.to_string(), Implementation::Foreign(origin));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceResolver for StaticResolver {
    fn resolve(&self, reference: &str) -> Option<Implementation> {
        self.entries.get(reference).cloned()
    }
}

/// Catalogue of unit types plus the means to instantiate them.
pub struct Discovery {
    resolver: Box<dyn ReferenceResolver>,
    factory: Rc<dyn ForeignFactory>,
    candidates: Vec<UnitDescriptor>,
}

impl Discovery {
    pub fn new(resolver: Box<dyn ReferenceResolver>, factory: Rc<dyn ForeignFactory>) -> Self {
        Discovery { resolver, factory, candidates: Vec::new() }
    }

    /// Adds a candidate. Fails with `InvalidArgument` if its reference is
    /// already registered.
    pub fn register(&mut self, descriptor: UnitDescriptor) -> CapeResult<()> {
        if self.candidates.iter().any(|d| d.reference == descriptor.reference) {
            return Err(CapeError::InvalidArgument(format!(
                "Reference '{}' is already registered",
                descriptor.reference
            )));
        }
        debug!(
            name = descriptor.name.as_str(),
            reference = descriptor.reference.as_str(),
            "unit candidate registered"
        );
        self.candidates.push(descriptor);
        Ok(())
    }

    /// Candidates in registration order.
    pub fn list_candidates(&self) -> &[UnitDescriptor] {
        &self.candidates
    }

    /// Candidates of one source kind, in registration order.
    pub fn candidates_of(&self, kind: SourceKind) -> impl Iterator<Item = &UnitDescriptor> {
        self.candidates.iter().filter(move |d| d.source_kind == kind)
    }

    /// Instantiates the unit registered under `reference`.
    ///
    /// Fails with `NotFound` when no candidate has this reference or the
    /// resolver cannot load it. The returned unit is not yet initialized.
    pub fn resolve(&self, reference: &str) -> CapeResult<Box<dyn Unit>> {
        let descriptor = self
            .candidates
            .iter()
            .find(|d| d.reference == reference)
            .ok_or_else(|| {
                CapeError::NotFound(format!("No unit candidate with reference '{}'", reference))
            })?;
        let implementation = self
            .resolver
            .resolve(reference)
            .ok_or_else(|| {
                CapeError::NotFound(format!("Reference '{}' could not be loaded", reference))
            })?;

        if implementation.source_kind() != descriptor.source_kind {
            return Err(CapeError::InvalidArgument(format!(
                "Reference '{}' is registered as {:?} but resolves to a {:?} implementation",
                reference,
                descriptor.source_kind,
                implementation.source_kind()
            )));
        }

        let unit: Box<dyn Unit> = match implementation {
            Implementation::Native(constructor) => Box::new(constructor()),
            Implementation::Foreign(origin) => {
                Box::new(ForeignUnitAdapter::instantiate(&origin, self.factory.clone())?)
            }
        };
        info!(reference, name = descriptor.name.as_str(), "unit resolved");
        Ok(unit)
    }
}

impl fmt::Debug for Discovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discovery").field("candidates", &self.candidates).finish()
    }
}
