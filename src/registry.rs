//! Convention units and the registry that holds them
//!
//! A [`ConventionUnit`] is a named configuration mutator with an ordered list
//! of prerequisite unit names. Units are collected in an explicit
//! [`UnitRegistry`] that is passed to the composition engine, so independent
//! engines (and tests) never share state.
//!
//! Registration order matters only for tie-breaking: when two prerequisites
//! are independent of each other, the one registered first is applied first.

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::ProjectDescriptor;
use crate::error::{Error, Result};
use crate::versions::Versions;

/// Signature of a unit's apply step.
pub type ApplyFn = dyn Fn(&mut ProjectDescriptor, &Versions) -> Result<()> + Send + Sync;

/// A named, idempotent configuration mutator.
pub struct ConventionUnit {
    name: String,
    prerequisites: Vec<String>,
    excludes: Vec<String>,
    apply: Box<ApplyFn>,
}

impl ConventionUnit {
    pub fn new<F>(name: &str, apply: F) -> Self
    where
        F: Fn(&mut ProjectDescriptor, &Versions) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            prerequisites: Vec::new(),
            excludes: Vec::new(),
            apply: Box::new(apply),
        }
    }

    /// Declare prerequisites, applied before this unit.
    pub fn requires(mut self, prerequisites: &[&str]) -> Self {
        self.prerequisites
            .extend(prerequisites.iter().map(|p| p.to_string()));
        self
    }

    /// Declare units that must never be applied to the same descriptor.
    pub fn excludes(mut self, units: &[&str]) -> Self {
        self.excludes.extend(units.iter().map(|u| u.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn excluded_units(&self) -> &[String] {
        &self.excludes
    }

    /// Run the apply step. Ordering and at-most-once are the engine's job.
    pub fn apply(&self, project: &mut ProjectDescriptor, versions: &Versions) -> Result<()> {
        (self.apply)(project, versions)
    }
}

impl fmt::Debug for ConventionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionUnit")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("excludes", &self.excludes)
            .finish_non_exhaustive()
    }
}

/// Explicit, constructed set of convention units keyed by name.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<ConventionUnit>,
    index: HashMap<String, usize>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit. Names are unique.
    pub fn register(&mut self, unit: ConventionUnit) -> Result<()> {
        if self.index.contains_key(unit.name()) {
            return Err(Error::DuplicateUnit {
                name: unit.name().to_string(),
            });
        }
        self.index.insert(unit.name().to_string(), self.units.len());
        self.units.push(unit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ConventionUnit> {
        self.index.get(name).map(|&i| &self.units[i])
    }

    /// Registration position of a unit, used to break ordering ties.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Units in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConventionUnit> {
        self.units.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(ConventionUnit::name).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
