//! # Composition Engine
//!
//! Applies convention units to a project descriptor in prerequisite order,
//! each unit at most once.
//!
//! ## Process
//!
//! 1.  **Plan**: a depth-first, post-order traversal of the prerequisite graph
//!     starting at the requested unit(s). Prerequisites are visited in
//!     registration order, so the resulting order is deterministic for a fixed
//!     registry. Units already recorded on the descriptor are skipped along
//!     with their subtrees.
//!
//! 2.  **Validate**: the traversal keeps the current path of units being
//!     visited. Meeting a unit that is still on the path is a cycle. Unknown
//!     names and mutually exclusive units are also rejected here. Any failure
//!     at this stage leaves the descriptor untouched.
//!
//! 3.  **Apply**: units run strictly in plan order. Each unit mutates a staged
//!     copy of the descriptor that replaces the real one only on success, so a
//!     failing unit leaves no trace while prerequisites that already
//!     succeeded stay applied.

use std::collections::HashSet;

use crate::descriptor::ProjectDescriptor;
use crate::error::{Error, Result};
use crate::registry::UnitRegistry;
use crate::versions::Versions;

/// Orders and applies convention units from one registry.
#[derive(Debug, Clone, Copy)]
pub struct CompositionEngine<'a> {
    registry: &'a UnitRegistry,
    versions: &'a Versions,
}

impl<'a> CompositionEngine<'a> {
    pub fn new(registry: &'a UnitRegistry, versions: &'a Versions) -> Self {
        Self { registry, versions }
    }

    pub fn registry(&self) -> &'a UnitRegistry {
        self.registry
    }

    /// Compute the units `unit` would apply to `project`, in order.
    ///
    /// Pure: the descriptor is only read.
    pub fn plan(&self, project: &ProjectDescriptor, unit: &str) -> Result<Vec<&'a str>> {
        self.plan_all(project, &[unit])
    }

    /// Compute a single combined order for several top-level units.
    pub fn plan_all<S: AsRef<str>>(
        &self,
        project: &ProjectDescriptor,
        units: &[S],
    ) -> Result<Vec<&'a str>> {
        let mut planner = Planner {
            registry: self.registry,
            project,
            order: Vec::new(),
            visiting: Vec::new(),
            done: HashSet::new(),
        };
        for unit in units {
            planner.visit(unit.as_ref(), None)?;
        }

        let order = planner.order;
        self.check_exclusions(project, &order)?;
        Ok(order)
    }

    /// Apply `unit` and everything it requires.
    ///
    /// Returns the names of the units applied by this call, in order. A unit
    /// that is already applied yields an empty list.
    pub fn apply(&self, project: &mut ProjectDescriptor, unit: &str) -> Result<Vec<String>> {
        self.apply_all(project, &[unit])
    }

    /// Apply several top-level units. The combined plan is validated before
    /// any unit runs.
    pub fn apply_all<S: AsRef<str>>(
        &self,
        project: &mut ProjectDescriptor,
        units: &[S],
    ) -> Result<Vec<String>> {
        let order = self.plan_all(project, units)?;
        log::debug!("Composition plan for '{}': {:?}", project.name, order);

        let mut applied = Vec::with_capacity(order.len());
        for name in order {
            let unit = self.registry.get(name).ok_or_else(|| Error::UnknownUnit {
                name: name.to_string(),
                required_by: None,
            })?;

            let mut staged = project.clone();
            unit.apply(&mut staged, self.versions)
                .map_err(|e| Error::UnitFailed {
                    unit: name.to_string(),
                    source: Box::new(e),
                })?;
            staged.mark_applied(name);
            *project = staged;

            log::info!("Applied convention unit '{}' to '{}'", name, project.name);
            applied.push(name.to_string());
        }

        Ok(applied)
    }

    /// Reject plans that combine units declared as mutually exclusive, in
    /// either direction, against both planned and already-applied units.
    fn check_exclusions(&self, project: &ProjectDescriptor, order: &[&str]) -> Result<()> {
        let present = |name: &str| project.is_applied(name) || order.contains(&name);

        for &name in order {
            if let Some(unit) = self.registry.get(name) {
                let mut excluded = unit.excluded_units().iter();
                if let Some(other) = excluded.find(|o| present(o.as_str())) {
                    return Err(Error::MutuallyExclusiveUnits {
                        unit: name.to_string(),
                        other: other.clone(),
                    });
                }
            }
        }

        for applied in project.applied_units() {
            if let Some(unit) = self.registry.get(applied) {
                if let Some(other) = unit
                    .excluded_units()
                    .iter()
                    .find(|o| order.contains(&o.as_str()))
                {
                    return Err(Error::MutuallyExclusiveUnits {
                        unit: other.clone(),
                        other: applied.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Depth-first traversal state for one planning request.
struct Planner<'a, 'p> {
    registry: &'a UnitRegistry,
    project: &'p ProjectDescriptor,
    order: Vec<&'a str>,
    /// Units on the current traversal path
    visiting: Vec<&'a str>,
    done: HashSet<&'a str>,
}

impl<'a> Planner<'a, '_> {
    fn visit(&mut self, name: &str, required_by: Option<&str>) -> Result<()> {
        let unit = self.registry.get(name).ok_or_else(|| Error::UnknownUnit {
            name: name.to_string(),
            required_by: required_by.map(str::to_string),
        })?;
        let name = unit.name();

        if self.done.contains(name) || self.project.is_applied(name) {
            log::debug!("Skipping '{}': already planned or applied", name);
            return Ok(());
        }

        if let Some(start) = self.visiting.iter().position(|&v| v == name) {
            let mut cycle: Vec<&str> = self.visiting[start..].to_vec();
            cycle.push(name);
            return Err(Error::CyclicDependency {
                cycle: cycle.join(" -> "),
            });
        }

        self.visiting.push(name);

        // Independent prerequisites: first registered, first applied
        let mut prerequisites: Vec<&'a str> =
            unit.prerequisites().iter().map(String::as_str).collect();
        prerequisites.sort_by_key(|p| self.registry.position(p).unwrap_or(usize::MAX));

        for prerequisite in prerequisites {
            self.visit(prerequisite, Some(name))?;
        }

        self.visiting.pop();
        self.done.insert(name);
        self.order.push(name);
        Ok(())
    }
}
