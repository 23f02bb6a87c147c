//! Dependency resolution.
//!
//! Real resolution (repositories, transitive metadata) belongs to the build
//! tool. The dependency gate only needs a graph of coordinates and the
//! versions requested for each, which [`DeclaredResolver`] derives from the
//! descriptor's own declarations.

use serde::Serialize;

use crate::descriptor::{ProjectDescriptor, Scope};
use crate::error::Result;

/// Every request made for one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub coordinate: String,
    /// Distinct requested versions, in declaration order. Empty when the
    /// version is managed by a platform.
    pub requested: Vec<String>,
    pub scopes: Vec<Scope>,
}

impl ResolvedDependency {
    pub fn is_conflicting(&self) -> bool {
        self.requested.len() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    dependencies: Vec<ResolvedDependency>,
}

impl ResolvedGraph {
    pub fn dependencies(&self) -> &[ResolvedDependency] {
        &self.dependencies
    }

    pub fn get(&self, coordinate: &str) -> Option<&ResolvedDependency> {
        self.dependencies
            .iter()
            .find(|d| d.coordinate == coordinate)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Turns a descriptor into a resolved graph.
pub trait DependencyResolver {
    fn resolve(&self, project: &ProjectDescriptor) -> Result<ResolvedGraph>;
}

/// Resolves from declarations only: each coordinate collects the versions
/// requested for it, and excluded coordinates are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredResolver;

impl DependencyResolver for DeclaredResolver {
    fn resolve(&self, project: &ProjectDescriptor) -> Result<ResolvedGraph> {
        let mut dependencies: Vec<ResolvedDependency> = Vec::new();

        for declaration in project.dependencies() {
            if project.exclusions().contains(&declaration.coordinate) {
                log::debug!("Excluded {}", declaration.coordinate);
                continue;
            }

            let entry = match dependencies
                .iter_mut()
                .position(|d| d.coordinate == declaration.coordinate)
            {
                Some(index) => &mut dependencies[index],
                None => {
                    dependencies.push(ResolvedDependency {
                        coordinate: declaration.coordinate.clone(),
                        requested: Vec::new(),
                        scopes: Vec::new(),
                    });
                    let last = dependencies.len() - 1;
                    &mut dependencies[last]
                }
            };

            if let Some(version) = &declaration.version {
                if !entry.requested.contains(version) {
                    entry.requested.push(version.clone());
                }
            }
            if !entry.scopes.contains(&declaration.scope) {
                entry.scopes.push(declaration.scope);
            }
        }

        Ok(ResolvedGraph { dependencies })
    }
}
