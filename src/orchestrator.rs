//! # Build Session
//!
//! Ties the pieces together for one CLI invocation.
//!
//! ## Process
//!
//! 1. **Resolve versions**: load `conventions.properties`, validate it, and
//!    regenerate `.conventions/versions.generated.toml` if its content hash
//!    changed. A missing or invalid property stops here.
//! 2. **Compose**: build one [`ProjectDescriptor`] per build target (root
//!    project plus modules). Targets are independent, so they are composed in
//!    parallel; each composition itself is sequential and deterministic.
//! 3. **Run tasks**: done by the caller against a chosen descriptor through
//!    [`crate::pipeline::Pipeline`].
//!
//! Composition errors abort the session before any task is registered.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::artifact::FileArtifactStore;
use crate::config::{BuildTarget, ProjectConfig};
use crate::defaults::GENERATED_VERSIONS_FILE;
use crate::descriptor::ProjectDescriptor;
use crate::engine::CompositionEngine;
use crate::error::Result;
use crate::pipeline::Layout;
use crate::properties::PropertySource;
use crate::registry::UnitRegistry;
use crate::versions::{GenerationStatus, Resolution, VersionRegistry, Versions};

/// Resolve the version snapshot for the project rooted at `project_dir`.
pub fn resolve_versions(project_dir: &Path) -> Result<Resolution> {
    let source = PropertySource::for_project(project_dir)?;
    let registry = VersionRegistry::new(FileArtifactStore::new(
        project_dir.join(GENERATED_VERSIONS_FILE),
    ));
    registry.resolve(&source)
}

/// Compose the descriptor for one target.
pub fn compose_target(
    config: &ProjectConfig,
    target: &BuildTarget,
    engine: CompositionEngine<'_>,
) -> Result<ProjectDescriptor> {
    let mut project =
        ProjectDescriptor::new(&target.name).with_coordinates(&config.group, &config.version);

    let applied = engine.apply_all(&mut project, &target.units)?;
    log::debug!("'{}' applied {:?}", target.name, applied);

    for declaration in &target.dependencies {
        project.push_dependency(declaration.clone());
    }
    Ok(project)
}

/// Compose every target of `config`, in [`ProjectConfig::targets`] order.
pub fn compose_all(
    config: &ProjectConfig,
    registry: &UnitRegistry,
    versions: &Versions,
) -> Result<Vec<ProjectDescriptor>> {
    let engine = CompositionEngine::new(registry, versions);
    let composed: Vec<Result<ProjectDescriptor>> = config
        .targets()
        .par_iter()
        .map(|target| compose_target(config, target, engine))
        .collect();
    // The first failure in target order wins, whichever thread hit it first
    composed.into_iter().collect()
}

/// Everything one invocation works with.
#[derive(Debug)]
pub struct Session {
    pub project_dir: PathBuf,
    pub config: ProjectConfig,
    pub versions: Versions,
    pub generation: GenerationStatus,
    targets: Vec<BuildTarget>,
    descriptors: Vec<ProjectDescriptor>,
}

impl Session {
    /// Resolve versions and compose every target.
    pub fn open(
        project_dir: &Path,
        config: ProjectConfig,
        registry: &UnitRegistry,
    ) -> Result<Self> {
        let resolution = resolve_versions(project_dir)?;
        let descriptors = compose_all(&config, registry, &resolution.versions)?;
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            targets: config.targets(),
            config,
            versions: resolution.versions,
            generation: resolution.status,
            descriptors,
        })
    }

    pub fn descriptors(&self) -> &[ProjectDescriptor] {
        &self.descriptors
    }

    /// The descriptor and target for `module`, or the root project.
    pub fn select(&self, module: Option<&str>) -> Option<(&BuildTarget, &ProjectDescriptor)> {
        let index = match module {
            None => 0,
            Some(name) => self.targets.iter().position(|t| t.name == name)?,
        };
        Some((self.targets.get(index)?, self.descriptors.get(index)?))
    }

    /// Names of every target, root first.
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Filesystem layout of `target`.
    pub fn layout(&self, target: &BuildTarget, local_repository: &Path) -> Result<Layout> {
        let project_dir = if target.dir == Path::new(".") {
            self.project_dir.clone()
        } else {
            self.project_dir.join(&target.dir)
        };
        Ok(Layout {
            build_dir: project_dir.join(crate::defaults::BUILD_DIR),
            project_dir,
            sources: target.sources.clone(),
            exclude: target.exclude_patterns()?,
            local_repository: local_repository.to_path_buf(),
        })
    }
}
