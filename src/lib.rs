//! # Conventions Library
//!
//! A layered build-configuration composition engine. Named convention units
//! mutate a shared project descriptor (toolchain, dependency declarations,
//! quality rules, resolution policy) and are applied in a deterministic,
//! prerequisite-first order, each at most once. The library backs the
//! `conventions` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use conventions::descriptor::ProjectDescriptor;
//! use conventions::engine::CompositionEngine;
//! use conventions::properties::PropertyMap;
//! use conventions::units::{self, builtin_registry};
//! use conventions::versions::Versions;
//!
//! let properties: PropertyMap = [
//!     ("javaVersion", "17"),
//!     ("coreVersion", "2.4.1"),
//!     ("frameworkVersion", "3.2.5"),
//!     ("dependencyManagementVersion", "1.1.4"),
//!     ("googleJavaFormatVersion", "1.22.0"),
//!     ("ktlintVersion", "1.2.1"),
//!     ("jacocoVersion", "0.8.12"),
//!     ("junitVersion", "5.10.2"),
//!     ("mockitoVersion", "5.11.0"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let versions = Versions::from_properties(&properties).unwrap();
//! let registry = builtin_registry().unwrap();
//! let engine = CompositionEngine::new(&registry, &versions);
//!
//! let mut project = ProjectDescriptor::new("orders");
//! let applied = engine.apply(&mut project, units::FRAMEWORK_WEB).unwrap();
//! assert_eq!(applied, ["base", "testSupport", "frameworkCore", "frameworkWeb"]);
//! assert_eq!(project.toolchain_version(), Some(17));
//! ```
//!
//! ## Core Concepts
//!
//! - **Versions (`properties`, `versions`, `artifact`)**: one property file
//!   is validated into a typed [`versions::Versions`] snapshot, and a
//!   generated artifact is rewritten only when its content hash changes.
//! - **Units (`registry`, `units`)**: named, idempotent mutations of a
//!   [`descriptor::ProjectDescriptor`] with declared prerequisites.
//! - **Engine (`engine`)**: plans (cycle and exclusion checks) and then
//!   applies units in order.
//! - **Gates (`gates`, `tool`, `resolve`)**: formatting and dependency
//!   checks that fail the build when an enforced rule is violated.
//! - **Tasks (`tasks`, `pipeline`)**: the standard build tasks, run by an
//!   in-process task runner.
//!
//! ## Execution Flow
//!
//! [`orchestrator::Session::open`] runs the first two steps:
//!
//! 1.  **Resolve versions**: validate `conventions.properties` and refresh
//!     the generated artifact.
//! 2.  **Compose**: build one descriptor per target from `.conventions.yaml`.
//! 3.  **Run tasks**: register the standard tasks for a descriptor and run
//!     the requested one.

pub mod artifact;
pub mod config;
pub mod defaults;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod gates;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod properties;
pub mod registry;
pub mod resolve;
pub mod suggestions;
pub mod tasks;
pub mod tool;
pub mod units;
pub mod versions;

#[cfg(test)]
mod engine_proptest;
