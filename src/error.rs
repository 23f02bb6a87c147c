//! # Error Handling
//!
//! This module defines the centralized error type for the `conventions`
//! library. It uses `thiserror` to build one `Error` enum covering every
//! failure mode of the composition pipeline, so callers can match on the
//! variant and the CLI can print a precise diagnostic.
//!
//! Errors fall into three groups:
//!
//! - **Configuration-time** (`UnknownUnit`, `DuplicateUnit`,
//!   `CyclicDependency`, `MutuallyExclusiveUnits`,
//!   `ToolchainVersionConflict`, `UnitFailed`): raised while composing a
//!   project descriptor. They abort the build before any task executes.
//! - **Version registry** (`SourceNotFound`, `PropertySyntax`,
//!   `MissingVersionProperty`, `InvalidVersionProperty`,
//!   `RegenerationFailure`): raised before composition starts.
//! - **Run-time** (`GateFailure`, `ToolNotConfigured`, `ToolInvocation`,
//!   `UnknownTask`, `CyclicTasks`): raised while tasks execute. A gate failure
//!   only aborts the task chain that depends on it.

use std::path::PathBuf;

use thiserror::Error;

use crate::gates::Violation;

/// Main error type for conventions operations
#[derive(Error, Debug)]
pub enum Error {
    /// A unit name was requested, or listed as a prerequisite, but no unit
    /// with that name is registered.
    #[error("Unknown convention unit '{name}'{}", required_by_suffix(required_by))]
    UnknownUnit {
        name: String,
        /// The unit that listed `name` as a prerequisite, if any
        required_by: Option<String>,
    },

    /// Two units were registered under the same name.
    #[error("Convention unit '{name}' is already registered")]
    DuplicateUnit { name: String },

    /// The prerequisite graph contains a cycle.
    #[error("Cyclic dependency between convention units: {cycle}")]
    CyclicDependency { cycle: String },

    /// A unit declares that it cannot coexist with another unit that is
    /// already applied or planned for the same descriptor.
    #[error(
        "Convention units '{unit}' and '{other}' cannot be applied to the same project"
    )]
    MutuallyExclusiveUnits { unit: String, other: String },

    /// Two units disagree on the toolchain version.
    #[error(
        "Toolchain version conflict: already set to {existing}, attempted to set {attempted}"
    )]
    ToolchainVersionConflict { existing: u32, attempted: u32 },

    /// A unit's apply step failed.
    #[error("Convention unit '{unit}' failed: {source}")]
    UnitFailed {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    /// The property source is absent from its canonical location.
    #[error("Property source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The property source could not be parsed.
    #[error("Invalid property source {}: {message}", path.display())]
    PropertySyntax { path: PathBuf, message: String },

    /// A required version property is missing.
    #[error("Missing version property '{key}'")]
    MissingVersionProperty { key: String },

    /// A required version property has a value of the wrong shape.
    #[error("Invalid value '{value}' for version property '{key}': {message}")]
    InvalidVersionProperty {
        key: String,
        value: String,
        message: String,
    },

    /// Writing the generated versions artifact failed. The previous artifact
    /// is left untouched.
    #[error("Failed to regenerate {}: {message}", path.display())]
    RegenerationFailure { path: PathBuf, message: String },

    /// An enforcement gate found violations.
    #[error("Gate '{gate}' failed with {} violation(s)", violations.len())]
    GateFailure {
        gate: String,
        violations: Vec<Violation>,
    },

    /// A quality rule references a tool with no configured command.
    #[error("Tool '{tool}' is not configured")]
    ToolNotConfigured { tool: String },

    /// An external tool could not be run or produced unusable output.
    #[error("Tool invocation error: {tool} - {message}")]
    ToolInvocation { tool: String, message: String },

    /// A task name was run or listed as a prerequisite but never registered.
    #[error("Unknown task '{name}'{}", required_by_suffix(required_by))]
    UnknownTask {
        name: String,
        required_by: Option<String>,
    },

    /// Two tasks were registered under the same name.
    #[error("Task '{name}' is already registered")]
    DuplicateTask { name: String },

    /// Task prerequisites form a cycle.
    #[error("Cyclic task dependency: {cycle}")]
    CyclicTasks { cycle: String },

    /// The project configuration file is invalid.
    #[error("Configuration parsing error: {message}{}", hint_suffix(hint))]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Returns true for errors raised while composing a descriptor.
    ///
    /// These must abort the build before any task runs.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownUnit { .. }
                | Error::DuplicateUnit { .. }
                | Error::CyclicDependency { .. }
                | Error::MutuallyExclusiveUnits { .. }
                | Error::ToolchainVersionConflict { .. }
                | Error::UnitFailed { .. }
        )
    }

    /// The underlying cause, looking through `UnitFailed` wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::UnitFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn required_by_suffix(parent: &Option<String>) -> String {
    parent
        .as_ref()
        .map(|p| format!(" (required by '{}')", p))
        .unwrap_or_default()
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}
