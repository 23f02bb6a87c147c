//! # Project Configuration
//!
//! This module defines the `.conventions.yaml` file that tells the CLI which
//! convention units a project uses and how to reach its external tools.
//!
//! ```yaml
//! name: orders
//! group: com.acme
//! version: 1.4.0
//! units: [frameworkWeb, strictFormatting, qualityCoverage]
//! sources:
//!   java: [src/main/java, src/test/java]
//! exclude: ["**/generated/**"]
//! dependencies:
//!   - scope: implementation
//!     coordinate: com.acme:json
//!     version: "1.0"
//! tools:
//!   google-java-format:
//!     command: google-java-format
//!     check: ["--dry-run", "--set-exit-if-changed"]
//!     apply: ["--replace"]
//! modules:
//!   orders-api:
//!     units: [frameworkReactive]
//! ```
//!
//! ## Build targets
//!
//! The root project and every entry of `modules` become one
//! [`BuildTarget`] each. A module inherits the root's units, sources and
//! excludes unless it overrides them, and always inherits `group`/`version`.
//! Its directory defaults to the module name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::descriptor::DependencyDeclaration;
use crate::error::{Error, Result};
use crate::tool::ToolCommand;

const TOP_LEVEL_FIELDS: &str =
    "name, group, version, units, sources, exclude, dependencies, tools, modules";

/// Contents of `.conventions.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    /// Top-level units, applied in order.
    #[serde(default)]
    pub units: Vec<String>,
    /// Source roots per language. Defaults to the Maven layout.
    #[serde(default)]
    pub sources: Option<BTreeMap<String, Vec<PathBuf>>>,
    /// Glob patterns of files no gate should touch.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Declarations added after the units have run.
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolCommand>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

/// Per-module overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Directory relative to the project root. Defaults to the module name.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub units: Option<Vec<String>>,
    #[serde(default)]
    pub sources: Option<BTreeMap<String, Vec<PathBuf>>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDeclaration>,
}

/// One descriptor to compose, with everything needed to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub name: String,
    /// Directory relative to the project root (`.` for the root project).
    pub dir: PathBuf,
    pub units: Vec<String>,
    pub sources: BTreeMap<String, Vec<PathBuf>>,
    pub exclude: Vec<String>,
    pub dependencies: Vec<DependencyDeclaration>,
}

impl BuildTarget {
    pub fn exclude_patterns(&self) -> Result<Vec<Pattern>> {
        self.exclude
            .iter()
            .map(|p| Pattern::new(p).map_err(Error::Glob))
            .collect()
    }
}

impl ProjectConfig {
    pub fn sources(&self) -> BTreeMap<String, Vec<PathBuf>> {
        self.sources
            .clone()
            .unwrap_or_else(crate::defaults::default_sources)
    }

    /// The root target followed by one target per module, in name order.
    pub fn targets(&self) -> Vec<BuildTarget> {
        let root = BuildTarget {
            name: self.name.clone(),
            dir: PathBuf::from("."),
            units: self.units.clone(),
            sources: self.sources(),
            exclude: self.exclude.clone(),
            dependencies: self.dependencies.clone(),
        };

        let modules = self.modules.iter().map(|(name, module)| BuildTarget {
            name: name.clone(),
            dir: module.path.clone().unwrap_or_else(|| PathBuf::from(name)),
            units: module.units.clone().unwrap_or_else(|| root.units.clone()),
            sources: module
                .sources
                .clone()
                .unwrap_or_else(|| root.sources.clone()),
            exclude: module
                .exclude
                .clone()
                .unwrap_or_else(|| root.exclude.clone()),
            dependencies: module.dependencies.clone(),
        });

        std::iter::once(root.clone()).chain(modules).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "'name' must not be empty".to_string(),
                hint: Some("Set 'name:' to the project's module name".to_string()),
            });
        }

        let module_excludes = self.modules.values().filter_map(|m| m.exclude.as_ref());
        for pattern in self.exclude.iter().chain(module_excludes.flatten()) {
            Pattern::new(pattern).map_err(|e| Error::ConfigParse {
                message: format!("invalid exclude pattern '{}': {}", pattern, e),
                hint: Some("Use * for one path component and ** for any depth".to_string()),
            })?;
        }

        for (name, tool) in &self.tools {
            if tool.command.trim().is_empty() {
                return Err(Error::ConfigParse {
                    message: format!("tool '{}' has an empty command", name),
                    hint: Some(format!("Set 'tools.{}.command' to the executable to run", name)),
                });
            }
        }

        if self.modules.contains_key(&self.name) {
            return Err(Error::ConfigParse {
                message: format!(
                    "module '{}' has the same name as the root project",
                    self.name
                ),
                hint: Some("Rename the module or the project".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_hint(message: &str) -> Option<String> {
    if message.contains("missing field `name`") {
        Some(format!("Add 'name: <project>' to {}", crate::defaults::CONFIG_FILE))
    } else if message.contains("unknown field") {
        Some(format!("Valid top-level fields are: {}", TOP_LEVEL_FIELDS))
    } else if message.contains("unknown variant") {
        Some(
            "Valid scopes are: compileOnly, runtimeOnly, implementation, testImplementation, \
             testRuntimeOnly, annotationProcessor, platform"
                .to_string(),
        )
    } else {
        None
    }
}

/// Parse and validate a configuration document.
pub fn parse(yaml_content: &str) -> Result<ProjectConfig> {
    let config: ProjectConfig = serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        Error::ConfigParse {
            hint: parse_hint(&message),
            message,
        }
    })?;
    config.validate()?;
    Ok(config)
}

/// Parse a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
