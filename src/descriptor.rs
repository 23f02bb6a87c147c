//! Project descriptor: the mutable state convention units build up
//!
//! A descriptor is created once per build target, populated during
//! composition, and then handed to the task runner. All mutation goes through
//! the methods here so the invariants hold no matter which unit writes:
//!
//! - a unit name is recorded in `applied_units` at most once,
//! - the toolchain version is set once and never changes afterwards,
//! - dependency declarations keep their insertion order and are never
//!   deduplicated (conflict handling belongs to the resolver).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration a dependency is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    CompileOnly,
    RuntimeOnly,
    Implementation,
    TestImplementation,
    TestRuntimeOnly,
    AnnotationProcessor,
    Platform,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::CompileOnly => "compileOnly",
            Scope::RuntimeOnly => "runtimeOnly",
            Scope::Implementation => "implementation",
            Scope::TestImplementation => "testImplementation",
            Scope::TestRuntimeOnly => "testRuntimeOnly",
            Scope::AnnotationProcessor => "annotationProcessor",
            Scope::Platform => "platform",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(scope, coordinate, version)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub scope: Scope,
    /// `group:artifact`
    pub coordinate: String,
    /// `None` when the version is managed by a platform/BOM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DependencyDeclaration {
    pub fn new(scope: Scope, coordinate: &str, version: Option<&str>) -> Self {
        Self {
            scope,
            coordinate: coordinate.to_string(),
            version: version.map(str::to_string),
        }
    }
}

impl fmt::Display for DependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}:{}", self.scope, self.coordinate, version),
            None => write!(f, "{} {}", self.scope, self.coordinate),
        }
    }
}

/// What a quality rule governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Format,
    Lint,
    Coverage,
}

/// Configuration for one quality tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRule {
    pub kind: RuleKind,
    /// Tool name, resolved to a command through the project configuration.
    pub tool: String,
    pub version: String,
    /// Source language the rule applies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// File extensions the rule checks, without the leading dot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    /// Opaque style/option bag passed to the tool.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// When set, violations fail the build.
    pub enforced: bool,
}

impl QualityRule {
    pub fn new(kind: RuleKind, tool: &str, version: &str) -> Self {
        Self {
            kind,
            tool: tool.to_string(),
            version: version.to_string(),
            language: None,
            extensions: Vec::new(),
            options: BTreeMap::new(),
            enforced: false,
        }
    }

    pub fn for_language(mut self, language: &str, extensions: &[&str]) -> Self {
        self.language = Some(language.to_string());
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }
}

/// Dependency resolution strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    pub fail_on_version_conflict: bool,
    pub fail_on_dynamic_version: bool,
}

impl ResolutionPolicy {
    pub fn is_strict(&self) -> bool {
        self.fail_on_version_conflict || self.fail_on_dynamic_version
    }
}

/// The composed description of one build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    applied_units: Vec<String>,
    dependencies: Vec<DependencyDeclaration>,
    #[serde(default)]
    exclusions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    toolchain_version: Option<u32>,
    #[serde(default)]
    quality_rules: BTreeMap<String, QualityRule>,
    #[serde(default)]
    resolution_policy: ResolutionPolicy,
}

impl ProjectDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group: String::new(),
            version: String::new(),
            applied_units: Vec::new(),
            dependencies: Vec::new(),
            exclusions: Vec::new(),
            toolchain_version: None,
            quality_rules: BTreeMap::new(),
            resolution_policy: ResolutionPolicy::default(),
        }
    }

    pub fn with_coordinates(mut self, group: &str, version: &str) -> Self {
        self.group = group.to_string();
        self.version = version.to_string();
        self
    }

    /// Units applied so far, in application order.
    pub fn applied_units(&self) -> &[String] {
        &self.applied_units
    }

    pub fn is_applied(&self, unit: &str) -> bool {
        self.applied_units.iter().any(|u| u == unit)
    }

    /// Record a unit as applied. Returns false if it already was.
    pub(crate) fn mark_applied(&mut self, unit: &str) -> bool {
        if self.is_applied(unit) {
            return false;
        }
        self.applied_units.push(unit.to_string());
        true
    }

    pub fn dependencies(&self) -> &[DependencyDeclaration] {
        &self.dependencies
    }

    pub fn add_dependency(&mut self, scope: Scope, coordinate: &str, version: Option<&str>) {
        self.dependencies
            .push(DependencyDeclaration::new(scope, coordinate, version));
    }

    pub fn push_dependency(&mut self, declaration: DependencyDeclaration) {
        self.dependencies.push(declaration);
    }

    /// Coordinates the resolver must drop from transitive graphs.
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn exclude(&mut self, coordinate: &str) {
        if !self.exclusions.iter().any(|c| c == coordinate) {
            self.exclusions.push(coordinate.to_string());
        }
    }

    pub fn toolchain_version(&self) -> Option<u32> {
        self.toolchain_version
    }

    /// Set the toolchain version once.
    ///
    /// Setting the same value again is a no-op; a different value fails with
    /// [`Error::ToolchainVersionConflict`].
    pub fn set_toolchain_version(&mut self, version: u32) -> Result<()> {
        match self.toolchain_version {
            None => {
                self.toolchain_version = Some(version);
                Ok(())
            }
            Some(existing) if existing == version => Ok(()),
            Some(existing) => Err(Error::ToolchainVersionConflict {
                existing,
                attempted: version,
            }),
        }
    }

    pub fn quality_rules(&self) -> &BTreeMap<String, QualityRule> {
        &self.quality_rules
    }

    pub fn quality_rule(&self, key: &str) -> Option<&QualityRule> {
        self.quality_rules.get(key)
    }

    pub fn set_quality_rule(&mut self, key: &str, rule: QualityRule) {
        self.quality_rules.insert(key.to_string(), rule);
    }

    /// Mark every rule of `kind` as enforced. Returns how many rules changed.
    pub fn enforce_rules(&mut self, kind: RuleKind) -> usize {
        let mut changed = 0;
        for rule in self.quality_rules.values_mut() {
            if rule.kind == kind && !rule.enforced {
                rule.enforced = true;
                changed += 1;
            }
        }
        changed
    }

    /// Formatting rules, keyed by rule name.
    pub fn format_rules(&self) -> impl Iterator<Item = (&str, &QualityRule)> {
        self.quality_rules
            .iter()
            .filter(|(_, rule)| rule.kind == RuleKind::Format)
            .map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        self.resolution_policy
    }

    pub fn resolution_policy_mut(&mut self) -> &mut ResolutionPolicy {
        &mut self.resolution_policy
    }
}
