//! # Version Registry
//!
//! Turns the flat property source into a typed, read-only [`Versions`]
//! snapshot, and keeps the persisted `GeneratedVersions` artifact in sync with
//! it.
//!
//! ## Resolution
//!
//! 1. **Validate**: every key in [`REQUIRED_KEYS`] must be present, and
//!    `javaVersion` must be an integer. Validation happens before anything is
//!    written, so a broken property source never touches the artifact.
//! 2. **Hash**: a SHA-256 content hash is computed over the sorted
//!    `key=value` lines of the whole mapping.
//! 3. **Compare**: under the store's exclusive lock, the hash recorded in the
//!    artifact header is compared to the fresh hash. Equal hashes skip the
//!    write entirely.
//! 4. **Regenerate**: otherwise the artifact is rendered in full and replaced
//!    atomically.
//!
//! The staleness check depends only on content, never on timestamps, so the
//! same property source always yields the same artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::artifact::ArtifactStore;
use crate::error::{Error, Result};
use crate::properties::{PropertyMap, PropertySource};

/// Header line identifying a generated artifact.
pub const GENERATED_MARKER: &str = "# @generated by conventions. DO NOT EDIT.";

/// Keys every property source must define.
pub const REQUIRED_KEYS: [&str; 9] = [
    "javaVersion",
    "coreVersion",
    "frameworkVersion",
    "dependencyManagementVersion",
    "googleJavaFormatVersion",
    "ktlintVersion",
    "jacocoVersion",
    "junitVersion",
    "mockitoVersion",
];

/// Typed snapshot of the version constants for one build invocation.
///
/// Built only through [`Versions::from_properties`], which either produces a
/// complete snapshot or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub java_version: u32,
    pub core_version: String,
    pub framework_version: String,
    pub dependency_management_version: String,
    pub google_java_format_version: String,
    pub ktlint_version: String,
    pub jacoco_version: String,
    pub junit_version: String,
    pub mockito_version: String,
    constants: PropertyMap,
    source_hash: String,
}

impl Versions {
    /// Validate a raw property mapping and build the typed snapshot.
    pub fn from_properties(properties: &PropertyMap) -> Result<Self> {
        // A blank value is as good as a missing one
        for key in REQUIRED_KEYS {
            if properties.get(key).is_none_or(|v| v.trim().is_empty()) {
                return Err(Error::MissingVersionProperty {
                    key: key.to_string(),
                });
            }
        }

        let required = |key: &str| properties[key].trim().to_string();

        let java_raw = required("javaVersion");
        let java_version = java_raw
            .parse::<u32>()
            .map_err(|e| Error::InvalidVersionProperty {
                key: "javaVersion".to_string(),
                value: java_raw.clone(),
                message: format!("expected a major version number ({})", e),
            })?;

        Ok(Self {
            java_version,
            core_version: required("coreVersion"),
            framework_version: required("frameworkVersion"),
            dependency_management_version: required("dependencyManagementVersion"),
            google_java_format_version: required("googleJavaFormatVersion"),
            ktlint_version: required("ktlintVersion"),
            jacoco_version: required("jacocoVersion"),
            junit_version: required("junitVersion"),
            mockito_version: required("mockitoVersion"),
            constants: properties.clone(),
            source_hash: content_hash(properties),
        })
    }

    /// Look up a constant by its property name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a loaded constant. Asking for a constant that
    /// does not exist is a programming error in a convention unit.
    pub fn constant(&self, name: &str) -> &str {
        match self.try_constant(name) {
            Some(value) => value,
            None => panic!("unknown version constant '{}'", name),
        }
    }

    pub fn try_constant(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(|v| v.trim())
    }

    /// All constants, sorted by name.
    pub fn constants(&self) -> impl Iterator<Item = (&str, &str)> {
        self.constants.iter().map(|(k, v)| (k.as_str(), v.trim()))
    }

    /// Hash of the property mapping this snapshot was built from.
    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    /// Render the `GeneratedVersions` artifact for this snapshot.
    pub fn render(&self) -> Result<String> {
        let mut versions = toml::Table::new();
        let mut extra = BTreeMap::new();
        for (key, value) in self.constants() {
            if key == "javaVersion" {
                versions.insert(
                    key.to_string(),
                    toml::Value::Integer(i64::from(self.java_version)),
                );
            } else if REQUIRED_KEYS.contains(&key) {
                versions.insert(key.to_string(), toml::Value::String(value.to_string()));
            } else {
                extra.insert(key.to_string(), value.to_string());
            }
        }

        let document = GeneratedVersions {
            meta: GeneratedMeta {
                source_hash: self.source_hash.clone(),
            },
            versions,
            extra,
        };
        let body = toml::to_string(&document).map_err(|e| Error::RegenerationFailure {
            path: "GeneratedVersions".into(),
            message: e.to_string(),
        })?;

        Ok(format!(
            "{}\n# Source: conventions.properties. Regenerated when its content hash changes.\n\n{}",
            GENERATED_MARKER, body
        ))
    }
}

/// On-disk layout of the generated artifact.
#[derive(Debug, Serialize, Deserialize)]
struct GeneratedVersions {
    meta: GeneratedMeta,
    versions: toml::Table,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeneratedMeta {
    source_hash: String,
}

/// Compute the content hash of a property mapping.
///
/// The mapping is sorted, so insertion order never changes the hash.
pub fn content_hash(properties: &PropertyMap) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in properties {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Extract the recorded source hash from a generated artifact.
///
/// Returns `None` for anything that is not a well-formed generated artifact,
/// which forces regeneration.
pub fn recorded_hash(artifact: &str) -> Option<String> {
    if !artifact.starts_with(GENERATED_MARKER) {
        return None;
    }
    toml::from_str::<GeneratedVersions>(artifact)
        .ok()
        .map(|doc| doc.meta.source_hash)
}

/// Whether the artifact had to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// Recorded hash matched; nothing was written.
    Fresh,
    /// The artifact was missing or stale and has been replaced.
    Regenerated,
}

/// Outcome of [`VersionRegistry::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub versions: Versions,
    pub status: GenerationStatus,
}

/// Produces version snapshots and keeps the generated artifact current.
#[derive(Debug)]
pub struct VersionRegistry<S: ArtifactStore> {
    store: S,
}

impl<S: ArtifactStore> VersionRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate the property source, then regenerate the artifact if its
    /// content hash changed.
    pub fn resolve(&self, source: &PropertySource) -> Result<Resolution> {
        // Validation first: a missing key must never reach the store
        let versions = Versions::from_properties(source.properties())?;

        let _guard = self.store.lock()?;
        let current = self.store.read()?;
        let recorded = current.as_deref().and_then(recorded_hash);

        if recorded.as_deref() == Some(versions.source_hash()) {
            log::debug!(
                "Generated versions at {} are up to date ({})",
                self.store.location().display(),
                versions.source_hash()
            );
            return Ok(Resolution {
                versions,
                status: GenerationStatus::Fresh,
            });
        }

        if current.is_some() && recorded.is_none() {
            log::warn!(
                "{} is not a recognised generated artifact; regenerating",
                self.store.location().display()
            );
        }

        let rendered = versions.render()?;
        self.store.replace(&rendered)?;
        log::info!(
            "Regenerated version constants at {}",
            self.store.location().display()
        );

        Ok(Resolution {
            versions,
            status: GenerationStatus::Regenerated,
        })
    }
}
