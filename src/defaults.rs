//! Default values and canonical locations for conventions.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Canonical, project-relative location of the property source.
pub const PROPERTY_SOURCE_FILE: &str = "conventions.properties";

/// Default project configuration file name.
pub const CONFIG_FILE: &str = ".conventions.yaml";

/// Project-relative location of the generated versions artifact.
pub const GENERATED_VERSIONS_FILE: &str = ".conventions/versions.generated.toml";

/// Default build output directory, relative to the project directory.
pub const BUILD_DIR: &str = "build";

/// Returns the default local repository used by `publish-local`.
///
/// Uses `~/.conventions/repository`. Falls back to `.conventions/repository`
/// in the current directory if the home directory cannot be determined.
///
/// This can be overridden by the `--repository` CLI flag or the
/// `CONVENTIONS_LOCAL_REPO` environment variable.
pub fn default_local_repository() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".conventions").join("repository"))
        .unwrap_or_else(|| PathBuf::from(".conventions").join("repository"))
}

/// Source roots per language when the configuration names none.
pub fn default_sources() -> BTreeMap<String, Vec<PathBuf>> {
    let mut sources = BTreeMap::new();
    for language in ["java", "kotlin"] {
        sources.insert(
            language.to_string(),
            vec![
                PathBuf::from("src/main").join(language),
                PathBuf::from("src/test").join(language),
            ],
        );
    }
    sources
}
