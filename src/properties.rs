//! Property source loading
//!
//! The property source is a flat `key=value` file at a fixed, project-relative
//! location (`conventions.properties`). It is the single place where tool and
//! library versions are declared; the version registry turns it into typed
//! constants.
//!
//! The file uses the `.properties` conventions shared with INI files: `#` and
//! `;` start comments, whitespace around `=` is ignored. Section headers are
//! rejected because the mapping is flat.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ini::Ini;

use crate::defaults::PROPERTY_SOURCE_FILE;
use crate::error::{Error, Result};

/// Flat key/value mapping, sorted by key so iteration is deterministic.
pub type PropertyMap = BTreeMap<String, String>;

/// An immutable, loaded property source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    path: PathBuf,
    properties: PropertyMap,
}

impl PropertySource {
    /// Load the canonical property source of a project directory.
    pub fn for_project(project_dir: &Path) -> Result<Self> {
        Self::load(&project_dir.join(PROPERTY_SOURCE_FILE))
    }

    /// Load a property source from `path`.
    ///
    /// Fails with [`Error::SourceNotFound`] when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::SourceNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let properties = parse(&content).map_err(|message| Error::PropertySyntax {
            path: path.to_path_buf(),
            message,
        })?;

        log::debug!(
            "Loaded {} properties from {}",
            properties.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            properties,
        })
    }

    /// Build a property source from an in-memory mapping.
    pub fn from_map(path: impl Into<PathBuf>, properties: PropertyMap) -> Self {
        Self {
            path: path.into(),
            properties,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Parse `.properties` content into a sorted mapping.
///
/// Later duplicates of a key override earlier ones.
fn parse(content: &str) -> std::result::Result<PropertyMap, String> {
    let ini = Ini::load_from_str(content).map_err(|e| e.to_string())?;

    let mut properties = PropertyMap::new();
    for (section, props) in ini.iter() {
        match section {
            None => {
                for (key, value) in props.iter() {
                    properties.insert(key.to_string(), value.to_string());
                }
            }
            Some(name) => {
                return Err(format!(
                    "section [{}] is not supported; properties must be a flat key=value list",
                    name
                ))
            }
        }
    }

    Ok(properties)
}
