//! The `base` unit: toolchain and core platform.

use crate::descriptor::Scope;
use crate::registry::ConventionUnit;

use super::BASE;

/// Coordinate of the shared core platform (BOM).
pub const CORE_PLATFORM: &str = "dev.conventions:core-bom";

pub fn base() -> ConventionUnit {
    ConventionUnit::new(BASE, |project, versions| {
        project.set_toolchain_version(versions.java_version)?;
        project.add_dependency(Scope::Platform, CORE_PLATFORM, Some(&versions.core_version));
        Ok(())
    })
}
