//! Built-in convention units.
//!
//! Each unit is a declarative record: a name, its prerequisites, and an apply
//! step that writes toolchain settings, dependency declarations, quality rules
//! or resolution policy into the descriptor. Ordering is expressed only
//! through prerequisites; the registration order below just breaks ties.
//!
//! | Unit | Prerequisites | Effect |
//! |---|---|---|
//! | `base` | | toolchain version, core platform |
//! | `qualityFormatting` | `base` | Java and Kotlin formatting rules |
//! | `qualityCoverage` | `base` | coverage rule |
//! | `strictFormatting` | `qualityFormatting` | formatting rules become gates |
//! | `testSupport` | `base` | test dependencies, logging exclusions |
//! | `frameworkCore` | `base`, `testSupport` | framework runtime, strict resolution |
//! | `frameworkWeb` | `frameworkCore` | servlet stack (excludes `frameworkReactive`) |
//! | `frameworkReactive` | `frameworkCore` | reactive stack (excludes `frameworkWeb`) |

pub mod base;
pub mod framework;
pub mod quality;
pub mod testing;

use crate::error::Result;
use crate::registry::UnitRegistry;

pub const BASE: &str = "base";
pub const QUALITY_FORMATTING: &str = "qualityFormatting";
pub const QUALITY_COVERAGE: &str = "qualityCoverage";
pub const STRICT_FORMATTING: &str = "strictFormatting";
pub const TEST_SUPPORT: &str = "testSupport";
pub const FRAMEWORK_CORE: &str = "frameworkCore";
pub const FRAMEWORK_WEB: &str = "frameworkWeb";
pub const FRAMEWORK_REACTIVE: &str = "frameworkReactive";

/// Build a registry holding every built-in unit.
pub fn builtin_registry() -> Result<UnitRegistry> {
    let mut registry = UnitRegistry::new();
    registry.register(base::base())?;
    registry.register(quality::formatting())?;
    registry.register(quality::coverage())?;
    registry.register(quality::strict_formatting())?;
    registry.register(testing::test_support())?;
    registry.register(framework::core())?;
    registry.register(framework::web())?;
    registry.register(framework::reactive())?;
    Ok(registry)
}
