//! The `testSupport` unit.

use crate::descriptor::Scope;
use crate::registry::ConventionUnit;

use super::{BASE, TEST_SUPPORT};

/// Logging bindings that must not leak onto the test classpath.
pub const LOGGING_EXCLUSIONS: [&str; 2] = [
    "commons-logging:commons-logging",
    "org.slf4j:slf4j-simple",
];

pub fn test_support() -> ConventionUnit {
    ConventionUnit::new(TEST_SUPPORT, |project, versions| {
        project.add_dependency(
            Scope::TestImplementation,
            "org.junit.jupiter:junit-jupiter",
            Some(&versions.junit_version),
        );
        project.add_dependency(
            Scope::TestImplementation,
            "org.mockito:mockito-core",
            Some(&versions.mockito_version),
        );
        project.add_dependency(
            Scope::TestImplementation,
            "org.mockito:mockito-junit-jupiter",
            Some(&versions.mockito_version),
        );
        project.add_dependency(
            Scope::TestRuntimeOnly,
            "org.junit.platform:junit-platform-launcher",
            None,
        );
        for coordinate in LOGGING_EXCLUSIONS {
            project.exclude(coordinate);
        }
        Ok(())
    })
    .requires(&[BASE])
}
