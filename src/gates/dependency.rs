//! Dependency-resolution gate.
//!
//! Evaluated once per resolved graph. Which checks run is decided by the
//! descriptor's [`ResolutionPolicy`]: a lenient policy passes every graph.

use std::sync::OnceLock;

use regex::Regex;

use crate::descriptor::ResolutionPolicy;
use crate::resolve::ResolvedGraph;

use super::Violation;

pub const DEPENDENCY_CONFLICT: &str = "DependencyConflict";
pub const DYNAMIC_VERSION_USED: &str = "DynamicVersionUsed";

fn dynamic_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // prefix (1.+), latest.release, ranges [1.0,2.0) and snapshots
        Regex::new(r"(\+$|^latest\.|^[\[\(]|[\]\)]$|-SNAPSHOT$)").expect("valid regex")
    })
}

/// Whether `version` asks the resolver to pick a version at build time.
pub fn is_dynamic(version: &str) -> bool {
    dynamic_version_pattern().is_match(version.trim())
}

/// Violations of `policy` in `graph`, in graph order.
pub fn check(policy: ResolutionPolicy, graph: &ResolvedGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    for dependency in graph.dependencies() {
        if policy.fail_on_version_conflict && dependency.is_conflicting() {
            violations.push(Violation::new(
                &dependency.coordinate,
                DEPENDENCY_CONFLICT,
                &format!("requested versions {}", dependency.requested.join(", ")),
            ));
        }

        if policy.fail_on_dynamic_version {
            for version in dependency.requested.iter().filter(|v| is_dynamic(v)) {
                violations.push(Violation::new(
                    &dependency.coordinate,
                    DYNAMIC_VERSION_USED,
                    &format!("dynamic version '{}'", version),
                ));
            }
        }
    }

    violations
}
