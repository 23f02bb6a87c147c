//! Quality units: formatting, coverage, and strict formatting.
//!
//! The formatting and coverage units only describe the rules. Whether a rule
//! fails the build is decided by its `enforced` flag, which `strictFormatting`
//! turns on for every formatting rule.

use crate::descriptor::{QualityRule, RuleKind};
use crate::registry::ConventionUnit;

use super::{BASE, QUALITY_COVERAGE, QUALITY_FORMATTING, STRICT_FORMATTING};

pub const JAVA_FORMAT: &str = "java-format";
pub const KOTLIN_FORMAT: &str = "kotlin-format";
pub const COVERAGE: &str = "coverage";

pub fn formatting() -> ConventionUnit {
    ConventionUnit::new(QUALITY_FORMATTING, |project, versions| {
        project.set_quality_rule(
            JAVA_FORMAT,
            QualityRule::new(
                RuleKind::Format,
                "google-java-format",
                &versions.google_java_format_version,
            )
            .for_language("java", &["java"])
            .with_option("style", "GOOGLE")
            .with_option("reflow-long-strings", "true"),
        );
        project.set_quality_rule(
            KOTLIN_FORMAT,
            QualityRule::new(RuleKind::Format, "ktlint", &versions.ktlint_version)
                .for_language("kotlin", &["kt", "kts"])
                .with_option("android", "false")
                .with_option("max-line-length", "120"),
        );
        Ok(())
    })
    .requires(&[BASE])
}

pub fn coverage() -> ConventionUnit {
    ConventionUnit::new(QUALITY_COVERAGE, |project, versions| {
        project.set_quality_rule(
            COVERAGE,
            QualityRule::new(RuleKind::Coverage, "jacoco", &versions.jacoco_version)
                .with_option("minimum-line-ratio", "0.80")
                .with_option("reports", "xml,html"),
        );
        Ok(())
    })
    .requires(&[BASE])
}

pub fn strict_formatting() -> ConventionUnit {
    ConventionUnit::new(STRICT_FORMATTING, |project, _| {
        let enforced = project.enforce_rules(RuleKind::Format);
        log::debug!("Enforcing {} formatting rule(s)", enforced);
        Ok(())
    })
    .requires(&[QUALITY_FORMATTING])
}
