//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_properties(properties::COMPLETE)
//!         .with_config(configs::WEB);
//!     fixture.command().arg("describe").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::properties;
    pub use super::TestFixture;
}

/// `conventions.properties` contents.
#[allow(dead_code)]
pub mod properties {
    /// Every required key.
    pub const COMPLETE: &str = "\
# Shared version constants
javaVersion=17
coreVersion=2.4.1
frameworkVersion=3.2.5
dependencyManagementVersion=1.1.4
googleJavaFormatVersion=1.22.0
ktlintVersion=1.2.1
jacocoVersion=0.8.12
junitVersion=5.10.2
mockitoVersion=5.11.0
";

    /// `COMPLETE` with the `key` line removed.
    pub fn without(key: &str) -> String {
        COMPLETE
            .lines()
            .filter(|line| !line.starts_with(&format!("{}=", key)))
            .map(|line| format!("{}\n", line))
            .collect()
    }
}

/// `.conventions.yaml` snippets.
#[allow(dead_code)]
pub mod configs {
    /// Servlet web project.
    pub const WEB: &str = r#"
name: orders
group: com.acme
version: 1.0.0
units: [frameworkWeb]
"#;

    /// Enforced formatting backed by a shell formatter that flags and strips
    /// trailing whitespace.
    pub const STRICT_FORMATTING: &str = r#"
name: orders
group: com.acme
version: 1.0.0
units: [strictFormatting]
tools:
  google-java-format:
    command: sh
    check: ["-c", "! grep -l ' $' \"$@\"", "google-java-format"]
    apply: ["-c", "for f in \"$@\"; do sed 's/ *$//' \"$f\" > \"$f.tmp\" && mv \"$f.tmp\" \"$f\"; done", "google-java-format"]
"#;

    /// Same formatter, but the rules stay advisory.
    pub const ADVISORY_FORMATTING: &str = r#"
name: orders
units: [qualityFormatting]
tools:
  google-java-format:
    command: sh
    check: ["-c", "! grep -l ' $' \"$@\"", "google-java-format"]
"#;

    /// A unit name nobody registered.
    pub const TYPO: &str = r#"
name: orders
units: [frameworkWbe]
"#;

    /// Two mutually exclusive server stacks.
    pub const BOTH_STACKS: &str = r#"
name: orders
units: [frameworkWeb, frameworkReactive]
"#;

    /// Root project plus a reactive module.
    pub const WITH_MODULE: &str = r#"
name: orders
group: com.acme
version: 1.0.0
units: [frameworkWeb]
modules:
  orders-stream:
    units: [frameworkReactive]
"#;
}

/// Java source with a trailing space on one line.
#[allow(dead_code)]
pub const UNFORMATTED_JAVA: &str = "class Dirty { \n}\n";

/// Java source with no trailing whitespace.
#[allow(dead_code)]
pub const FORMATTED_JAVA: &str = "class Clean {\n}\n";

/// A test fixture that provides a temporary project directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `conventions.properties`.
    pub fn with_properties(self, content: &str) -> Self {
        self.with_file("conventions.properties", content)
    }

    /// Write `.conventions.yaml`.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".conventions.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Read a file of the project.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// A `conventions` command running in the fixture directory, without
    /// colors and with the local repository inside the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("conventions");
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env("CONVENTIONS_LOCAL_REPO", self.path().join("local-repo"))
            .env_remove("CONVENTIONS_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
