//! End-to-end tests for `build`, `test`, `clean` and `publish-local`.

mod common;
use common::prelude::*;

#[test]
fn test_build_assembles_descriptor() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(configs::WEB);

    fixture
        .command()
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] dependency-check"))
        .stdout(predicate::str::contains("[OK] build"))
        .stdout(predicate::str::contains("Wrote"));

    let descriptor: serde_json::Value =
        serde_json::from_str(&fixture.read("build/conventions/orders.json")).unwrap();
    assert_eq!(descriptor["applied_units"][0], "base");
    fixture
        .child(".conventions/versions.generated.toml")
        .assert(predicate::path::exists());
}

#[test]
fn test_build_fails_on_version_conflict() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(
            r#"
name: orders
units: [frameworkWeb]
dependencies:
  - scope: implementation
    coordinate: com.acme:json
    version: "1.0"
  - scope: testImplementation
    coordinate: com.acme:json
    version: "1.1"
"#,
        );

    fixture
        .command()
        .arg("build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "com.acme:json [DependencyConflict] requested versions 1.0, 1.1",
        ))
        .stderr(predicate::str::contains("Task 'dependency-check' failed"));
}

#[test]
fn test_clean_removes_build_dir() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(configs::WEB);

    fixture.command().arg("build").assert().success();
    fixture.child("build").assert(predicate::path::exists());

    fixture.command().arg("clean").assert().success();
    fixture.child("build").assert(predicate::path::missing());
}

#[test]
fn test_publish_local_uses_repository_from_environment() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(configs::WEB);

    fixture
        .command()
        .arg("publish-local")
        .assert()
        .success()
        .stdout(predicate::str::contains("Published"));

    fixture
        .child("local-repo/com.acme/orders/1.0.0/orders-1.0.0.json")
        .assert(predicate::str::contains("\"frameworkWeb\""));
}

#[test]
fn test_publish_local_repository_flag() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(configs::WEB);

    fixture
        .command()
        .args(["publish-local", "--repository", "elsewhere"])
        .assert()
        .success();

    fixture
        .child("elsewhere/com.acme/orders/1.0.0/orders-1.0.0.json")
        .assert(predicate::path::exists());
}

#[test]
fn test_publish_local_requires_coordinates() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config("name: orders\nunits: [base]\n");

    fixture
        .command()
        .arg("publish-local")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no group or version"));
}

#[cfg(unix)]
#[test]
fn test_test_task_runs_configured_tool() {
    let fixture = TestFixture::new()
        .with_properties(properties::COMPLETE)
        .with_config(
            r#"
name: orders
units: [testSupport]
tools:
  test:
    command: sh
    report: ["-c", "echo '2 tests failed'; exit 1"]
"#,
        );

    fixture
        .command()
        .arg("test")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] test (1 violation(s))"))
        .stdout(predicate::str::contains("2 tests failed"));
}
