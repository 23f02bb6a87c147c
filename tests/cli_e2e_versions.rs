//! End-to-end tests for the `check-versions` command.

mod common;
use common::prelude::*;

#[test]
fn test_check_versions_regenerates_once() {
    let fixture = TestFixture::new().with_properties(properties::COMPLETE);

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] conventions.properties is valid"))
        .stdout(predicate::str::contains("Regenerated .conventions/versions.generated.toml"))
        .stdout(predicate::str::contains("javaVersion = 17"));

    fixture
        .child(".conventions/versions.generated.toml")
        .assert(predicate::str::contains("coreVersion"));

    fixture
        .command()
        .args(["check-versions", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is up to date"))
        .stdout(predicate::str::contains("javaVersion").not());
}

#[test]
fn test_check_versions_after_property_change() {
    let fixture = TestFixture::new().with_properties(properties::COMPLETE);
    fixture.command().arg("check-versions").assert().success();

    fixture
        .child("conventions.properties")
        .write_str(&properties::COMPLETE.replace("junitVersion=5.10.2", "junitVersion=5.11.0"))
        .unwrap();

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .success()
        .stdout(predicate::str::contains("Regenerated"));
    fixture
        .child(".conventions/versions.generated.toml")
        .assert(predicate::str::contains("5.11.0"));
}

#[test]
fn test_missing_core_version() {
    let fixture = TestFixture::new()
        .with_properties(&properties::without("coreVersion"));

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing version property 'coreVersion'"))
        .stderr(predicate::str::contains("hint: Add 'coreVersion=<version>'"));

    fixture
        .child(".conventions/versions.generated.toml")
        .assert(predicate::path::missing());
}

#[test]
fn test_blank_core_version_is_missing() {
    let blank = properties::without("coreVersion") + "coreVersion=   \n";
    let fixture = TestFixture::new().with_properties(&blank);

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing version property 'coreVersion'"));
}

#[test]
fn test_non_numeric_java_version() {
    let fixture = TestFixture::new()
        .with_properties(&properties::COMPLETE.replace("javaVersion=17", "javaVersion=seventeen"));

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("javaVersion"))
        .stderr(predicate::str::contains("seventeen"));
}

#[test]
fn test_missing_property_source() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("check-versions")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Property source not found"));
}

#[test]
fn test_project_dir_flag() {
    let fixture = TestFixture::new()
        .with_file("service/conventions.properties", properties::COMPLETE);

    fixture
        .command()
        .args(["check-versions", "-C", "service"])
        .assert()
        .success();
    fixture
        .child("service/.conventions/versions.generated.toml")
        .assert(predicate::path::exists());
}
