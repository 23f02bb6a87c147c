//! Framework units: the shared core and the two mutually exclusive server
//! stacks built on it.
//!
//! `frameworkWeb` and `frameworkReactive` both bind an embedded server, so
//! each declares the other as excluded and the engine refuses to apply both
//! to one project.

use crate::descriptor::Scope;
use crate::registry::ConventionUnit;

use super::{BASE, FRAMEWORK_CORE, FRAMEWORK_REACTIVE, FRAMEWORK_WEB, TEST_SUPPORT};

pub const FRAMEWORK_PLATFORM: &str = "org.springframework.boot:spring-boot-dependencies";

pub fn core() -> ConventionUnit {
    ConventionUnit::new(FRAMEWORK_CORE, |project, versions| {
        project.add_dependency(
            Scope::Platform,
            FRAMEWORK_PLATFORM,
            Some(&versions.framework_version),
        );
        project.add_dependency(
            Scope::Implementation,
            "org.springframework.boot:spring-boot-starter",
            None,
        );
        project.add_dependency(
            Scope::Implementation,
            "io.spring.gradle:dependency-management-plugin",
            Some(&versions.dependency_management_version),
        );
        project.add_dependency(
            Scope::AnnotationProcessor,
            "org.springframework.boot:spring-boot-configuration-processor",
            None,
        );

        let policy = project.resolution_policy_mut();
        policy.fail_on_version_conflict = true;
        policy.fail_on_dynamic_version = true;
        Ok(())
    })
    .requires(&[BASE, TEST_SUPPORT])
}

pub fn web() -> ConventionUnit {
    ConventionUnit::new(FRAMEWORK_WEB, |project, _| {
        project.add_dependency(
            Scope::Implementation,
            "org.springframework.boot:spring-boot-starter-web",
            None,
        );
        project.add_dependency(
            Scope::Implementation,
            "org.springframework.boot:spring-boot-starter-tomcat",
            None,
        );
        project.add_dependency(
            Scope::TestImplementation,
            "org.springframework.boot:spring-boot-starter-test",
            None,
        );
        Ok(())
    })
    .requires(&[FRAMEWORK_CORE])
    .excludes(&[FRAMEWORK_REACTIVE])
}

pub fn reactive() -> ConventionUnit {
    ConventionUnit::new(FRAMEWORK_REACTIVE, |project, _| {
        project.add_dependency(
            Scope::Implementation,
            "org.springframework.boot:spring-boot-starter-webflux",
            None,
        );
        project.add_dependency(
            Scope::Implementation,
            "org.springframework.boot:spring-boot-starter-reactor-netty",
            None,
        );
        project.add_dependency(
            Scope::TestImplementation,
            "io.projectreactor:reactor-test",
            None,
        );
        Ok(())
    })
    .requires(&[FRAMEWORK_CORE])
    .excludes(&[FRAMEWORK_WEB])
}
