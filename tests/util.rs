//! Shared test utilities for integration tests
//!
//! Provides pom-tree fixture creation and fake build-tool scripts
//! used across multiple test files.

use assert_fs::prelude::*;

/// Maven pom namespace, required so parsing matches real descriptors.
pub const NS: &str = r#"xmlns="http://maven.apache.org/POM/4.0.0""#;

/// Write a pom.xml with the given body under `rel` inside the fixture.
pub fn write_pom(tmp: &assert_fs::TempDir, rel: &str, body: &str) {
    let file = if rel.is_empty() {
        "pom.xml".to_string()
    } else {
        format!("{rel}/pom.xml")
    };

    tmp.child(file)
        .write_str(&format!("<project {NS}>{body}</project>"))
        .expect("write pom");
}

/// Standard fixture: A (com.x:a), A/B (group inherited from parent, b),
/// plus a descriptor under target/ that discovery must never surface.
pub fn make_pom_tree() -> assert_fs::TempDir {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    write_pom(
        &tmp,
        "A",
        "<groupId>com.x</groupId><artifactId>a</artifactId>",
    );
    write_pom(
        &tmp,
        "A/B",
        "<parent><groupId>com.x</groupId></parent><artifactId>b</artifactId>",
    );
    write_pom(
        &tmp,
        "target",
        "<groupId>com.x</groupId><artifactId>ghost</artifactId>",
    );

    tmp
}

/// Write an executable stand-in for `mvn` with the given shell body.
/// The e2e tests that spawn it are unix-gated.
#[cfg(unix)]
pub fn fake_mvn_script(tmp: &assert_fs::TempDir, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = tmp.path().join("fake-mvn.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{body}")).expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    script
}

/// A fake `mvn` that prints one log line and then `classpath_line`.
#[cfg(unix)]
pub fn fake_mvn(tmp: &assert_fs::TempDir, classpath_line: &str) -> std::path::PathBuf {
    fake_mvn_script(
        tmp,
        &format!("echo '[INFO] Dependencies classpath:'\necho '{classpath_line}'\n"),
    )
}
