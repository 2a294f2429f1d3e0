//! # CLI Integration Tests / CLI 集成测试
//!
//! Runs the `build-matrix` binary against a scratch project whose
//! `BuildMatrix.toml` points at fake `cmake` / `ctest` scripts.
//!
//! 针对一个临时项目运行 `build-matrix` 二进制文件，
//! 该项目的 `BuildMatrix.toml` 指向假的 `cmake` / `ctest` 脚本。
#![cfg(unix)]

mod common;

use assert_cmd::prelude::*;
use build_matrix::config::MatrixConfig;
use common::{fail, fake_project};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn build_matrix(project: &common::FakeProject) -> Command {
    let mut cmd = Command::cargo_bin("build-matrix").unwrap();
    cmd.arg("--lang")
        .arg("en")
        .arg("--project-root")
        .arg(project.root());
    cmd
}

/// Three toolchains, every step succeeds: exit code 0 and three passed rows.
#[test]
fn test_all_toolchains_pass() {
    let project = fake_project(&[]);
    project.write_matrix("");

    build_matrix(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("ALL TOOLCHAINS PASSED"))
        .stdout(predicate::str::contains("Tests Passed").count(3));

    assert_eq!(project.calls().len(), 9);
}

/// One configure step fails: non-zero exit, that toolchain is reported as
/// a configure failure and the other two still pass.
#[test]
fn test_one_configure_failure_fails_the_run() {
    let project = fake_project(&[fail("configure", "build-clang")]);
    project.write_matrix("");

    build_matrix(&project)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configure Failed"))
        .stdout(predicate::str::contains("Tests Passed").count(2))
        .stdout(predicate::str::contains("FAILURE DETAILS"))
        .stdout(predicate::str::contains("simulated configure failure for build-clang"))
        .stderr(predicate::str::contains("1 toolchain(s) did not pass"));

    assert!(!project.called("build build-clang"));
    assert!(project.called("test build-gcc"));
    assert!(project.called("test build-msvc"));
}

/// Stale `build*` directories are removed before the run; other entries stay.
#[test]
fn test_stale_build_dirs_are_cleaned() {
    let project = fake_project(&[]);
    project.write_matrix("");
    fs::create_dir_all(project.root().join("build-foo")).unwrap();
    fs::create_dir_all(project.root().join("build-bar")).unwrap();
    fs::create_dir_all(project.root().join("src")).unwrap();

    build_matrix(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed stale build directory"));

    assert!(!project.root().join("build-foo").exists());
    assert!(!project.root().join("build-bar").exists());
    assert!(project.root().join("src").is_dir());
    assert!(project.root().join("test").is_dir());
    // Working directories stay behind for inspection.
    assert!(project.root().join("build-gcc").is_dir());
    assert!(project.root().join("build-clang").is_dir());
    assert!(project.root().join("build-msvc").is_dir());
}

#[test]
fn test_only_restricts_toolchains() {
    let project = fake_project(&[fail("configure", "build-clang")]);
    project.write_matrix("");

    build_matrix(&project)
        .arg("--only")
        .arg("gcc")
        .arg("--only")
        .arg("msvc")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Skipping 1 toolchain(s) not selected with --only, running 2",
        ));

    assert!(!project.called("configure build-clang"));
    assert!(project.called("test build-gcc"));
    assert!(project.called("test build-msvc"));
}

/// A stale directory that cannot be removed aborts the run before any
/// toolchain starts.
#[test]
fn test_cleanup_failure_aborts_the_run() {
    use std::os::unix::fs::PermissionsExt;

    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let project = fake_project(&[]);
    project.write_matrix("");
    let stale = project.root().join("build-locked");
    fs::create_dir_all(stale.join("sub")).unwrap();
    fs::set_permissions(&stale, fs::Permissions::from_mode(0o555)).unwrap();

    let assert = build_matrix(&project).assert();
    fs::set_permissions(&stale, fs::Permissions::from_mode(0o755)).unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("failed to remove stale build directory"))
        .stderr(predicate::str::contains("build-locked"));
    assert!(project.calls().is_empty());
    assert!(!project.root().join("build-gcc").exists());
}

#[test]
fn test_unknown_only_name_is_rejected() {
    let project = fake_project(&[]);
    project.write_matrix("");
    fs::create_dir_all(project.root().join("build-keep")).unwrap();

    build_matrix(&project)
        .arg("--only")
        .arg("icc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown toolchain(s): icc"));

    assert!(project.calls().is_empty());
    // Nothing is cleaned up when the arguments are invalid.
    assert!(project.root().join("build-keep").is_dir());
}

#[test]
fn test_stop_after_build_skips_tests() {
    let project = fake_project(&[fail("test", "build-gcc")]);
    project.write_matrix("");

    build_matrix(&project)
        .arg("--stop-after")
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built").count(3));

    assert!(!project.called("test build-gcc"));
}

#[test]
fn test_custom_toolchains_from_matrix_file() {
    let project = fake_project(&[]);
    project.write_matrix(
        r#"
[[toolchains]]
name = "gcc-13"
generator = "Ninja"
cxx_compiler = "g++-13"
"#,
    );

    build_matrix(&project).assert().success();

    assert_eq!(
        project.calls(),
        vec!["configure build-gcc-13", "build build-gcc-13", "test build-gcc-13"]
    );
}

#[test]
fn test_timeout_flag() {
    let project = fake_project(&[common::hang("build", "build-msvc")]);
    project.write_matrix("");

    build_matrix(&project)
        .arg("--timeout")
        .arg("1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Timeout"))
        .stdout(predicate::str::contains("Tests Passed").count(2));
}

#[test]
fn test_json_and_html_reports() {
    let project = fake_project(&[fail("test", "build-gcc")]);
    project.write_matrix("");
    let reports = tempdir().unwrap();
    let json_path = reports.path().join("report.json");
    let html_path = reports.path().join("report.html");

    build_matrix(&project)
        .arg("--json")
        .arg(&json_path)
        .arg("--html")
        .arg(&html_path)
        .assert()
        .failure();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["outcomes"].as_array().unwrap().len(), 3);

    let html = fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Tests Failed"));
}

#[test]
fn test_missing_source_dir() {
    let project = fake_project(&[]);
    project.write_matrix("source_dir = \"no-such-dir\"");

    build_matrix(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source directory not found"));

    assert!(project.calls().is_empty());
}

#[test]
fn test_invalid_matrix_file() {
    let project = fake_project(&[]);
    fs::write(
        project.root().join("BuildMatrix.toml"),
        "[[toolchains]\nname = \"broken\"\n",
    )
    .unwrap();

    build_matrix(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load matrix file"))
        .stderr(predicate::str::contains("Invalid matrix file"));

    assert!(project.calls().is_empty());
}

#[test]
fn test_init_non_interactive_writes_builtin_matrix() {
    let root = tempdir().unwrap();

    Command::cargo_bin("build-matrix")
        .unwrap()
        .arg("init")
        .arg("--lang")
        .arg("en")
        .arg("--non-interactive")
        .arg("--project-root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let content = fs::read_to_string(root.path().join("BuildMatrix.toml")).unwrap();
    let matrix = MatrixConfig::from_toml(&content).unwrap();
    let names: Vec<&str> = matrix.toolchains.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["gcc", "clang", "msvc"]);
}

#[test]
fn test_init_does_not_overwrite_without_force() {
    let root = tempdir().unwrap();
    let path = root.path().join("BuildMatrix.toml");
    fs::write(&path, "# mine\n").unwrap();

    Command::cargo_bin("build-matrix")
        .unwrap()
        .args(["init", "--lang", "en", "--non-interactive", "--project-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

    Command::cargo_bin("build-matrix")
        .unwrap()
        .args(["init", "--lang", "en", "--non-interactive", "--force", "--project-root"])
        .arg(root.path())
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("[[toolchains]]"));
}
