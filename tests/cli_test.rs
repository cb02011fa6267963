// tests/cli_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn git_release(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_git-release"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute git-release")
}

/// A git checkout with a changelog and an empty config, so no user config leaks in
fn setup_checkout(changelog: &str) -> TempDir {
    let dir = TempDir::new().expect("Could not create temp dir");
    git2::Repository::init(dir.path()).expect("Could not init repo");
    fs::write(dir.path().join("CHANGELOG.md"), changelog).unwrap();
    fs::write(dir.path().join("gitrelease.toml"), "").unwrap();
    dir
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("git-release"));
    assert!(stdout.contains("VERSION"));
    assert!(stdout.contains("suggest"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_version_exits_nonzero() {
    let dir = setup_checkout("# Changelog\n");
    let output = git_release(dir.path(), &["1.2"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid version '1.2'"), "got: {}", stderr);
}

#[test]
fn test_missing_entry_names_header() {
    let dir = setup_checkout("# Changelog\n\n## [1.0.0] - 2024-06-01\n- First\n");
    let output = git_release(dir.path(), &["9.9.9"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d");
    assert!(
        stderr.contains(&format!("## [9.9.9] - {}", today)),
        "got: {}",
        stderr
    );
    // nothing was written
    assert_eq!(
        fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap(),
        "# Changelog\n\n## [1.0.0] - 2024-06-01\n- First\n"
    );
}

#[test]
fn test_missing_changelog_exits_nonzero() {
    let dir = setup_checkout("");
    let output = git_release(dir.path(), &["1.0.0", "--changelog", "NOPE.md"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("NOPE.md"), "got: {}", stderr);
}

#[test]
fn test_no_arguments_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &[]);
    assert!(!output.status.success());
}
