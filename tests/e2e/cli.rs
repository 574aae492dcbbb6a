//! Fatal startup errors surfaced by the `relearn` binary

use std::process::Command;
use tempfile::TempDir;

use super::helpers::*;

fn relearn() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relearn"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_run_rejects_missing_project_dir() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let output = relearn()
        .args(["run", "Fix the bug", "-d"])
        .arg(&missing)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("project directory does not exist"), "{stderr}");
}

#[test]
fn test_run_rejects_non_repository() {
    let dir = TempDir::new().unwrap();

    let output = relearn()
        .args(["run", "Fix the bug", "-d"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a git repository"), "{stderr}");
    assert!(stderr.contains("git init"), "{stderr}");
}

#[test]
fn test_run_rejects_repository_without_commits() {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init"]).unwrap();
    std::fs::write(dir.path().join("calculator.py"), INITIAL_CALCULATOR).unwrap();

    let output = relearn()
        .args(["run", "Fix the bug", "-d"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has no commits yet"), "{stderr}");
    assert!(log_subjects(dir.path()).is_empty());
}

#[test]
fn test_webhook_mode_without_url_is_fatal() {
    let repo = calculator_repo();
    let dir = TempDir::new().unwrap();
    let knowledge = dir.path().join("CLAUDE.md");

    let output = relearn()
        .args(["run", "Fix the bug", "-t", "webhook", "--knowledge-file"])
        .arg(&knowledge)
        .arg("-d")
        .arg(repo.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no analysis backend available"), "{stderr}");
    assert!(!knowledge.exists());
}

#[test]
fn test_report_failure_without_backend_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(
        &config,
        "teacher:\n  mode: local\n  api_key_env: RELEARN_E2E_UNSET_KEY\n",
    )
    .unwrap();

    let output = relearn()
        .args([
            "report-failure",
            "-f",
            "integration_error",
            "-D",
            "created duplicate workflow",
            "-C",
            "should have checked existing infra",
            "-T",
            "deploy workflow",
            "-c",
        ])
        .arg(&config)
        .arg("--knowledge-file")
        .arg(dir.path().join("CLAUDE.md"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RELEARN_E2E_UNSET_KEY"), "{stderr}");
}

#[test]
fn test_unknown_failure_type_is_rejected() {
    let output = relearn()
        .args([
            "report-failure", "-f", "bogus", "-D", "d", "-C", "c", "-T", "t",
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown failure kind"), "{stderr}");
}
