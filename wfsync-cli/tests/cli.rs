use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn workflow_sync() -> Command {
    let mut cmd = Command::cargo_bin("workflow-sync").unwrap();
    cmd.env_remove("BASE_URL")
        .env_remove("BASE_KEY")
        .env_remove("BASE_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help() {
    workflow_sync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--scenario"));
}

#[test]
fn test_dry_run_writes_prefixed_report() {
    let project = tempdir().unwrap();
    let root = project.path();
    write(
        &root.join("_bmad/bmm/workflows/bmad-quick-flow/quick-spec/workflow.md"),
        "---\nname: quick-spec\n---\nbody",
    );
    write(&root.join("stories/quick-flow/1-1-0-quick-spec.md"), "Spec");

    workflow_sync()
        .arg("--dry-run")
        .arg("--project-root")
        .arg(root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved to:"));

    let reports: Vec<_> = fs::read_dir(root.join("_bmad-output/planning-artifacts"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("[DRY-RUN]-workflow-sync-report-"));

    let content = fs::read_to_string(
        root.join("_bmad-output/planning-artifacts").join(&reports[0]),
    )
    .unwrap();
    assert!(content.contains("total_actions: 0"));
    assert!(content.contains("## Scenario: workflow-complet"));
    assert!(content.contains("## Scenario: quick-flow"));
}

#[test]
fn test_unknown_scenario_fails() {
    let project = tempdir().unwrap();
    workflow_sync()
        .args(["--dry-run", "--scenario", "nope", "--project-root"])
        .arg(project.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown scenario: nope"));
}

#[test]
fn test_missing_env_file_fails() {
    let project = tempdir().unwrap();
    workflow_sync()
        .arg("--project-root")
        .arg(project.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(".env"));
    assert!(!project.path().join("_bmad-output").exists());
}

#[test]
fn test_invalid_settings_file_fails() {
    let project = tempdir().unwrap();
    write(&project.path().join("workflow-sync.toml"), "max_attempts = 0\n");
    workflow_sync()
        .args(["--dry-run", "--project-root"])
        .arg(project.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max_attempts"));
}
