//! End-to-end tests for the `formstore` binary.
//!
//! stdout is a pipe under `assert_cmd`, so every command answers in JSON.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn formstore(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("formstore").unwrap();
    cmd.env_remove("FORMSTORE_TEST_DB")
        .env_remove("RUST_LOG")
        .env("FORMSTORE_ACTOR", "cli-test")
        .arg("--db")
        .arg(db);
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn init_db(temp_dir: &TempDir) -> std::path::PathBuf {
    let db = temp_dir.path().join("formstore.db");
    formstore(&db).arg("init").assert().success();
    db
}

#[test]
fn test_commands_require_init() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("missing.db");

    let output = formstore(&db)
        .args(["list", "survey"])
        .assert()
        .code(2)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn test_init_twice_fails_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    formstore(&db).arg("init").assert().code(2);
    formstore(&db).args(["init", "--force"]).assert().success();
}

#[test]
fn test_submit_then_list_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    formstore(&db)
        .args(["submit", "survey", "--text", "name=Alice", "--at", "2024-05-01T12:00:00Z"])
        .assert()
        .success();
    formstore(&db)
        .args([
            "submit",
            "survey",
            "--choice",
            "color=red,blue",
            "--at",
            "2024-05-02T12:00:00Z",
        ])
        .assert()
        .success();
    formstore(&db)
        .args(["submit", "other", "--text", "q=x"])
        .assert()
        .success();

    let listed = stdout_json(formstore(&db).args(["list", "survey"]));
    assert_eq!(listed["count"], 2);

    let results = listed["form_results"].as_array().unwrap();
    assert_eq!(results[0]["create_time"], "2024-05-02T12:00:00Z");
    assert_eq!(results[0]["element_results"][0]["elem_key"], "color");
    assert_eq!(
        results[0]["element_results"][0]["choice"],
        serde_json::json!(["blue", "red"])
    );
    assert_eq!(results[1]["element_results"][0]["text"], "Alice");
}

#[test]
fn test_empty_choice_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    let output = formstore(&db)
        .args(["submit", "survey", "--choice", "color="])
        .assert()
        .code(4)
        .get_output()
        .stderr
        .clone();
    let err: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(err["error"]["code"], "EMPTY_OPTION_SET");

    let listed = stdout_json(formstore(&db).args(["list", "survey"]));
    assert_eq!(listed["count"], 0);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    let preview = stdout_json(
        formstore(&db).args(["submit", "survey", "--text", "q=x", "--dry-run"]),
    );
    assert_eq!(preview["dry_run"], true);

    let listed = stdout_json(formstore(&db).args(["list", "survey"]));
    assert_eq!(listed["count"], 0);
}

#[test]
fn test_export_then_import_into_new_db() {
    let temp_dir = TempDir::new().unwrap();
    let source = init_db(&temp_dir);
    let export_file = temp_dir.path().join("survey.jsonl");

    formstore(&source)
        .args(["submit", "survey", "--text", "name=Alice", "--choice", "color=red"])
        .assert()
        .success();
    formstore(&source)
        .args(["export", "survey", "-o"])
        .arg(&export_file)
        .assert()
        .success();

    let target = temp_dir.path().join("target.db");
    formstore(&target).arg("init").assert().success();

    let first = stdout_json(formstore(&target).arg("import").arg(&export_file));
    assert_eq!(first["stats"]["created"], 1);

    let second = stdout_json(formstore(&target).arg("import").arg(&export_file));
    assert_eq!(second["stats"]["created"], 0);
    assert_eq!(second["stats"]["skipped"], 1);

    let listed = stdout_json(formstore(&target).args(["list", "survey"]));
    assert_eq!(listed["count"], 1);
}

#[test]
fn test_csv_output() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    formstore(&db)
        .args(["submit", "survey", "--text", "note=a,b"])
        .assert()
        .success();

    let output = formstore(&db)
        .args(["list", "survey", "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("form_result_id,create_time,elem_key,kind,value"));
    assert!(lines.next().unwrap().ends_with(",note,text,\"a,b\""));
}

#[test]
fn test_csv_keeps_result_without_answers() {
    let temp_dir = TempDir::new().unwrap();
    let db = init_db(&temp_dir);

    formstore(&db)
        .args(["submit", "survey", "--at", "2024-05-01T12:00:00Z"])
        .assert()
        .success();

    let output = formstore(&db)
        .args(["list", "survey", "--format", "csv"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",2024-05-01T12:00:00+00:00,,,"));
}
