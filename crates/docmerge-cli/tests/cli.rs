use std::fs;
use std::path::Path;

use assert_cmd::Command;
use docmerge_test_support::greeting_template;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn docmerge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docmerge").expect("binary");
    cmd.current_dir(dir).args(["--store", "store"]);
    cmd
}

fn import_greeting(dir: &Path) -> String {
    let path = dir.join("greeting.json");
    fs::write(&path, serde_json::to_string(&greeting_template()).unwrap()).expect("write template");

    let output = docmerge(dir)
        .args(["import", "greeting.json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("stdout utf8").trim().to_string()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout json")
}

#[test]
fn get_prints_template_structure() {
    let temp = TempDir::new().expect("tempdir");
    let id = import_greeting(temp.path());

    let output = docmerge(temp.path())
        .args(["get", &id])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = stdout_json(&output);
    assert_eq!(response["status"], 200);
    assert_eq!(response["data"][0]["match"], json!(["{v8 name}"]));
    assert_eq!(response["data"][1]["type"], "TABLE");
}

#[test]
fn post_merges_from_inline_request() {
    let temp = TempDir::new().expect("tempdir");
    let id = import_greeting(temp.path());
    let request = json!({
        "type": "mergeDocFromTemplate",
        "templateDocId": id,
        "mergeParameters": [
            {"index": 0, "replacements": [{"type": "text", "searchPattern": "{v8 name}", "text": "Bob"}]}
        ]
    });

    let output = docmerge(temp.path())
        .args(["post", "--with-string", &request.to_string()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = stdout_json(&output);
    let new_id = response["data"].as_str().expect("new id");
    let stored = fs::read_to_string(temp.path().join("store").join(format!("{new_id}.json")))
        .expect("merged document");
    assert!(stored.contains("Hello Bob"));
}

#[test]
fn post_reads_request_from_stdin() {
    let temp = TempDir::new().expect("tempdir");
    let id = import_greeting(temp.path());
    let request = json!({"type": "createDocFromTemplate", "templateDocId": id, "title": "Copy"});

    docmerge(temp.path())
        .args(["post", "--with", "-"])
        .write_stdin(request.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":200"));
}

#[test]
fn failed_requests_exit_with_one() {
    let temp = TempDir::new().expect("tempdir");

    docmerge(temp.path())
        .args(["post", "--with-string", "not json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Bad JSON format"));

    docmerge(temp.path())
        .args(["get", "missing"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"status\":404"));
}

#[test]
fn import_files_document_into_folder() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("greeting.json"),
        serde_json::to_string(&greeting_template()).unwrap(),
    )
    .unwrap();

    let output = docmerge(temp.path())
        .args(["import", "greeting.json", "--folder", "team"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).unwrap().trim().to_string();

    assert!(temp
        .path()
        .join("store")
        .join("team")
        .join(format!("{id}.json"))
        .is_file());
}

#[test]
fn config_override_must_exist() {
    let temp = TempDir::new().expect("tempdir");

    docmerge(temp.path())
        .args(["--config", "missing.toml", "get", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn conflicting_payload_flags_are_usage_errors() {
    let temp = TempDir::new().expect("tempdir");

    docmerge(temp.path())
        .args(["post", "--with", "req.json", "--with-string", "{}"])
        .assert()
        .code(2);
}
