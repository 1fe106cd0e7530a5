//! CLI tests for `recordcheck check`, `demo` and `init`.
//!
//! Spawns the binary and verifies exit codes and report output.

use std::process::{Command, Output};

use recordcheck::exit_codes;
use recordcheck::io::init::{InitOptions, init_project};
use recordcheck::test_support::write_file;
use serde_json::{Value, json};

fn recordcheck(dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_recordcheck"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run recordcheck")
}

#[test]
fn accepted_input_exits_ok_and_prints_record() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_project(temp.path(), &InitOptions::default()).expect("init");
    write_file(
        temp.path(),
        "ada.json",
        r#"{"name": "Ada Lovelace", "age": "36", "email": "ada@example.com"}"#,
    );

    let output = recordcheck(
        temp.path(),
        &[
            "check",
            "--schema",
            paths.example_schema_path.to_str().expect("utf-8 path"),
            "--input",
            "ada.json",
            "--format",
            "json",
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["valid"], json!(true));
    assert_eq!(
        report["record"],
        json!({
            "name": "Ada Lovelace",
            "age": 36,
            "email": "ada@example.com",
            "nickname": null,
            "is_active": true
        })
    );
}

#[test]
fn rejected_input_exits_with_rejected_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_file(
        temp.path(),
        "al.json",
        r#"{"name": "Al", "age": 150, "email": "bad", "phone": "555-123-4567", "score": 50}"#,
    );

    let output = recordcheck(
        temp.path(),
        &[
            "check",
            "--catalog",
            "user_profile",
            "--input",
            "al.json",
            "--format",
            "json",
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::REJECTED));
    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    let codes: Vec<(&str, &str)> = report["violations"]
        .as_array()
        .expect("violations")
        .iter()
        .map(|v| {
            (
                v["path"].as_str().expect("path"),
                v["code"].as_str().expect("code"),
            )
        })
        .collect();
    assert_eq!(codes, vec![("age", "range"), ("email", "pattern")]);
}

#[test]
fn text_report_is_the_config_default() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_file(
        temp.path(),
        "company.json",
        r#"{"name": "Tech Corp", "industry": "Software", "size": 0}"#,
    );

    let output = recordcheck(
        temp.path(),
        &["check", "--catalog", "company", "--input", "company.json"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::REJECTED));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Company: rejected (1 violation)"));
    assert!(stdout.contains("size [range] must be greater than or equal to 1 (got 0)"));
}

#[test]
fn malformed_schema_exits_with_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_file(
        temp.path(),
        "broken.json",
        r#"{"root": "A", "schemas": []}"#,
    );
    write_file(temp.path(), "input.json", "{}");

    let output = recordcheck(
        temp.path(),
        &["check", "--schema", "broken.json", "--input", "input.json"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::ERROR));
    assert!(String::from_utf8_lossy(&output.stderr).contains("load schema"));
}

#[test]
fn missing_schema_source_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = recordcheck(temp.path(), &["check"]);
    assert_eq!(output.status.code(), Some(exit_codes::ERROR));
}

#[test]
fn demo_lesson_runs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = recordcheck(temp.path(), &["demo", "config"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&output.stdout).contains("=== Schema Policies ==="));
}

#[test]
fn init_twice_requires_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    let first = recordcheck(temp.path(), &["init"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    let second = recordcheck(temp.path(), &["init"]);
    assert_eq!(second.status.code(), Some(exit_codes::ERROR));
    let forced = recordcheck(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn init_writes_the_global_config_path() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = recordcheck(temp.path(), &["--config", "custom.toml", "init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(temp.path().join("custom.toml").exists());
    assert!(!temp.path().join(".recordcheck.toml").exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("custom.toml"));

    let again = recordcheck(temp.path(), &["--config", "custom.toml", "init"]);
    assert_eq!(again.status.code(), Some(exit_codes::ERROR));
    assert!(String::from_utf8_lossy(&again.stderr).contains("custom.toml already exists"));
}
