// Integration tests for the casematrix binary: exit codes and the --json
// stdout contract.
//
// Run with: cargo test -p casematrix-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const HEADER: &str = "ID,Title,Case ID,Comment,Plan,Status,Tested By\n";

fn casematrix() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_casematrix"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value.
fn single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

fn two_runs(dir: &Path) -> (String, String) {
    let x = write(
        dir,
        "nightly.csv",
        &format!("{HEADER}R1,Login,T1,,Smoke,Passed,ana\nR2,Logout,T2,minor typo,Smoke,Failed,bo\n"),
    );
    let y = write(
        dir,
        "rc1.csv",
        &format!("{HEADER}R3,Login,T1,,,Passed,\nR4,Logout,T2,,,Passed,\n"),
    );
    (x, y)
}

// ===========================================================================
// compare
// ===========================================================================

#[test]
fn compare_json_uses_file_stems_as_labels() {
    let dir = tempdir().unwrap();
    let (x, y) = two_runs(dir.path());

    let output = casematrix().args(["compare", &x, &y, "--json"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = single_json(&output);
    assert!(val["generated_at"].is_string());
    assert_eq!(val["report"]["meta"]["datasets"], serde_json::json!(["nightly", "rc1"]));
    assert_eq!(val["report"]["complete"], true);

    let names: Vec<&str> = val["report"]["comparisons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["nightly_only", "rc1_only", "all_files", "nightly_only"]);

    assert!(stderr(&output).contains("compared 2 datasets"));
}

#[test]
fn compare_writes_xlsx_with_explicit_labels() {
    let dir = tempdir().unwrap();
    let (x, y) = two_runs(dir.path());
    let out = dir.path().join("cmp.xlsx");

    let output = casematrix()
        .args(["compare", &x, &y, "--label", "X", "--label", "Y", "--xlsx"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.exists());
    assert!(stderr(&output).contains("cmp.xlsx"));
    assert!(output.stdout.is_empty());
}

#[test]
fn label_count_mismatch_is_usage_error() {
    let dir = tempdir().unwrap();
    let (x, y) = two_runs(dir.path());

    let output = casematrix().args(["compare", &x, &y, "--label", "only"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("1 label(s) for 2 file(s)"));
}

#[test]
fn single_file_is_schema_error() {
    let dir = tempdir().unwrap();
    let (x, _) = two_runs(dir.path());

    let output = casematrix().args(["compare", &x]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("at least two datasets required"));
}

#[test]
fn missing_status_column_is_schema_error() {
    let dir = tempdir().unwrap();
    let (x, _) = two_runs(dir.path());
    let bad = write(dir.path(), "bad.csv", "Case ID,Title\nT1,Login\n");

    let output = casematrix().args(["compare", &x, &bad]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("dataset 'bad'"), "stderr: {err}");
    assert!(err.contains("'Status'"), "stderr: {err}");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let (x, _) = two_runs(dir.path());

    let output = casematrix().args(["compare", &x, "/nonexistent/run.csv"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn invalid_minor_regex_is_config_error() {
    let dir = tempdir().unwrap();
    let (x, y) = two_runs(dir.path());

    let output = casematrix()
        .args(["compare", &x, &y, "--minor-regex", "(unclosed"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn zero_deadline_writes_partial_json_and_exits_incomplete() {
    let dir = tempdir().unwrap();
    let (x, y) = two_runs(dir.path());

    let output = casematrix()
        .args(["compare", &x, &y, "--deadline-ms", "0", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    let val = single_json(&output);
    assert_eq!(val["report"]["complete"], false);
    assert_eq!(val["report"]["cancelled"], "deadline");
    assert!(stderr(&output).contains("comparison incomplete"));
}

// ===========================================================================
// run / validate
// ===========================================================================

const CONFIG: &str = r#"
name = "Release check"

[[datasets]]
label = "nightly"
file = "nightly.csv"

[[datasets]]
label = "rc1"
file = "rc1.csv"

[output]
json = "result.json"
"#;

#[test]
fn run_resolves_files_relative_to_config() {
    let dir = tempdir().unwrap();
    two_runs(dir.path());
    let config = write(dir.path(), "release.compare.toml", CONFIG);

    let output = casematrix().args(["run", &config]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written = fs::read_to_string(dir.path().join("result.json")).unwrap();
    let val: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(val["name"], "Release check");
    assert_eq!(val["report"]["summary"]["datasets"][0]["failed"], 1);
    assert_eq!(val["report"]["summary"]["datasets"][1]["passed"], 2);
}

#[test]
fn validate_accepts_good_config() {
    let dir = tempdir().unwrap();
    let config = write(dir.path(), "ok.compare.toml", CONFIG);

    let output = casematrix().args(["validate", &config]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Release check: ok (2 datasets"));
}

#[test]
fn validate_rejects_single_dataset() {
    let dir = tempdir().unwrap();
    let config = write(
        dir.path(),
        "bad.compare.toml",
        "name = \"Solo\"\n\n[[datasets]]\nlabel = \"a\"\nfile = \"a.csv\"\n",
    );

    let output = casematrix().args(["validate", &config]).output().unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("at least two datasets required"));
}
