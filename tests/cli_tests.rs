// Exercises the semcon-harness binary end to end.

#![cfg(unix)]

mod common;

use std::net::TcpListener;

use assert_cmd::Command;
use common::FixtureTree;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const GOLDEN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/golden");

fn harness() -> Command {
    let mut cmd = Command::cargo_bin("semcon-harness").unwrap();
    cmd.env_remove("SEMCONREPO")
        .env_remove("SEMCONCMD")
        .env_remove("OYDIDCMD");
    cmd
}

#[test]
fn run_passes_on_golden_fixtures() {
    harness()
        .args(["run", "--no-color", "--root", GOLDEN])
        .assert()
        .success()
        .stdout(contains("PASS: 01/uppercase"))
        .stdout(contains("passed 5"));
}

#[test]
fn run_fails_with_diff_on_mismatch() {
    let tree = FixtureTree::new();
    tree.triple("01", "upper", "hello\n", "tr a-z A-Z", "GOODBYE");
    harness()
        .args(["run", "--no-color", "--root"])
        .arg(tree.root())
        .assert()
        .code(1)
        .stdout(contains("FAIL: 01/upper"))
        .stdout(contains("-GOODBYE").and(contains("+HELLO")));
}

#[test]
fn json_format_reports_summary() {
    let output = harness()
        .args(["run", "--format", "json", "--root", GOLDEN, "--filter", "upper"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["passed"], 1);
    assert_eq!(json["summary"]["skipped"], 4);
}

#[test]
fn list_prints_case_ids() {
    harness()
        .args(["list", "--root", GOLDEN, "--group", "02"])
        .assert()
        .success()
        .stdout(contains("02/repo").and(contains("02/sorted")))
        .stdout(contains("01/").not());
}

#[test]
fn missing_root_is_a_usage_error() {
    harness()
        .args(["run", "--root", "/nonexistent-fixtures"])
        .assert()
        .code(2)
        .stderr(contains("/nonexistent-fixtures"));
}

#[test]
fn config_file_supplies_root_and_repo() {
    let tree = FixtureTree::new();
    tree.triple("01", "repo", "", "echo $SEMCONREPO", "http://repo.example:9000");
    let config = tree.write(
        "harness.yaml",
        "fixture_root: .\nrepo_url: http://repo.example:9000\n",
    );
    harness()
        .args(["run", "--no-color", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("PASS: 01/repo"));
}

#[test]
fn environment_overrides_defaults() {
    let tree = FixtureTree::new();
    tree.triple("01", "cmd", "", "echo $SEMCONCMD", "../semcon.rb");
    harness()
        .env("SEMCONCMD", "../semcon.rb")
        .args(["run", "--no-color", "--root"])
        .arg(tree.root())
        .assert()
        .success();
}

#[test]
fn check_repo_reports_unreachable_service() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    harness()
        .args(["check-repo", "--timeout", "5", "--repo"])
        .arg(format!("http://127.0.0.1:{port}"))
        .assert()
        .code(1)
        .stderr(contains("could not reach"));
}

#[test]
fn unreachable_repo_case_errors_without_affecting_fixtures() {
    let tree = FixtureTree::new();
    tree.triple("01", "ok", "", "true", "");
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    harness()
        .args(["run", "--no-color", "--check-repo", "--timeout", "5", "--repo"])
        .arg(format!("http://127.0.0.1:{port}"))
        .arg("--root")
        .arg(tree.root())
        .assert()
        .code(1)
        .stdout(contains("ERROR: repo/version"))
        .stdout(contains("PASS: 01/ok"))
        .stdout(contains("errors 1"));
}

#[test]
fn invalid_config_file_is_a_usage_error() {
    let tree = FixtureTree::new();
    let config = tree.write("harness.yaml", "fixture_root: [unclosed\n");
    harness()
        .args(["run", "--no-color", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("harness::config"));

    let config = tree.write("unknown.yaml", "retries: 3\n");
    harness()
        .args(["list", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("harness::config"));
}
