//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_shows_about() {
    Command::cargo_bin("ad")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bounded conversational RAG pipeline"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_policies_lists_builtin_domains() {
    Command::cargo_bin("ad")
        .unwrap()
        .arg("policies")
        .assert()
        .success()
        .stdout(predicate::str::contains("it"))
        .stdout(predicate::str::contains("hr"))
        .stdout(predicate::str::contains("finance"))
        .stdout(predicate::str::contains("general"));
}

#[test]
fn test_doctor_reports_without_failing() {
    Command::cargo_bin("ad")
        .unwrap()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider"))
        .stdout(predicate::str::contains("Loop bounds"));
}

#[test]
fn test_ask_requires_query() {
    Command::cargo_bin("ad").unwrap().arg("ask").assert().failure();
}
