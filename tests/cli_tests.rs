mod common;

use common::*;
use std::process::Command;

fn cli_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_natural-automation"))
}

#[test]
fn test_cli_help() {
    let output = cli_command().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Run natural-language browser scenarios"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("pages"));
    assert!(stdout.contains("validate"));
    assert!(stdout.contains("--config"));
}

#[test]
fn test_cli_version() {
    let output = cli_command().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("natural-automation"));
}

#[test]
fn test_cli_run_help() {
    let output = cli_command().args(["run", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Run a story file, or every story in a directory"));
}

#[test]
fn test_cli_pages() {
    let output = cli_command().arg("pages").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Google search"));
    assert!(stdout.contains("  q (input)"));
    assert!(stdout.contains("  search/0 (action)"));
    assert!(stdout.contains("  results (collection)"));
}

#[test]
fn test_cli_validate_directory() {
    let dir = create_test_dir();
    write_story(
        dir.path(),
        "search.story",
        "Scenario: search\nGiven the user is in the Google search page\nWhen the user does a search\n",
    );

    let output = cli_command()
        .args(["validate", dir.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 scenarios, 2 steps"));
    assert!(stdout.contains("1 stories, 1 scenarios"));
}

#[test]
fn test_cli_validate_reports_parse_error() {
    let dir = create_test_dir();
    write_story(dir.path(), "bad.story", "Given the user is in the Login page\n");

    let output = cli_command()
        .args(["validate", dir.path().join("bad.story").to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_run_missing_config_file() {
    let dir = create_test_dir();
    write_story(dir.path(), "a.story", "Scenario: a\n");

    let output = cli_command()
        .args([
            "run",
            dir.path().to_str().unwrap(),
            "--config",
            dir.path().join("missing.yaml").to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}
