// crates/suitegen-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests driving the `suitegen` binary end to end.
// Purpose: Ensure generate/check/verify/run/list agree on drift and exit codes.
// Dependencies: suitegen-cli binary, tempfile
// ============================================================================
//! ## Overview
//! Each test builds a fixture tree and config in a temporary directory, then
//! invokes the binary the way a CI job would.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Path to the compiled binary.
fn suitegen_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_suitegen"))
}

/// Writes a project with two fixtures and a config using `runner_command`.
fn project(runner_command: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixtures = dir.path().join("testData/cases");
    fs::create_dir_all(fixtures.join("nested")).expect("fixture dirs");
    fs::write(fixtures.join("Alpha.kt"), "").expect("fixture");
    fs::write(fixtures.join("nested/Beta.kt"), "").expect("fixture");
    fs::write(fixtures.join("Alpha.fir.kt"), "").expect("fixture");
    let config = format!(
        r#"[[suites]]
name = "Cases"
root = "testData/cases"
include = '^(.+)\.kt$'
exclude = '^(.+)\.fir\.kts?$'

[runner]
command = {runner_command}
jobs = 2
"#
    );
    fs::write(dir.path().join("suitegen.toml"), config).expect("config");
    dir
}

/// Runs the binary with `--config` pointing at the project config.
fn suitegen(root: &Path, args: &[&str]) -> Output {
    Command::new(suitegen_bin())
        .arg("--config")
        .arg(root.join("suitegen.toml"))
        .args(args)
        .output()
        .expect("run suitegen")
}

/// Returns stdout as text.
fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Returns stderr as text.
fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn generate_then_check_passes_until_fixtures_change() {
    let dir = project("[]");
    let output = suitegen(dir.path(), &["generate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("wrote 2 artifacts"));
    assert!(dir.path().join("generated/suitegen/Cases.json").is_file());
    assert!(dir.path().join("generated/suitegen/index.json").is_file());

    let output = suitegen(dir.path(), &["check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    fs::write(dir.path().join("testData/cases/Gamma.kt"), "").unwrap();
    let output = suitegen(dir.path(), &["check"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("generated suites are stale"));
}

#[test]
fn verify_reports_drift_for_the_changed_directory_only() {
    let dir = project("[]");
    assert!(suitegen(dir.path(), &["generate"]).status.success());

    let output = suitegen(dir.path(), &["verify"]);
    assert!(output.status.success(), "stdout: {}", stdout(&output));
    assert!(stdout(&output).contains("Cases: ok. 2 checks (0 failed), 0 tests (0 failed)"));

    fs::rename(
        dir.path().join("testData/cases/nested/Beta.kt"),
        dir.path().join("testData/cases/nested/Renamed.kt"),
    )
    .unwrap();
    let output = suitegen(dir.path(), &["verify"]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("DRIFT Cases.Nested."), "stdout: {text}");
    assert!(text.contains("added [Renamed.kt]; missing [Beta.kt]"));
    assert!(text.contains("2 checks (1 failed)"));

    let output = suitegen(dir.path(), &["verify", "--select", "Cases.Nested", "--format", "json"]);
    assert!(!output.status.success());
    assert!(stdout(&output).starts_with("{\"reports\":["));
}

#[cfg(unix)]
#[test]
fn run_hands_bound_paths_to_the_runner_command() {
    let dir = project(r#"["sh", "-c", "test -f \"$0\"", "{fixture}"]"#);
    assert!(suitegen(dir.path(), &["generate"]).status.success());

    let output = suitegen(dir.path(), &["run"]);
    assert!(output.status.success(), "stdout: {}", stdout(&output));
    assert!(stdout(&output).contains("Cases: ok. 2 checks (0 failed), 2 tests (0 failed)"));

    fs::remove_file(dir.path().join("testData/cases/Alpha.kt")).unwrap();
    let output = suitegen(dir.path(), &["run", "--jobs", "1"]);
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("FAIL  Cases.testAlpha (testData/cases/Alpha.kt)"), "stdout: {text}");
    assert!(text.contains("missing [Alpha.kt]"));
}

#[test]
fn run_without_a_runner_command_fails_closed() {
    let dir = project("[]");
    assert!(suitegen(dir.path(), &["generate"]).status.success());
    let output = suitegen(dir.path(), &["run"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("runner.command is not configured"));
}

#[test]
fn list_shows_leaf_tests_and_bound_paths() {
    let dir = project("[]");
    let output = suitegen(dir.path(), &["list"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("run `suitegen generate`"));

    assert!(suitegen(dir.path(), &["generate"]).status.success());
    let output = suitegen(dir.path(), &["list"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Cases (testData/cases): 2 suites, 2 tests"), "stdout: {text}");
    assert!(text.contains("testAlpha -> testData/cases/Alpha.kt"));
    assert!(!text.contains("Alpha.fir.kt"));

    let output = suitegen(dir.path(), &["list", "--select", "Cases.Missing"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no suite named `Cases.Missing`"));
}

#[test]
fn init_writes_a_valid_config_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("suitegen.toml");
    let run = |args: &[&str]| {
        Command::new(suitegen_bin())
            .arg("--config")
            .arg(&path)
            .args(args)
            .output()
            .expect("run suitegen")
    };

    assert!(run(&["init"]).status.success());
    assert!(run(&["config", "validate"]).status.success());
    let output = run(&["init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("pass --force"));
    assert!(run(&["init", "--force"]).status.success());
}
