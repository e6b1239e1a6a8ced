// crates/suitegen-core/src/runner/tests.rs
// ============================================================================
// Module: Suite Runner Unit Tests
// Description: Ordering, isolation, and subtree selection coverage.
// Purpose: Ensure reports are deterministic regardless of worker count.
// Dependencies: suitegen-core, tempfile
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use super::CheckStatus;
use super::RunMode;
use super::SuiteRunner;
use crate::emitter::GeneratedSuite;
use crate::emitter::SuiteGenerator;
use crate::error::RunError;
use crate::events::EventSink;
use crate::events::SuiteEvent;
use crate::events::SuiteEventKind;
use crate::executor::ExecutionResult;
use crate::executor::Outcome;
use crate::executor::TestExecutor;
use crate::matcher::MatchRule;

/// Executor that fails paths containing `bad` and records every call.
#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
}

impl TestExecutor for RecordingExecutor {
    fn execute(&self, bound_path: &str) -> ExecutionResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(bound_path.to_string());
        }
        if bound_path.contains("bad") {
            ExecutionResult::fail(format!("rejected {bound_path}"))
        } else {
            ExecutionResult::pass("")
        }
    }
}

/// Executor whose thread dies on paths containing `bad`.
struct PanickingExecutor;

impl TestExecutor for PanickingExecutor {
    #[allow(clippy::panic, reason = "Simulates an executor that crashes its worker.")]
    fn execute(&self, bound_path: &str) -> ExecutionResult {
        if bound_path.contains("bad") {
            panic!("executor crashed on {bound_path}");
        }
        ExecutionResult::pass("")
    }
}

/// Sink that keeps every event kind it receives.
#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<SuiteEventKind>>,
}

impl EventSink for CollectingSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.event);
        }
    }
}

/// Creates an empty file, including parent directories.
fn touch(root: &Path, relative: &str) -> std::io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "")
}

/// Generates the suite for `root`.
fn generate(root: &Path) -> Result<GeneratedSuite, Box<dyn std::error::Error>> {
    let document = SuiteGenerator::new("Root", root, MatchRule::new(r"(.+)\.kt")).generate()?;
    Ok(document.suite)
}

/// Writes a small two-level fixture tree.
fn sample_tree(root: &Path) -> std::io::Result<()> {
    for relative in ["a.kt", "bad.kt", "sub/c.kt", "sub/d.kt", "sub/inner/e.kt", "z/f.kt"] {
        touch(root, relative)?;
    }
    Ok(())
}

#[test]
fn report_follows_emission_order_for_any_job_count() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    sample_tree(dir.path())?;
    let suite = generate(dir.path())?;

    let serial = SuiteRunner::new(dir.path(), Arc::new(RecordingExecutor::default()))
        .run(&suite, None)?;
    let parallel = SuiteRunner::new(dir.path(), Arc::new(RecordingExecutor::default()))
        .with_jobs(8)
        .run(&suite, None)?;

    assert_eq!(serial, parallel);
    let checks: Vec<&str> = serial.checks.iter().map(|check| check.suite.as_str()).collect();
    assert_eq!(checks, vec!["Root", "Root.Sub", "Root.Sub.Inner", "Root.Z"]);
    let leaves: Vec<&str> = serial.leaves.iter().map(|leaf| leaf.identifier.as_str()).collect();
    assert_eq!(leaves, vec!["testA", "testBad", "testC", "testD", "testE", "testF"]);
    assert_eq!(serial.totals.checks, 4);
    assert_eq!(serial.totals.leaves, 6);
    assert_eq!(serial.totals.leaves_failed, 1);
    assert!(!serial.is_success());
    Ok(())
}

#[test]
fn executor_receives_bound_paths_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "sub/c.kt")?;
    let document = SuiteGenerator::new("Root", dir.path(), MatchRule::new(r"(.+)\.kt"))
        .with_root_label("fixtures/data")
        .generate()?;
    let executor = Arc::new(RecordingExecutor::default());
    SuiteRunner::new(dir.path(), executor.clone()).run(&document.suite, None)?;
    let calls = executor.calls.lock().map_err(|_| "poisoned")?.clone();
    assert_eq!(calls, vec!["fixtures/data/sub/c.kt".to_string()]);
    Ok(())
}

#[test]
fn drift_fails_only_its_own_node() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    sample_tree(dir.path())?;
    let suite = generate(dir.path())?;
    fs::remove_file(dir.path().join("sub/c.kt"))?;
    touch(dir.path(), "sub/g.kt")?;

    let report = SuiteRunner::new(dir.path(), Arc::new(RecordingExecutor::default()))
        .with_mode(RunMode::PresenceOnly)
        .run(&suite, None)?;
    assert!(report.leaves.is_empty());
    assert_eq!(report.totals.checks_failed, 1);
    let failing: Vec<&CheckStatus> = report
        .checks
        .iter()
        .filter(|check| check.status != CheckStatus::Passed)
        .map(|check| &check.status)
        .collect();
    assert_eq!(
        failing,
        vec![&CheckStatus::Drift {
            added: BTreeSet::from(["g.kt".to_string()]),
            missing: BTreeSet::from(["c.kt".to_string()]),
        }]
    );
    Ok(())
}

#[test]
fn selection_runs_only_the_named_subtree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    sample_tree(dir.path())?;
    let suite = generate(dir.path())?;
    let executor = Arc::new(RecordingExecutor::default());
    let sink = Arc::new(CollectingSink::default());
    let report = SuiteRunner::new(dir.path(), executor.clone())
        .with_events(sink.clone())
        .run(&suite, Some("Root.Sub"))?;

    assert_eq!(report.suite, "Root.Sub");
    assert_eq!(report.totals.checks, 2);
    assert_eq!(report.totals.leaves, 3);
    assert!(report.is_success());
    assert!(report.leaves.iter().all(|leaf| leaf.outcome == Outcome::Pass));
    let events = sink.events.lock().map_err(|_| "poisoned")?.clone();
    assert_eq!(events.len(), 6);
    assert_eq!(events.last(), Some(&SuiteEventKind::RunCompleted));

    let unknown = SuiteRunner::new(dir.path(), executor).run(&suite, Some("Root.Nope"));
    assert_eq!(unknown, Err(RunError::UnknownSuite("Root.Nope".to_string())));
    Ok(())
}

#[test]
fn panicking_worker_loses_only_its_current_item() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    sample_tree(dir.path())?;
    let suite = generate(dir.path())?;

    let report =
        SuiteRunner::new(dir.path(), Arc::new(PanickingExecutor)).with_jobs(3).run(&suite, None)?;
    assert_eq!(report.totals.checks, 4);
    assert_eq!(report.totals.checks_failed, 0);
    assert_eq!(report.totals.leaves, 6);
    assert_eq!(report.totals.leaves_failed, 1);
    for leaf in &report.leaves {
        if leaf.identifier == "testBad" {
            assert_eq!(leaf.outcome, Outcome::Fail);
            assert!(leaf.diagnostics.contains("panicked"));
        } else {
            assert_eq!(leaf.outcome, Outcome::Pass, "{}", leaf.identifier);
        }
    }
    Ok(())
}

#[test]
fn single_worker_reports_items_finished_before_a_panic() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    sample_tree(dir.path())?;
    let suite = generate(dir.path())?;

    let report = SuiteRunner::new(dir.path(), Arc::new(PanickingExecutor)).run(&suite, None)?;
    assert_eq!(report.checks[0].status, CheckStatus::Passed);
    assert_eq!(report.leaves[0].identifier, "testA");
    assert_eq!(report.leaves[0].outcome, Outcome::Pass);
    assert_eq!(report.leaves[0].diagnostics, "");
    assert_eq!(report.leaves[1].identifier, "testBad");
    assert!(report.leaves[1].diagnostics.contains("panicked"));
    Ok(())
}
