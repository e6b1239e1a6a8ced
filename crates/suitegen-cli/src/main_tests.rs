// crates/suitegen-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for suite selection, sinks, and text rendering.
// Purpose: Cover CLI helpers without spawning the binary.
// Dependencies: suitegen-cli main helpers, suitegen-config, tempfile
// ============================================================================

//! ## Overview
//! Exercises `select_suites`, `event_sink`, and the text renderers against
//! hand-built configs and reports.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;

use suitegen_config::SuitegenConfig;
use suitegen_core::CheckReport;
use suitegen_core::CheckStatus;
use suitegen_core::LeafReport;
use suitegen_core::MatchRule;
use suitegen_core::Outcome;
use suitegen_core::RunReport;
use suitegen_core::RunTotals;
use suitegen_core::SuiteEvent;
use suitegen_core::SuiteEventKind;
use suitegen_core::SuiteEventParams;
use suitegen_core::SuiteGenerator;
use suitegen_core::TestExecutor;

use super::OutputDirArgs;
use super::SelectionArgs;
use super::UnconfiguredExecutor;
use super::event_sink;
use super::output_dir;
use super::render::render_listing;
use super::render::render_run;
use super::select_suites;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Two-suite config rooted at `/work`.
fn config() -> SuitegenConfig {
    SuitegenConfig::from_toml_str(
        r#"
[[suites]]
name = "Diagnostics"
root = "testData/diagnostics"
include = '(.+)\.kt'

[[suites]]
name = "BoxTests"
root = "testData/box"
include = '(.+)\.kt'
"#,
        PathBuf::from("/work"),
    )
    .expect("valid config")
}

/// Builds selection args.
fn selection(suite: Option<&str>, select: Option<&str>) -> SelectionArgs {
    SelectionArgs {
        suite: suite.map(ToString::to_string),
        select: select.map(ToString::to_string),
    }
}

/// Returns the selected suite names and subtree names.
fn selected(args: &SelectionArgs) -> Result<Vec<(String, Option<String>)>, String> {
    let config = config();
    let suites = select_suites(&config, args).map_err(|err| err.to_string())?;
    Ok(suites
        .into_iter()
        .map(|(suite, qualified)| (suite.name.clone(), qualified.map(ToString::to_string)))
        .collect())
}

/// Builds a set of owned names.
fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(ToString::to_string).collect()
}

// ============================================================================
// SECTION: Selection
// ============================================================================

#[test]
fn no_selection_runs_every_suite_in_file_order() {
    let suites = selected(&selection(None, None)).unwrap();
    assert_eq!(
        suites,
        vec![("Diagnostics".to_string(), None), ("BoxTests".to_string(), None)]
    );
}

#[test]
fn select_implies_its_root_suite() {
    let suites = selected(&selection(None, Some("BoxTests.Nested"))).unwrap();
    assert_eq!(suites, vec![("BoxTests".to_string(), Some("BoxTests.Nested".to_string()))]);

    let suites = selected(&selection(Some("Diagnostics"), None)).unwrap();
    assert_eq!(suites, vec![("Diagnostics".to_string(), None)]);
}

#[test]
fn conflicting_or_unknown_selection_fails() {
    let err = selected(&selection(Some("Diagnostics"), Some("BoxTests.Nested"))).unwrap_err();
    assert!(err.contains("is not inside suite `Diagnostics`"));

    let err = selected(&selection(Some("Missing"), None)).unwrap_err();
    assert!(err.contains("no configured suite named `Missing`"));
}

#[test]
fn output_dir_prefers_the_override() {
    let config = config();
    assert_eq!(
        output_dir(&config, &OutputDirArgs::default()),
        PathBuf::from("/work/generated/suitegen")
    );
    let args = OutputDirArgs {
        out: Some(PathBuf::from("elsewhere")),
    };
    assert_eq!(output_dir(&config, &args), PathBuf::from("elsewhere"));
}

// ============================================================================
// SECTION: Sinks and Executors
// ============================================================================

#[test]
fn file_event_sink_appends_to_the_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let content = format!(
        "[[suites]]\nname = \"Cases\"\nroot = \"cases\"\ninclude = '(.+)'\n[events]\nsink = \
         \"file\"\npath = \"{}\"\n",
        dir.path().join("events.jsonl").display()
    );
    let config = SuitegenConfig::from_toml_str(&content, dir.path().to_path_buf()).unwrap();
    let sink = event_sink(&config).unwrap();
    sink.record(&SuiteEvent::new(SuiteEventParams::new(SuiteEventKind::RunCompleted, "Cases")));

    let written = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert!(written.contains("\"event\":\"run_completed\""));
}

#[test]
fn unconfigured_executor_always_fails() {
    let result = UnconfiguredExecutor.execute("testData/a.kt");
    assert_eq!(result.outcome, Outcome::Fail);
    assert!(result.diagnostics.contains("runner.command"));
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

#[test]
fn run_report_lists_failures_then_totals() {
    let report = RunReport {
        suite: "Diagnostics".to_string(),
        checks: vec![
            CheckReport {
                suite: "Diagnostics".to_string(),
                identifier: "testAllFilesPresentInDiagnostics".to_string(),
                directory: String::new(),
                status: CheckStatus::Passed,
            },
            CheckReport {
                suite: "Diagnostics.Nested".to_string(),
                identifier: "testAllFilesPresentInNested".to_string(),
                directory: "nested".to_string(),
                status: CheckStatus::Drift {
                    added: names(&["b.kt"]),
                    missing: names(&["a.kt"]),
                },
            },
        ],
        leaves: vec![LeafReport {
            suite: "Diagnostics".to_string(),
            identifier: "testFoo".to_string(),
            display_name: "testFoo".to_string(),
            bound_path: "testData/diagnostics/Foo.kt".to_string(),
            outcome: Outcome::Fail,
            diagnostics: "line one\nline two".to_string(),
        }],
        totals: RunTotals {
            checks: 2,
            checks_failed: 1,
            leaves: 1,
            leaves_failed: 1,
        },
    };
    let text = render_run(&report);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "DRIFT Diagnostics.Nested.testAllFilesPresentInNested (nested): added [b.kt]; \
             missing [a.kt]",
            "FAIL  Diagnostics.testFoo (testData/diagnostics/Foo.kt)",
            "      line one",
            "      line two",
            "Diagnostics: FAILED. 2 checks (1 failed), 1 tests (1 failed)",
        ]
    );
}

#[test]
fn listing_walks_the_selected_subtree() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("a.kt"), "").unwrap();
    std::fs::write(dir.path().join("nested/b.kt"), "").unwrap();
    let document = SuiteGenerator::new("Cases", dir.path(), MatchRule::new(r"(.+)\.kt"))
        .with_root_label("cases")
        .generate()
        .unwrap();

    let full = render_listing(&document, None);
    assert!(full.starts_with("Cases (cases): 2 suites, 2 tests\n"));
    assert!(full.contains("    testA -> cases/a.kt\n"));
    assert!(full.contains("    Cases.Nested\n"));
    assert!(full.contains("      testB -> cases/nested/b.kt\n"));

    let nested = render_listing(&document, Some("Cases.Nested"));
    assert!(nested.starts_with("Cases.Nested (cases): 1 suites, 1 tests\n"));
    assert!(!nested.contains("testA"));
}
