// crates/suitegen-cli/src/render.rs
// ============================================================================
// Module: Text Rendering
// Description: Human-readable run reports and suite listings.
// Purpose: Keep formatting pure so it can be tested without a terminal.
// Dependencies: suitegen-core
// ============================================================================

//! ## Overview
//! Reports list failures only, followed by a totals line. Listings walk a
//! suite tree depth-first with two-space indentation per level.

use std::collections::BTreeSet;
use std::fmt::Write;

use suitegen_core::CheckStatus;
use suitegen_core::GeneratedSuite;
use suitegen_core::Outcome;
use suitegen_core::RunReport;
use suitegen_core::SuiteDocument;

/// Renders a run report: one line per failure, then totals.
pub(crate) fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    for check in &report.checks {
        match &check.status {
            CheckStatus::Passed => {}
            CheckStatus::Drift {
                added,
                missing,
            } => {
                let _ = writeln!(
                    out,
                    "DRIFT {}.{} ({}): added [{}]; missing [{}]",
                    check.suite,
                    check.identifier,
                    display_dir(&check.directory),
                    join(added),
                    join(missing)
                );
            }
            CheckStatus::Error {
                message,
            } => {
                let _ = writeln!(out, "ERROR {}.{}: {message}", check.suite, check.identifier);
            }
        }
    }
    for leaf in report.leaves.iter().filter(|leaf| leaf.outcome == Outcome::Fail) {
        let _ = writeln!(out, "FAIL  {}.{} ({})", leaf.suite, leaf.identifier, leaf.bound_path);
        for line in leaf.diagnostics.lines() {
            let _ = writeln!(out, "      {line}");
        }
    }
    let totals = &report.totals;
    let verdict = if report.is_success() { "ok" } else { "FAILED" };
    let _ = writeln!(
        out,
        "{}: {verdict}. {} checks ({} failed), {} tests ({} failed)",
        report.suite, totals.checks, totals.checks_failed, totals.leaves, totals.leaves_failed
    );
    out
}

/// Renders the suite tree of a document, optionally starting at a subtree.
pub(crate) fn render_listing(document: &SuiteDocument, selection: Option<&str>) -> String {
    let start = selection.and_then(|name| document.suite.find(name)).unwrap_or(&document.suite);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}): {} suites, {} tests",
        start.qualified_name,
        document.root,
        start.suite_count(),
        start.leaf_count()
    );
    list_suite(start, 1, &mut out);
    out
}

/// Appends one suite and its descendants at `depth`.
fn list_suite(suite: &GeneratedSuite, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{}", suite.qualified_name);
    let _ = writeln!(
        out,
        "{indent}  {} [{} fixtures]",
        suite.presence_check.identifier,
        suite.presence_check.fixture_snapshot.len()
    );
    for leaf in &suite.leaf_tests {
        let _ = writeln!(out, "{indent}  {} -> {}", leaf.display_name, leaf.bound_path);
    }
    for child in &suite.child_suites {
        list_suite(child, depth + 1, out);
    }
}

/// Joins a name set with commas.
fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Shows the scan root itself as `.`.
fn display_dir(directory: &str) -> &str {
    if directory.is_empty() { "." } else { directory }
}
