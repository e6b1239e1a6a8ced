// crates/suitegen-core/src/runner.rs
// ============================================================================
// Module: Suite Runner
// Description: Run-time execution of presence checks and leaf tests.
// Purpose: Execute a generated suite tree and report per-node outcomes.
// Dependencies: serde, std::thread, crate::{emitter, events, executor}
// ============================================================================

//! ## Overview
//! The runner flattens the selected suite subtree into work items in emission
//! order (each suite's presence check, then its leaves, then its children) and
//! executes them on a bounded pool of scoped worker threads. Items are
//! independent and read-only, so they run in any order; the [`RunReport`]
//! always lists results in emission order. A failing item never stops the
//! others.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use serde::Serialize;

use crate::emitter::GeneratedSuite;
use crate::emitter::LeafTest;
use crate::emitter::PresenceCheck;
use crate::error::RunError;
use crate::events::EventSink;
use crate::events::NoopEventSink;
use crate::events::SuiteEvent;
use crate::events::SuiteEventKind;
use crate::events::SuiteEventParams;
use crate::executor::ExecutionResult;
use crate::executor::Outcome;
use crate::executor::TestExecutor;
use crate::verifier::PresenceOutcome;

// ============================================================================
// SECTION: Report Types
// ============================================================================

/// Which items a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Presence checks and leaf tests.
    #[default]
    Full,
    /// Presence checks only; the executor is never invoked.
    PresenceOnly,
}

/// Result of one presence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    /// Live fixtures match the snapshot.
    Passed,
    /// Live fixtures differ from the snapshot.
    Drift {
        /// Live fixtures absent from the snapshot.
        added: BTreeSet<String>,
        /// Snapshot fixtures absent from the live directory.
        missing: BTreeSet<String>,
    },
    /// The check could not scan its directory.
    Error {
        /// Error description.
        message: String,
    },
}

impl CheckStatus {
    /// Returns the lowercase label used in events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "pass",
            Self::Drift { .. } => "drift",
            Self::Error { .. } => "error",
        }
    }
}

/// Presence check report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Qualified name of the owning suite.
    pub suite: String,
    /// Check identifier.
    pub identifier: String,
    /// Directory relative to the scan root.
    pub directory: String,
    /// Check result.
    pub status: CheckStatus,
}

/// Leaf test report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafReport {
    /// Qualified name of the owning suite.
    pub suite: String,
    /// Leaf identifier.
    pub identifier: String,
    /// Human-facing label.
    pub display_name: String,
    /// Path handed to the executor.
    pub bound_path: String,
    /// Executor outcome.
    pub outcome: Outcome,
    /// Executor diagnostics, verbatim.
    pub diagnostics: String,
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    /// Presence checks executed.
    pub checks: usize,
    /// Presence checks that did not pass.
    pub checks_failed: usize,
    /// Leaf tests executed.
    pub leaves: usize,
    /// Leaf tests that failed.
    pub leaves_failed: usize,
}

/// Outcome of a suite run, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Qualified name of the suite the run started at.
    pub suite: String,
    /// Presence check results.
    pub checks: Vec<CheckReport>,
    /// Leaf test results.
    pub leaves: Vec<LeafReport>,
    /// Aggregate counts.
    pub totals: RunTotals,
}

impl RunReport {
    /// Returns true when every check and leaf passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.totals.checks_failed == 0 && self.totals.leaves_failed == 0
    }
}

// ============================================================================
// SECTION: Work Items
// ============================================================================

/// One schedulable unit.
#[derive(Debug, Clone, Copy)]
enum WorkItem<'a> {
    /// Presence check of a suite node.
    Check {
        /// Owning suite.
        suite: &'a GeneratedSuite,
        /// Check to run.
        check: &'a PresenceCheck,
    },
    /// Leaf test of a suite node.
    Leaf {
        /// Owning suite.
        suite: &'a GeneratedSuite,
        /// Leaf to run.
        leaf: &'a LeafTest,
    },
}

/// Result of one unit, before it is split into the report lists.
#[derive(Debug)]
enum ItemResult {
    /// Presence check result.
    Check(CheckReport),
    /// Leaf result.
    Leaf(LeafReport),
}

/// Flattens a subtree into work items in emission order.
fn collect_items<'a>(suite: &'a GeneratedSuite, mode: RunMode, items: &mut Vec<WorkItem<'a>>) {
    items.push(WorkItem::Check {
        suite,
        check: &suite.presence_check,
    });
    if mode == RunMode::Full {
        items.extend(suite.leaf_tests.iter().map(|leaf| WorkItem::Leaf {
            suite,
            leaf,
        }));
    }
    for child in &suite.child_suites {
        collect_items(child, mode, items);
    }
}

// ============================================================================
// SECTION: Suite Runner
// ============================================================================

/// Executes generated suites against the live filesystem.
#[derive(Clone)]
pub struct SuiteRunner {
    /// Filesystem location of the scan root.
    scan_root: PathBuf,
    /// Collaborator invoked for each leaf.
    executor: Arc<dyn TestExecutor>,
    /// Event sink for progress records.
    events: Arc<dyn EventSink>,
    /// Worker thread count.
    jobs: usize,
    /// Items to execute.
    mode: RunMode,
}

impl SuiteRunner {
    /// Creates a single-threaded runner with no event output.
    #[must_use]
    pub fn new(scan_root: impl Into<PathBuf>, executor: Arc<dyn TestExecutor>) -> Self {
        Self {
            scan_root: scan_root.into(),
            executor,
            events: Arc::new(NoopEventSink),
            jobs: 1,
            mode: RunMode::Full,
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the worker thread count (at least one).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Replaces the scan root, keeping every other setting.
    #[must_use]
    pub fn with_scan_root(mut self, scan_root: impl Into<PathBuf>) -> Self {
        self.scan_root = scan_root.into();
        self
    }

    /// Sets the run mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the scan root presence checks run against.
    #[must_use]
    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    /// Runs `root`, or the subtree named by `selection` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownSuite`] when `selection` names no suite.
    pub fn run(
        &self,
        root: &GeneratedSuite,
        selection: Option<&str>,
    ) -> Result<RunReport, RunError> {
        let start = match selection {
            Some(name) => {
                root.find(name).ok_or_else(|| RunError::UnknownSuite(name.to_string()))?
            }
            None => root,
        };
        let mut items = Vec::new();
        collect_items(start, self.mode, &mut items);
        let results = self.execute_items(&items);

        let mut report = RunReport {
            suite: start.qualified_name.clone(),
            checks: Vec::new(),
            leaves: Vec::new(),
            totals: RunTotals::default(),
        };
        for result in results {
            match result {
                ItemResult::Check(check) => {
                    report.totals.checks += 1;
                    if check.status != CheckStatus::Passed {
                        report.totals.checks_failed += 1;
                    }
                    report.checks.push(check);
                }
                ItemResult::Leaf(leaf) => {
                    report.totals.leaves += 1;
                    if leaf.outcome == Outcome::Fail {
                        report.totals.leaves_failed += 1;
                    }
                    report.leaves.push(leaf);
                }
            }
        }

        let mut params = SuiteEventParams::new(SuiteEventKind::RunCompleted, &report.suite);
        params.outcome = Some(if report.is_success() { "pass" } else { "fail" });
        params.count = Some(report.totals.checks + report.totals.leaves);
        self.events.record(&SuiteEvent::new(params));
        Ok(report)
    }

    /// Executes items on the worker pool and returns results in item order.
    ///
    /// Each result is stored as soon as it completes, so a worker that panics
    /// loses only the item it was executing. Items no worker reached are
    /// reported as interrupted.
    fn execute_items(&self, items: &[WorkItem<'_>]) -> Vec<ItemResult> {
        let workers = self.jobs.min(items.len()).max(1);
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<ItemResult>>> =
            Mutex::new(items.iter().map(|_| None).collect());

        std::thread::scope(|scope| {
            let mut joins = Vec::with_capacity(workers);
            for _ in 0 .. workers {
                let next = &next;
                let slots = &slots;
                joins.push(scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        let result = self.execute_item(*item);
                        let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(result);
                        }
                    }
                }));
            }
            for join in joins {
                // A panicked worker's finished items are already in `slots`.
                let _ = join.join();
            }
        });

        let slots = slots.into_inner().unwrap_or_else(PoisonError::into_inner);
        items
            .iter()
            .zip(slots)
            .map(|(item, slot)| slot.unwrap_or_else(|| interrupted(*item)))
            .collect()
    }

    /// Executes a single item and records its event.
    fn execute_item(&self, item: WorkItem<'_>) -> ItemResult {
        match item {
            WorkItem::Check {
                suite,
                check,
            } => {
                let status = match check.run(&self.scan_root) {
                    Ok(PresenceOutcome::Pass) => CheckStatus::Passed,
                    Ok(PresenceOutcome::DriftDetected {
                        added,
                        missing,
                    }) => CheckStatus::Drift {
                        added,
                        missing,
                    },
                    Err(err) => CheckStatus::Error {
                        message: err.to_string(),
                    },
                };
                let mut params =
                    SuiteEventParams::new(SuiteEventKind::PresenceChecked, &suite.qualified_name);
                params.subject = Some(format!("{}.{}", suite.qualified_name, check.identifier));
                params.outcome = Some(status.label());
                params.count = Some(check.fixture_snapshot.len());
                if let CheckStatus::Error {
                    message,
                } = &status
                {
                    params.detail = Some(message.clone());
                }
                self.events.record(&SuiteEvent::new(params));
                ItemResult::Check(CheckReport {
                    suite: suite.qualified_name.clone(),
                    identifier: check.identifier.clone(),
                    directory: check.directory.clone(),
                    status,
                })
            }
            WorkItem::Leaf {
                suite,
                leaf,
            } => {
                let ExecutionResult {
                    outcome,
                    diagnostics,
                } = self.executor.execute(&leaf.bound_path);
                let mut params =
                    SuiteEventParams::new(SuiteEventKind::LeafExecuted, &suite.qualified_name);
                params.subject = Some(format!("{}.{}", suite.qualified_name, leaf.identifier));
                params.outcome = Some(outcome.label());
                self.events.record(&SuiteEvent::new(params));
                ItemResult::Leaf(LeafReport {
                    suite: suite.qualified_name.clone(),
                    identifier: leaf.identifier.clone(),
                    display_name: leaf.display_name.clone(),
                    bound_path: leaf.bound_path.clone(),
                    outcome,
                    diagnostics,
                })
            }
        }
    }
}

/// Result recorded for an item whose worker thread panicked.
fn interrupted(item: WorkItem<'_>) -> ItemResult {
    let message = String::from("worker thread panicked before reporting");
    match item {
        WorkItem::Check {
            suite,
            check,
        } => ItemResult::Check(CheckReport {
            suite: suite.qualified_name.clone(),
            identifier: check.identifier.clone(),
            directory: check.directory.clone(),
            status: CheckStatus::Error {
                message,
            },
        }),
        WorkItem::Leaf {
            suite,
            leaf,
        } => ItemResult::Leaf(LeafReport {
            suite: suite.qualified_name.clone(),
            identifier: leaf.identifier.clone(),
            display_name: leaf.display_name.clone(),
            bound_path: leaf.bound_path.clone(),
            outcome: Outcome::Fail,
            diagnostics: message,
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
