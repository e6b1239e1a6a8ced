// crates/suitegen-core/src/executor.rs
// ============================================================================
// Module: Test Executor
// Description: Interface to the external analysis each leaf test exercises.
// Purpose: Run one fixture and report pass/fail with diagnostics.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The executor is the only collaborator a leaf test talks to. It receives the
//! leaf's bound path verbatim and returns an [`ExecutionResult`]. The stock
//! [`CommandExecutor`] spawns a configured program per fixture.

use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;

// ============================================================================
// SECTION: Result Types
// ============================================================================

/// Leaf test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The executor accepted the fixture.
    Pass,
    /// The executor rejected the fixture or could not run.
    Fail,
}

impl Outcome {
    /// Returns the lowercase label used in events and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// Executor response for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Pass or fail.
    pub outcome: Outcome,
    /// Diagnostics surfaced verbatim to the report.
    pub diagnostics: String,
}

impl ExecutionResult {
    /// Builds a passing result.
    #[must_use]
    pub fn pass(diagnostics: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Pass,
            diagnostics: diagnostics.into(),
        }
    }

    /// Builds a failing result.
    #[must_use]
    pub fn fail(diagnostics: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail,
            diagnostics: diagnostics.into(),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Runs the analysis for a single fixture.
pub trait TestExecutor: Send + Sync {
    /// Executes the fixture at `bound_path`.
    fn execute(&self, bound_path: &str) -> ExecutionResult;
}

// ============================================================================
// SECTION: Command Executor
// ============================================================================

/// Placeholder replaced by the bound path in command arguments.
pub const FIXTURE_PLACEHOLDER: &str = "{fixture}";

/// Executor that spawns a program once per fixture.
///
/// Arguments containing `{fixture}` have it replaced by the bound path; when
/// no argument contains the placeholder the path is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecutor {
    /// Program to launch.
    program: String,
    /// Argument templates.
    args: Vec<String>,
    /// Working directory for the child process.
    working_dir: Option<PathBuf>,
}

impl CommandExecutor {
    /// Creates an executor for `program` with argument templates.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Builds an executor from a command line split into words.
    ///
    /// Returns `None` for an empty command.
    #[must_use]
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Sets the working directory for launched processes.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    /// Returns the argument list for one fixture.
    #[must_use]
    pub fn arguments_for(&self, bound_path: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(FIXTURE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(FIXTURE_PLACEHOLDER, bound_path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(bound_path.to_string());
        }
        args
    }
}

impl TestExecutor for CommandExecutor {
    fn execute(&self, bound_path: &str) -> ExecutionResult {
        let mut command = Command::new(&self.program);
        command.args(self.arguments_for(bound_path));
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        match command.output() {
            Ok(output) => {
                let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
                diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
                if output.status.success() {
                    ExecutionResult::pass(diagnostics)
                } else {
                    if diagnostics.is_empty() {
                        diagnostics = format!("{} exited with {}", self.program, output.status);
                    }
                    ExecutionResult::fail(diagnostics)
                }
            }
            Err(err) => ExecutionResult::fail(format!("failed to launch {}: {err}", self.program)),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
