// crates/suitegen-core/src/verifier.rs
// ============================================================================
// Module: Drift Verifier
// Description: Run-time comparison of live fixtures with a generated snapshot.
// Purpose: Fail loudly when fixtures change without regeneration.
// Dependencies: crate::{matcher, walker}
// ============================================================================

//! ## Overview
//! A presence check rescans one directory (non-recursively) with the match
//! rule recorded at generation time and compares the live file names with the
//! snapshot as sets. Counts are never compared: renaming `a.kt` to `b.kt`
//! keeps the count and still fails. A directory that no longer exists has an
//! empty live set. The check never writes to the filesystem.
//!
//! Subdirectories are covered too. A live subdirectory that holds a fixture
//! anywhere below it, but had no suite at generation time, is reported as
//! added under its name with a trailing `/`. This catches fixtures placed in
//! a new directory or in one that was empty when the suites were generated.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::error::DriftError;
use crate::error::ScanError;
use crate::matcher::MatchRule;
use crate::matcher::PatternMatcher;
use crate::walker::DirectoryWalker;
use crate::walker::join_segment;

/// Outcome of one presence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PresenceOutcome {
    /// Live set equals the snapshot.
    Pass,
    /// Live set differs from the snapshot.
    DriftDetected {
        /// Live fixtures absent from the snapshot.
        added: BTreeSet<String>,
        /// Snapshot fixtures absent from the live directory.
        missing: BTreeSet<String>,
    },
}

impl PresenceOutcome {
    /// Returns true for [`PresenceOutcome::Pass`].
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Compares a live fixture set with a snapshot.
#[must_use]
pub fn compare_fixture_sets(
    live: &BTreeSet<String>,
    snapshot: &BTreeSet<String>,
) -> PresenceOutcome {
    let added: BTreeSet<String> = live.difference(snapshot).cloned().collect();
    let missing: BTreeSet<String> = snapshot.difference(live).cloned().collect();
    if added.is_empty() && missing.is_empty() {
        PresenceOutcome::Pass
    } else {
        PresenceOutcome::DriftDetected {
            added,
            missing,
        }
    }
}

/// Scans `directory` beneath `scan_root` and compares it with `snapshot`.
///
/// `directory` is relative to the scan root, `""` for the root itself.
/// `child_snapshot` names the subdirectories that had their own suite at
/// generation time.
///
/// # Errors
///
/// Returns [`DriftError`] when the recorded rule no longer compiles or the
/// live directory cannot be read.
pub fn check_presence(
    scan_root: &Path,
    directory: &str,
    rule: &MatchRule,
    snapshot: &BTreeSet<String>,
    child_snapshot: &BTreeSet<String>,
) -> Result<PresenceOutcome, DriftError> {
    let matcher = rule.compile()?;
    let mut live: BTreeSet<String> =
        match DirectoryWalker::non_recursive(&matcher).walk_at(scan_root, directory) {
            Ok(output) => output.fixtures.into_iter().map(|fixture| fixture.file_name).collect(),
            Err(ScanError::MissingDirectory(_)) => BTreeSet::new(),
            Err(err) => return Err(err.into()),
        };
    for name in unexpected_child_directories(&matcher, scan_root, directory, child_snapshot)? {
        live.insert(format!("{name}/"));
    }
    Ok(compare_fixture_sets(&live, snapshot))
}

/// Returns live subdirectories outside `child_snapshot` that hold a fixture.
fn unexpected_child_directories(
    matcher: &PatternMatcher,
    scan_root: &Path,
    directory: &str,
    child_snapshot: &BTreeSet<String>,
) -> Result<Vec<String>, ScanError> {
    let walker = DirectoryWalker::new(matcher);
    let children = match walker.child_directories(scan_root, directory) {
        Ok(children) => children,
        Err(ScanError::MissingDirectory(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut unexpected = Vec::new();
    for name in children {
        if child_snapshot.contains(&name) {
            continue;
        }
        match walker.walk_at(scan_root, &join_segment(directory, &name)) {
            Ok(output) if !output.fixtures.is_empty() => unexpected.push(name),
            Ok(_) | Err(ScanError::MissingDirectory(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(unexpected)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
