// crates/suitegen-core/src/error.rs
// ============================================================================
// Module: Suitegen Errors
// Description: Error types for scanning, generation, drift checks, and artifacts.
// Purpose: Keep generation failures fatal and run-time failures per node.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Generation errors are all-or-nothing: any [`GenerationError`] aborts the
//! run before an artifact is written. [`DriftError`] is scoped to a single
//! presence check and never suppresses sibling or child checks.

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Pattern Errors
// ============================================================================

/// Invalid include or exclude pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern `{pattern}`: {reason}")]
pub struct PatternError {
    /// Pattern source text.
    pub pattern: String,
    /// Regex compiler message.
    pub reason: String,
}

// ============================================================================
// SECTION: Scan Errors
// ============================================================================

/// Errors raised while walking a fixture directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The directory to scan does not exist.
    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),
    /// A traversed directory could not be opened or listed.
    #[error("unreadable directory {path}: {reason}")]
    UnreadableDirectory {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO message.
        reason: String,
    },
    /// An entry name is not valid UTF-8 and cannot become an identifier.
    #[error("entry name is not valid utf-8: {0}")]
    NonUtf8Name(PathBuf),
}

// ============================================================================
// SECTION: Generation Errors
// ============================================================================

/// Fatal errors raised while generating a suite tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Match rule could not be compiled.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    /// Directory scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Two sibling names resolved to the same identifier.
    #[error("identifier collision under `{parent}`: `{identifier}` is claimed by {}", .names.join(", "))]
    IdentifierCollision {
        /// Parent directory (relative to the scan root) or suite name.
        parent: String,
        /// Colliding identifier.
        identifier: String,
        /// Original names that produced the identifier.
        names: Vec<String>,
    },
    /// Suite configuration is unusable.
    #[error("invalid suite: {0}")]
    InvalidSuite(String),
}

// ============================================================================
// SECTION: Drift Errors
// ============================================================================

/// Errors raised by a single run-time presence check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriftError {
    /// Match rule snapshot could not be compiled.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    /// Live directory scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

// ============================================================================
// SECTION: Run Errors
// ============================================================================

/// Errors raised before a suite run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// No suite matches the requested qualified name.
    #[error("no suite named `{0}`")]
    UnknownSuite(String),
}

// ============================================================================
// SECTION: Bundle Errors
// ============================================================================

/// Errors raised when writing or checking generated artifacts.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Suite generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// IO failure while reading or writing artifacts.
    #[error("io error: {0}")]
    Io(String),
    /// Serialization failure while rendering artifacts.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// On-disk artifacts differ from the generated bundle.
    #[error("generated suites are stale: {0}; run `suitegen generate`")]
    Stale(String),
    /// Output path invalid or inaccessible.
    #[error("invalid output path: {0}")]
    OutputPath(PathBuf),
}
