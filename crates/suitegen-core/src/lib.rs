// crates/suitegen-core/src/lib.rs
// ============================================================================
// Module: Suitegen Core Library
// Description: Fixture discovery, generated-suite emission, and drift checks.
// Purpose: Keep generated test suites in sync with the fixture files on disk.
// Dependencies: cap-std, regex, serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! `suitegen-core` turns a directory of fixture files into a generated suite
//! tree and checks, at run time, that the tree still describes the directory.
//!
//! Generation runs the [`DirectoryWalker`] with a compiled [`MatchRule`], folds
//! the matches into a [`DirectoryNode`] tree, and emits a [`GeneratedSuite`]
//! with one leaf test per fixture and one presence check per directory node.
//! At run time the [`SuiteRunner`] executes each presence check against the
//! live filesystem and hands every leaf's bound path to a [`TestExecutor`].
//!
//! ### Determinism
//! Directory entries are visited in byte-lexicographic order and identifiers
//! are derived from names alone, so regenerating an unchanged tree yields
//! byte-identical artifacts.
//!
//! ## Index
//! - Matching: [`MatchRule`], [`PatternMatcher`], [`Classification`]
//! - Discovery: [`DirectoryWalker`], [`FixtureFile`], [`build_hierarchy`]
//! - Naming: [`sanitizer`]
//! - Emission: [`SuiteGenerator`], [`GeneratedSuite`], [`SuiteDocument`]
//! - Run time: [`check_presence`], [`SuiteRunner`], [`TestExecutor`]
//! - Artifacts: [`BundleBuilder`], [`SuiteBundle`]

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bundle;
pub mod emitter;
pub mod error;
pub mod events;
pub mod executor;
pub mod hashing;
pub mod hierarchy;
pub mod matcher;
pub mod runner;
pub mod sanitizer;
pub mod verifier;
pub mod walker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bundle::BundleBuilder;
pub use bundle::ManifestArtifact;
pub use bundle::SuiteArtifact;
pub use bundle::SuiteBundle;
pub use bundle::SuiteManifest;
pub use emitter::DisplayNameRule;
pub use emitter::GeneratedSuite;
pub use emitter::LeafTest;
pub use emitter::PresenceCheck;
pub use emitter::SuiteDocument;
pub use emitter::SuiteEmitter;
pub use emitter::SuiteGenerator;
pub use error::BundleError;
pub use error::DriftError;
pub use error::GenerationError;
pub use error::PatternError;
pub use error::RunError;
pub use error::ScanError;
pub use events::EventSink;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use events::SuiteEvent;
pub use events::SuiteEventKind;
pub use events::SuiteEventParams;
pub use executor::CommandExecutor;
pub use executor::ExecutionResult;
pub use executor::Outcome;
pub use executor::TestExecutor;
pub use hierarchy::DirectoryNode;
pub use hierarchy::build_hierarchy;
pub use matcher::Classification;
pub use matcher::MatchRule;
pub use matcher::PatternMatcher;
pub use matcher::Rejection;
pub use runner::CheckReport;
pub use runner::CheckStatus;
pub use runner::LeafReport;
pub use runner::RunMode;
pub use runner::RunReport;
pub use runner::RunTotals;
pub use runner::SuiteRunner;
pub use verifier::PresenceOutcome;
pub use verifier::check_presence;
pub use verifier::compare_fixture_sets;
pub use walker::DirectoryWalker;
pub use walker::FixtureFile;
pub use walker::WalkOutput;
