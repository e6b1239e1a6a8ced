// crates/suitegen-core/src/emitter.rs
// ============================================================================
// Module: Suite Emitter
// Description: Converts a directory tree into the generated-suite structure.
// Purpose: Emit presence checks, leaf tests, and nested suites deterministically.
// Dependencies: serde, crate::{hierarchy, matcher, sanitizer, verifier, walker}
// ============================================================================

//! ## Overview
//! [`SuiteEmitter`] walks a [`DirectoryNode`] tree top-down. Each node becomes
//! a [`GeneratedSuite`] holding:
//! - a [`PresenceCheck`] whose snapshot is exactly the node's direct fixtures;
//! - one [`LeafTest`] per fixture, bound to the path handed to the executor;
//! - one child suite per child node.
//!
//! [`SuiteGenerator`] is the generation entry point: compile, walk, build,
//! emit. Every step is deterministic, so an unchanged tree serializes to the
//! same bytes on every run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::DriftError;
use crate::error::GenerationError;
use crate::hierarchy::DirectoryNode;
use crate::hierarchy::build_hierarchy;
use crate::matcher::MatchRule;
use crate::sanitizer::IdentifierKind;
use crate::sanitizer::SiblingName;
use crate::sanitizer::assign_identifiers;
use crate::sanitizer::identifier_body;
use crate::sanitizer::presence_check_identifier;
use crate::verifier::PresenceOutcome;
use crate::verifier::check_presence;
use crate::walker::DirectoryWalker;
use crate::walker::directory_name;
use crate::walker::join_segment;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version of the persisted suite document layout.
pub const SUITE_FORMAT_VERSION: u32 = 1;

// ============================================================================
// SECTION: Generated Types
// ============================================================================

/// How leaf tests are labelled for humans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayNameRule {
    /// Use the generated identifier.
    #[default]
    Identifier,
    /// Use the fixture's file name.
    FileName,
}

/// Drift check bound to one directory node.
///
/// # Invariants
/// - `fixture_snapshot` holds the file names of the node's direct fixtures only.
/// - `child_snapshot` holds the directory names of the node's child suites.
/// - Neither snapshot changes after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceCheck {
    /// Check identifier (`testAllFilesPresentIn<Node>`).
    pub identifier: String,
    /// Directory relative to the scan root.
    pub directory: String,
    /// Match rule in force at generation time.
    pub match_rule: MatchRule,
    /// Fixture file names present at generation time.
    pub fixture_snapshot: BTreeSet<String>,
    /// Subdirectory names that had a child suite at generation time.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub child_snapshot: BTreeSet<String>,
}

impl PresenceCheck {
    /// Runs the check against the live directory beneath `scan_root`.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError`] when the directory cannot be scanned.
    pub fn run(&self, scan_root: &Path) -> Result<PresenceOutcome, DriftError> {
        check_presence(
            scan_root,
            &self.directory,
            &self.match_rule,
            &self.fixture_snapshot,
            &self.child_snapshot,
        )
    }
}

/// Leaf test bound to one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafTest {
    /// Test identifier (`test<Fixture>`).
    pub identifier: String,
    /// Human-facing label.
    pub display_name: String,
    /// Fixture file name.
    pub file_name: String,
    /// Path handed to the test executor.
    pub bound_path: String,
}

/// Generated suite for one directory node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSuite {
    /// Suite identifier.
    pub name: String,
    /// Dot-joined identifiers from the root suite.
    pub qualified_name: String,
    /// Directory relative to the scan root.
    pub directory: String,
    /// Drift check for the directory's own fixtures.
    pub presence_check: PresenceCheck,
    /// Leaf tests in emission order.
    pub leaf_tests: Vec<LeafTest>,
    /// Nested suites in emission order.
    pub child_suites: Vec<Self>,
}

impl GeneratedSuite {
    /// Returns this suite and every descendant, depth-first.
    #[must_use]
    pub fn suites(&self) -> Vec<&Self> {
        let mut out = vec![self];
        for child in &self.child_suites {
            out.extend(child.suites());
        }
        out
    }

    /// Finds a suite by qualified name.
    #[must_use]
    pub fn find(&self, qualified_name: &str) -> Option<&Self> {
        if self.qualified_name == qualified_name {
            return Some(self);
        }
        let nested = qualified_name.strip_prefix(&self.qualified_name)?.strip_prefix('.')?;
        let child_name = nested.split('.').next()?;
        self.child_suites
            .iter()
            .find(|child| child.name == child_name)
            .and_then(|child| child.find(qualified_name))
    }

    /// Finds a leaf test by its qualified suite name and identifier.
    #[must_use]
    pub fn find_leaf(&self, qualified_name: &str, identifier: &str) -> Option<&LeafTest> {
        self.find(qualified_name)?.leaf_tests.iter().find(|leaf| leaf.identifier == identifier)
    }

    /// Returns the number of leaf tests in this subtree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_tests.len() + self.child_suites.iter().map(Self::leaf_count).sum::<usize>()
    }

    /// Returns the number of suites (and presence checks) in this subtree.
    #[must_use]
    pub fn suite_count(&self) -> usize {
        1 + self.child_suites.iter().map(Self::suite_count).sum::<usize>()
    }
}

/// Persisted generation output for one configured suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDocument {
    /// Document layout version.
    pub format_version: u32,
    /// Scan root as configured; leaf bound paths start with it.
    pub root: String,
    /// Root of the generated suite tree.
    pub suite: GeneratedSuite,
}

// ============================================================================
// SECTION: Suite Emitter
// ============================================================================

/// Converts directory nodes into generated suites.
#[derive(Debug, Clone)]
pub struct SuiteEmitter<'a> {
    /// Rule recorded in every presence check.
    rule: &'a MatchRule,
    /// Scan root label prefixed to bound paths.
    root_label: &'a str,
    /// Root suite identifier.
    suite_name: &'a str,
    /// Leaf labelling rule.
    display: DisplayNameRule,
}

impl<'a> SuiteEmitter<'a> {
    /// Creates an emitter.
    #[must_use]
    pub const fn new(
        rule: &'a MatchRule,
        root_label: &'a str,
        suite_name: &'a str,
        display: DisplayNameRule,
    ) -> Self {
        Self {
            rule,
            root_label,
            suite_name,
            display,
        }
    }

    /// Emits the suite tree for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::IdentifierCollision`] when siblings cannot
    /// be named uniquely.
    pub fn emit(&self, root: &DirectoryNode) -> Result<GeneratedSuite, GenerationError> {
        let root_body = match root_directory_name(self.root_label, &root.name) {
            Some(name) => identifier_body(name),
            None => self.suite_name.to_string(),
        };
        self.emit_node(root, self.suite_name, self.suite_name, &root_body)
    }

    /// Emits one node and, recursively, its children.
    fn emit_node(
        &self,
        node: &DirectoryNode,
        name: &str,
        qualified_name: &str,
        body: &str,
    ) -> Result<GeneratedSuite, GenerationError> {
        let check_identifier = presence_check_identifier(body);
        let parent_label = if node.path.is_empty() { qualified_name } else { node.path.as_str() };

        let leaf_names: Vec<SiblingName<'_>> = node
            .fixtures
            .iter()
            .map(|fixture| SiblingName {
                full_name: &fixture.file_name,
                base_name: &fixture.base_name,
            })
            .collect();
        let reserved = BTreeSet::from([check_identifier.clone()]);
        let leaf_identifiers =
            assign_identifiers(parent_label, IdentifierKind::LeafTest, &leaf_names, &reserved)?;
        let leaf_tests = node
            .fixtures
            .iter()
            .zip(leaf_identifiers)
            .map(|(fixture, identifier)| LeafTest {
                display_name: match self.display {
                    DisplayNameRule::Identifier => identifier.clone(),
                    DisplayNameRule::FileName => fixture.file_name.clone(),
                },
                identifier,
                file_name: fixture.file_name.clone(),
                bound_path: bound_path(self.root_label, &fixture.relative_path),
            })
            .collect();

        let child_names: Vec<SiblingName<'_>> = node
            .children
            .iter()
            .map(|child| SiblingName {
                full_name: &child.name,
                base_name: &child.name,
            })
            .collect();
        let child_identifiers =
            assign_identifiers(parent_label, IdentifierKind::Suite, &child_names, &BTreeSet::new())?;
        let mut child_suites = Vec::with_capacity(node.children.len());
        for (child, identifier) in node.children.iter().zip(child_identifiers) {
            let child_qualified = format!("{qualified_name}.{identifier}");
            child_suites.push(self.emit_node(child, &identifier, &child_qualified, &identifier)?);
        }

        Ok(GeneratedSuite {
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            directory: node.path.clone(),
            presence_check: PresenceCheck {
                identifier: check_identifier,
                directory: node.path.clone(),
                match_rule: self.rule.clone(),
                fixture_snapshot: node
                    .fixtures
                    .iter()
                    .map(|fixture| fixture.file_name.clone())
                    .collect(),
                child_snapshot: node.children.iter().map(|child| child.name.clone()).collect(),
            },
            leaf_tests,
            child_suites,
        })
    }
}

/// Returns the name the root presence check is derived from.
fn root_directory_name<'a>(root_label: &'a str, node_name: &'a str) -> Option<&'a str> {
    if !node_name.is_empty() {
        return Some(node_name);
    }
    let trimmed = root_label.trim_end_matches('/');
    let name = directory_name(trimmed);
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Joins the scan root label and a fixture path with `/`.
fn bound_path(root_label: &str, relative_path: &str) -> String {
    let root = root_label.trim_end_matches('/');
    if root.is_empty() || root == "." {
        relative_path.to_string()
    } else {
        join_segment(root, relative_path)
    }
}

// ============================================================================
// SECTION: Suite Generator
// ============================================================================

/// Generation entry point for one configured suite.
///
/// # Invariants
/// - `generate` reads the filesystem but never writes to it.
/// - Two calls over an unchanged tree return equal documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteGenerator {
    /// Root suite identifier.
    suite_name: String,
    /// Filesystem location of the scan root.
    root: PathBuf,
    /// Scan root as recorded in bound paths.
    root_label: String,
    /// Fixture selection rule.
    rule: MatchRule,
    /// Leaf labelling rule.
    display: DisplayNameRule,
}

impl SuiteGenerator {
    /// Creates a generator whose bound paths are prefixed with `root` as given.
    #[must_use]
    pub fn new(suite_name: impl Into<String>, root: impl AsRef<Path>, rule: MatchRule) -> Self {
        let root = root.as_ref().to_path_buf();
        let root_label = root.to_string_lossy().replace('\\', "/");
        Self {
            suite_name: suite_name.into(),
            root,
            root_label,
            rule,
            display: DisplayNameRule::default(),
        }
    }

    /// Overrides the label recorded in bound paths (the root as configured).
    #[must_use]
    pub fn with_root_label(mut self, root_label: impl Into<String>) -> Self {
        self.root_label = root_label.into().replace('\\', "/");
        self
    }

    /// Sets the leaf labelling rule.
    #[must_use]
    pub fn with_display(mut self, display: DisplayNameRule) -> Self {
        self.display = display;
        self
    }

    /// Returns the root suite identifier.
    #[must_use]
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Returns the filesystem scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the match rule.
    #[must_use]
    pub const fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Walks the scan root and emits the suite document.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] for invalid patterns, scan failures, an
    /// invalid suite name, or identifier collisions.
    pub fn generate(&self) -> Result<SuiteDocument, GenerationError> {
        if identifier_body(&self.suite_name) != self.suite_name {
            return Err(GenerationError::InvalidSuite(format!(
                "suite name `{}` is not an identifier",
                self.suite_name
            )));
        }
        let matcher = self.rule.compile()?;
        let walk = DirectoryWalker::new(&matcher).walk(&self.root)?;
        let tree = build_hierarchy(&walk, "");
        let emitter =
            SuiteEmitter::new(&self.rule, &self.root_label, &self.suite_name, self.display);
        let suite = emitter.emit(&tree)?;
        Ok(SuiteDocument {
            format_version: SUITE_FORMAT_VERSION,
            root: self.root_label.clone(),
            suite,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
