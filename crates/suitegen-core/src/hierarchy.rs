// crates/suitegen-core/src/hierarchy.rs
// ============================================================================
// Module: Hierarchy Builder
// Description: Folds a flat walk into a pruned directory tree.
// Purpose: Mirror the fixture directory layout as nested suite nodes.
// Dependencies: crate::walker
// ============================================================================

//! ## Overview
//! Every traversed directory (and every ancestor of a fixture) gets a node.
//! Fixtures attach to their parent directory's node, then subtrees with no
//! fixtures anywhere below them are pruned. The root node is always kept.
//! The tree depends only on the [`WalkOutput`] it is built from.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::walker::FixtureFile;
use crate::walker::WalkOutput;
use crate::walker::directory_name;

// ============================================================================
// SECTION: Directory Node
// ============================================================================

/// Directory node of the fixture tree.
///
/// # Invariants
/// - `fixtures` are sorted by base name, then file name.
/// - `children` are sorted by directory name.
/// - Every non-root node has at least one fixture in its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    /// Path relative to the scan root (`""` for the root).
    pub path: String,
    /// Final path segment (`""` for the root).
    pub name: String,
    /// Fixtures directly inside this directory.
    pub fixtures: Vec<FixtureFile>,
    /// Non-empty subdirectories.
    pub children: Vec<Self>,
}

impl DirectoryNode {
    /// Returns the number of fixtures in this subtree.
    #[must_use]
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len() + self.children.iter().map(Self::fixture_count).sum::<usize>()
    }

    /// Returns true when the subtree has no fixtures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty() && self.children.is_empty()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Intermediate node keyed by path while the tree is assembled.
#[derive(Debug, Default)]
struct Draft {
    /// Fixtures attached so far.
    fixtures: Vec<FixtureFile>,
    /// Child directory paths.
    children: BTreeSet<String>,
}

/// Builds the pruned directory tree rooted at `root`.
///
/// `root` is the relative path the walk started at (`""` for a full walk).
#[must_use]
pub fn build_hierarchy(walk: &WalkOutput, root: &str) -> DirectoryNode {
    let mut drafts: BTreeMap<String, Draft> = BTreeMap::new();
    drafts.entry(root.to_string()).or_default();
    for directory in &walk.directories {
        register_directory(&mut drafts, root, directory);
    }
    for fixture in &walk.fixtures {
        register_directory(&mut drafts, root, &fixture.parent_directory);
        if let Some(draft) = drafts.get_mut(&fixture.parent_directory) {
            draft.fixtures.push(fixture.clone());
        }
    }
    assemble(&mut drafts, root)
}

/// Registers a directory and links it into each ancestor up to `root`.
fn register_directory(drafts: &mut BTreeMap<String, Draft>, root: &str, directory: &str) {
    let mut current = directory.to_string();
    drafts.entry(current.clone()).or_default();
    while current != root {
        let Some(parent) = parent_of(&current, root) else {
            return;
        };
        let draft = drafts.entry(parent.clone()).or_default();
        if !draft.children.insert(current) {
            return;
        }
        current = parent;
    }
}

/// Returns the parent path, stopping at `root`.
fn parent_of(path: &str, root: &str) -> Option<String> {
    if path == root || path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').map_or("", |(parent, _)| parent).to_string())
}

/// Converts drafts into nodes, dropping empty subtrees below the root.
fn assemble(drafts: &mut BTreeMap<String, Draft>, path: &str) -> DirectoryNode {
    let draft = drafts.remove(path).unwrap_or_default();
    let mut fixtures = draft.fixtures;
    fixtures.sort_by(|lhs, rhs| {
        lhs.base_name.cmp(&rhs.base_name).then_with(|| lhs.file_name.cmp(&rhs.file_name))
    });
    let mut children: Vec<DirectoryNode> = draft
        .children
        .iter()
        .map(|child| assemble(drafts, child))
        .filter(|child| !child.is_empty())
        .collect();
    children.sort_by(|lhs, rhs| lhs.name.as_bytes().cmp(rhs.name.as_bytes()));
    DirectoryNode {
        path: path.to_string(),
        name: directory_name(path).to_string(),
        fixtures,
        children,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
