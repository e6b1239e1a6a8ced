// crates/suitegen-core/src/walker.rs
// ============================================================================
// Module: Directory Walker
// Description: Deterministic fixture enumeration under a scan root.
// Purpose: Produce ordered fixture and directory lists for suite generation.
// Dependencies: cap-std
// ============================================================================

//! ## Overview
//! The walker visits a directory tree depth-first, ordering siblings by the
//! bytes of their names, and applies a [`PatternMatcher`] to every regular
//! file. Symlinks and special files are treated as absent. Paths in the
//! output are relative to the scan root and always use `/` separators; the
//! root itself is the empty string.
//!
//! Unreadable directories abort the walk, as do non-UTF-8 names that could
//! be a fixture or a directory the walk must enter: a fixture that cannot be
//! listed or named must not silently drop out of a suite. Other non-UTF-8
//! names are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::hash::Hash;
use std::hash::Hasher;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::error::ScanError;
use crate::matcher::Classification;
use crate::matcher::PatternMatcher;
use crate::matcher::file_name_of;

// ============================================================================
// SECTION: Fixture File
// ============================================================================

/// A fixture selected by the walker.
///
/// # Invariants
/// - Equality, ordering, and hashing use `relative_path` only.
#[derive(Debug, Clone)]
pub struct FixtureFile {
    /// Path relative to the scan root.
    pub relative_path: String,
    /// Final path segment.
    pub file_name: String,
    /// Name used to derive the leaf identifier.
    pub base_name: String,
    /// Parent directory relative to the scan root (`""` for the root).
    pub parent_directory: String,
}

impl PartialEq for FixtureFile {
    fn eq(&self, other: &Self) -> bool {
        self.relative_path == other.relative_path
    }
}

impl Eq for FixtureFile {}

impl PartialOrd for FixtureFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FixtureFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relative_path.cmp(&other.relative_path)
    }
}

impl Hash for FixtureFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative_path.hash(state);
    }
}

// ============================================================================
// SECTION: Walk Output
// ============================================================================

/// Ordered result of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutput {
    /// Fixtures in traversal order.
    pub fixtures: Vec<FixtureFile>,
    /// Every traversed directory in traversal order, starting with the walk start.
    pub directories: Vec<String>,
}

// ============================================================================
// SECTION: Directory Walker
// ============================================================================

/// Fixture enumerator bound to a compiled match rule.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryWalker<'a> {
    /// Classifier applied to each regular file.
    matcher: &'a PatternMatcher,
    /// Whether subdirectories are visited.
    recursive: bool,
}

impl<'a> DirectoryWalker<'a> {
    /// Creates a recursive walker.
    #[must_use]
    pub const fn new(matcher: &'a PatternMatcher) -> Self {
        Self {
            matcher,
            recursive: true,
        }
    }

    /// Creates a walker that only lists the start directory's own files.
    #[must_use]
    pub const fn non_recursive(matcher: &'a PatternMatcher) -> Self {
        Self {
            matcher,
            recursive: false,
        }
    }

    /// Walks the whole scan root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when the root is missing, a directory cannot be
    /// read, or a name that could matter is not UTF-8.
    pub fn walk(&self, root: &Path) -> Result<WalkOutput, ScanError> {
        self.walk_at(root, "")
    }

    /// Walks starting at `relative_dir` beneath the scan root.
    ///
    /// Fixture paths stay relative to `root`, so excluded-path entries match
    /// the same way regardless of where the walk starts.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MissingDirectory`] when the start directory does
    /// not exist, and other [`ScanError`] variants as for [`Self::walk`].
    pub fn walk_at(&self, root: &Path, relative_dir: &str) -> Result<WalkOutput, ScanError> {
        let start = join_relative(root, relative_dir);
        let dir = open_start(&start)?;
        let mut output = WalkOutput::default();
        self.visit(&dir, &start, relative_dir, &mut output)?;
        Ok(output)
    }

    /// Lists the immediate subdirectories of `relative_dir` by name.
    ///
    /// Excluded names, symlinks, and special files are skipped. The walker's
    /// recursion setting does not apply: every listed directory is one a
    /// caller may enter.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] as for [`Self::walk_at`].
    pub fn child_directories(
        &self,
        root: &Path,
        relative_dir: &str,
    ) -> Result<Vec<String>, ScanError> {
        let start = join_relative(root, relative_dir);
        let dir = open_start(&start)?;
        let mut children = Vec::new();
        for (name, kind) in self.sorted_entries(&dir, &start, true)? {
            if kind == EntryKind::Directory
                && !self.matcher.is_excluded_name(&join_segment(relative_dir, &name))
            {
                children.push(name);
            }
        }
        Ok(children)
    }

    /// Visits one directory and, when recursive, its subdirectories.
    fn visit(
        &self,
        dir: &Dir,
        absolute: &Path,
        relative: &str,
        output: &mut WalkOutput,
    ) -> Result<(), ScanError> {
        output.directories.push(relative.to_string());
        for (name, kind) in self.sorted_entries(dir, absolute, self.recursive)? {
            let child_relative = join_segment(relative, &name);
            match kind {
                EntryKind::File => {
                    if let Classification::Fixture {
                        base_name,
                    } = self.matcher.classify(&child_relative)
                    {
                        output.fixtures.push(FixtureFile {
                            relative_path: child_relative,
                            file_name: name,
                            base_name,
                            parent_directory: relative.to_string(),
                        });
                    }
                }
                EntryKind::Directory => {
                    if !self.recursive || self.matcher.is_excluded_name(&child_relative) {
                        continue;
                    }
                    let child_absolute = absolute.join(&name);
                    let child = dir.open_dir(&name).map_err(|err| {
                        ScanError::UnreadableDirectory {
                            path: child_absolute.clone(),
                            reason: err.to_string(),
                        }
                    })?;
                    self.visit(&child, &child_absolute, &child_relative, output)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Entry Listing
// ============================================================================

/// Entry kinds the walker acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    /// Regular file.
    File,
    /// Directory (never a symlink to one).
    Directory,
}

/// Opens the directory a walk or listing starts from.
fn open_start(start: &Path) -> Result<Dir, ScanError> {
    match Dir::open_ambient_dir(start, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(ScanError::MissingDirectory(start.to_path_buf()))
        }
        Err(err) => Err(ScanError::UnreadableDirectory {
            path: start.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

impl DirectoryWalker<'_> {
    /// Lists regular files and directories sorted by name bytes.
    ///
    /// A non-UTF-8 name fails the listing only when it could matter: a file
    /// whose lossily decoded name matches the include pattern, or a directory
    /// when `enter_directories` is set.
    fn sorted_entries(
        &self,
        dir: &Dir,
        absolute: &Path,
        enter_directories: bool,
    ) -> Result<Vec<(String, EntryKind)>, ScanError> {
        let unreadable = |err: std::io::Error| ScanError::UnreadableDirectory {
            path: absolute.to_path_buf(),
            reason: err.to_string(),
        };
        let mut entries = Vec::new();
        for entry in dir.entries().map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let file_type = entry.file_type().map_err(unreadable)?;
            if file_type.is_symlink() {
                continue;
            }
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };
            match entry.file_name().into_string() {
                Ok(name) => entries.push((name, kind)),
                Err(raw) if self.non_utf8_matters(&raw, kind, enter_directories) => {
                    return Err(ScanError::NonUtf8Name(absolute.join(raw)));
                }
                Err(_) => {}
            }
        }
        entries.sort_by(|lhs, rhs| lhs.0.as_bytes().cmp(rhs.0.as_bytes()));
        Ok(entries)
    }

    /// Returns true when a non-UTF-8 entry could be a fixture or must be entered.
    fn non_utf8_matters(&self, raw: &OsStr, kind: EntryKind, enter_directories: bool) -> bool {
        match kind {
            EntryKind::File => self.matcher.include_may_match(&raw.to_string_lossy()),
            EntryKind::Directory => enter_directories,
        }
    }
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Appends a name to a `/`-separated relative path.
pub(crate) fn join_segment(relative: &str, name: &str) -> String {
    if relative.is_empty() { name.to_string() } else { format!("{relative}/{name}") }
}

/// Resolves a `/`-separated relative path beneath `root`.
pub(crate) fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative.split('/').filter(|segment| !segment.is_empty()).fold(
        root.to_path_buf(),
        |mut path, segment| {
            path.push(segment);
            path
        },
    )
}

/// Returns the final segment of a relative directory path.
pub(crate) fn directory_name(relative: &str) -> &str {
    file_name_of(relative)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
