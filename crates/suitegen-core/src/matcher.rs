// crates/suitegen-core/src/matcher.rs
// ============================================================================
// Module: Pattern Matcher
// Description: Include/exclude classification of fixture candidates.
// Purpose: Decide, from a name alone, whether a file is a fixture.
// Dependencies: regex, serde
// ============================================================================

//! ## Overview
//! A [`MatchRule`] is the serializable description of which files are
//! fixtures; [`PatternMatcher`] is its compiled form. Classification is pure:
//! it never touches the filesystem and always yields the same answer for the
//! same relative path.
//!
//! Patterns must match the whole file name. The first capture group of the
//! include pattern, when present, is the fixture's base name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::error::PatternError;

// ============================================================================
// SECTION: Match Rule
// ============================================================================

/// Serializable fixture selection rule.
///
/// # Invariants
/// - `include_pattern` is required; every name either matches it or not.
/// - `exclude_pattern` is only consulted for names that match `include_pattern`.
/// - Entries in `excluded_names` containing `/` are relative paths from the scan root; other
///   entries match a bare file or directory name at any depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Full-name pattern selecting fixture files.
    pub include_pattern: String,
    /// Full-name pattern removing files the include pattern selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<String>,
    /// Names permitted to exist without being tested.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_names: BTreeSet<String>,
    /// Backend the suite is generated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Known backend tags used as `<base>.<tag>.<ext>` variant suffixes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub backend_tags: BTreeSet<String>,
}

impl MatchRule {
    /// Creates a rule with only an include pattern.
    #[must_use]
    pub fn new(include_pattern: impl Into<String>) -> Self {
        Self {
            include_pattern: include_pattern.into(),
            exclude_pattern: None,
            excluded_names: BTreeSet::new(),
            backend: None,
            backend_tags: BTreeSet::new(),
        }
    }

    /// Sets the exclude pattern.
    #[must_use]
    pub fn with_exclude(mut self, exclude_pattern: impl Into<String>) -> Self {
        self.exclude_pattern = Some(exclude_pattern.into());
        self
    }

    /// Adds a name or relative path that is never treated as a fixture.
    #[must_use]
    pub fn with_excluded_name(mut self, name: impl Into<String>) -> Self {
        self.excluded_names.insert(name.into());
        self
    }

    /// Selects a backend and declares the known backend tags.
    #[must_use]
    pub fn with_backend<I, S>(mut self, backend: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backend = Some(backend.into());
        self.backend_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Compiles the rule into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when either pattern is not a valid regex.
    pub fn compile(&self) -> Result<PatternMatcher, PatternError> {
        let include = compile_full_match(&self.include_pattern)?;
        let exclude = self.exclude_pattern.as_deref().map(compile_full_match).transpose()?;
        Ok(PatternMatcher {
            rule: self.clone(),
            include,
            exclude,
        })
    }
}

/// Compiles a pattern anchored to the whole candidate name.
fn compile_full_match(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| PatternError {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Why a candidate is not a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The name does not match the include pattern.
    PatternMismatch,
    /// The name matches the exclude pattern.
    ExcludePattern,
    /// The name or path is on the explicit exclusion list.
    ExcludedName,
    /// The file is a variant for another backend.
    ForeignBackend(String),
}

/// Result of classifying one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The candidate is a fixture with the given base name.
    Fixture {
        /// Name used to derive the leaf identifier.
        base_name: String,
    },
    /// The candidate is not a fixture.
    Rejected(Rejection),
}

impl Classification {
    /// Returns true for fixtures.
    #[must_use]
    pub const fn is_fixture(&self) -> bool {
        matches!(self, Self::Fixture { .. })
    }
}

// ============================================================================
// SECTION: Pattern Matcher
// ============================================================================

/// Compiled [`MatchRule`].
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    /// Rule this matcher was compiled from.
    rule: MatchRule,
    /// Anchored include pattern.
    include: Regex,
    /// Anchored exclude pattern.
    exclude: Option<Regex>,
}

impl PatternMatcher {
    /// Returns the source rule.
    #[must_use]
    pub const fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Classifies a file by its path relative to the scan root.
    #[must_use]
    pub fn classify(&self, relative_path: &str) -> Classification {
        let file_name = file_name_of(relative_path);
        let Some(captures) = self.include.captures(file_name) else {
            return Classification::Rejected(Rejection::PatternMismatch);
        };
        if self.exclude.as_ref().is_some_and(|exclude| exclude.is_match(file_name)) {
            return Classification::Rejected(Rejection::ExcludePattern);
        }
        if self.is_excluded_name(relative_path) {
            return Classification::Rejected(Rejection::ExcludedName);
        }
        let base_name = captures
            .get(1)
            .map(|group| group.as_str())
            .filter(|group| !group.is_empty())
            .unwrap_or_else(|| strip_extension(file_name))
            .to_string();
        if let Some(tag) = self.foreign_backend_tag(&base_name) {
            return Classification::Rejected(Rejection::ForeignBackend(tag));
        }
        Classification::Fixture {
            base_name,
        }
    }

    /// Returns true when the file at `relative_path` is a fixture.
    #[must_use]
    pub fn is_fixture(&self, relative_path: &str) -> bool {
        self.classify(relative_path).is_fixture()
    }

    /// Returns true when the include pattern matches `file_name`.
    ///
    /// Used for names that are only available lossily decoded, so a match
    /// means the file might be a fixture rather than that it is one.
    pub(crate) fn include_may_match(&self, file_name: &str) -> bool {
        self.include.is_match(file_name)
    }

    /// Returns true when a file or directory is on the exclusion list.
    #[must_use]
    pub fn is_excluded_name(&self, relative_path: &str) -> bool {
        let name = file_name_of(relative_path);
        self.rule.excluded_names.iter().any(|entry| {
            if entry.contains('/') {
                entry.trim_end_matches('/') == relative_path
            } else {
                entry == name
            }
        })
    }

    /// Returns the backend tag when `base_name` is a variant for another backend.
    fn foreign_backend_tag(&self, base_name: &str) -> Option<String> {
        let backend = self.rule.backend.as_deref()?;
        let (_, tag) = base_name.rsplit_once('.')?;
        let known = self.rule.backend_tags.iter().any(|known| known.eq_ignore_ascii_case(tag));
        (known && !tag.eq_ignore_ascii_case(backend)).then(|| tag.to_string())
    }
}

// ============================================================================
// SECTION: Name Helpers
// ============================================================================

/// Returns the final `/`-separated segment.
pub(crate) fn file_name_of(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

/// Removes the final extension, keeping dotfiles intact.
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[.. index],
        _ => file_name,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
