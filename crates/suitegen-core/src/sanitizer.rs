// crates/suitegen-core/src/sanitizer.rs
// ============================================================================
// Module: Identifier Sanitizer
// Description: Maps filesystem names to unique, legal suite and test names.
// Purpose: Give every fixture and directory a stable identifier.
// Dependencies: crate::hashing
// ============================================================================

//! ## Overview
//! A name becomes an identifier body by replacing every character outside
//! `[A-Za-z0-9_]` with `_`, prefixing `_` when the result would start with a
//! digit, and uppercasing the first character. Leaf tests are named
//! `test<Body>`, child suites `<Body>`, and each node's presence check
//! `testAllFilesPresentIn<Body>`.
//!
//! ### Collision Rule
//! Identifiers are assigned per sibling set and depend only on the set, never
//! on arrival order:
//! - a plain identifier claimed by exactly one sibling is kept;
//! - when several siblings claim it, the one whose base name already equals the identifier body
//!   keeps it, provided there is exactly one such sibling;
//! - every other claimant gets `_<h>` appended, where `<h>` is the first eight hex digits of the
//!   SHA-256 digest of its full original name.
//!
//! A suffixed identifier that still collides fails generation with
//! [`GenerationError::IdentifierCollision`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::GenerationError;
use crate::hashing::DEFAULT_HASH_ALGORITHM;
use crate::hashing::hash_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of every leaf test identifier.
pub const LEAF_PREFIX: &str = "test";

/// Prefix of every presence check identifier.
pub const PRESENCE_CHECK_PREFIX: &str = "testAllFilesPresentIn";

/// Replacement for characters outside the identifier alphabet.
pub const SUBSTITUTE: char = '_';

/// Hex digits taken from the name digest for disambiguation.
pub const SUFFIX_HEX_DIGITS: usize = 8;

// ============================================================================
// SECTION: Identifier Kinds
// ============================================================================

/// Namespace an identifier is assigned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Leaf test under a suite node.
    LeafTest,
    /// Child suite under a suite node.
    Suite,
}

impl IdentifierKind {
    /// Decorates an identifier body for this namespace.
    #[must_use]
    pub fn decorate(self, body: &str) -> String {
        match self {
            Self::LeafTest => format!("{LEAF_PREFIX}{body}"),
            Self::Suite => body.to_string(),
        }
    }
}

/// One sibling awaiting an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingName<'a> {
    /// Full original name (file name with extension, or directory name).
    pub full_name: &'a str,
    /// Name the identifier body is derived from.
    pub base_name: &'a str,
}

// ============================================================================
// SECTION: Body Sanitization
// ============================================================================

/// Converts a name into an identifier body.
///
/// # Examples
/// ```
/// use suitegen_core::sanitizer::identifier_body;
///
/// assert_eq!(identifier_body("localClassType"), "LocalClassType");
/// assert_eq!(identifier_body("kotlin-test"), "Kotlin_test");
/// assert_eq!(identifier_body("1st"), "_1st");
/// ```
#[must_use]
pub fn identifier_body(name: &str) -> String {
    let mut body: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { SUBSTITUTE })
        .collect();
    if body.is_empty() || body.starts_with(|ch: char| ch.is_ascii_digit()) {
        body.insert(0, SUBSTITUTE);
    }
    let mut chars = body.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => body,
    }
}

/// Returns the presence check identifier for a node body.
#[must_use]
pub fn presence_check_identifier(body: &str) -> String {
    format!("{PRESENCE_CHECK_PREFIX}{body}")
}

/// Returns the disambiguating suffix for a full original name.
#[must_use]
pub fn disambiguation_suffix(full_name: &str) -> String {
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, full_name.as_bytes());
    format!("{SUBSTITUTE}{}", digest.short(SUFFIX_HEX_DIGITS))
}

// ============================================================================
// SECTION: Sibling Assignment
// ============================================================================

/// Assigns identifiers to one sibling set.
///
/// `reserved` holds identifiers already taken in the same namespace (the
/// presence check, for leaf tests). The result is aligned with `siblings`.
///
/// # Errors
///
/// Returns [`GenerationError::IdentifierCollision`] when two siblings, or a
/// sibling and a reserved identifier, still share an identifier after
/// disambiguation.
pub fn assign_identifiers(
    parent: &str,
    kind: IdentifierKind,
    siblings: &[SiblingName<'_>],
    reserved: &BTreeSet<String>,
) -> Result<Vec<String>, GenerationError> {
    let bodies: Vec<String> =
        siblings.iter().map(|sibling| identifier_body(sibling.base_name)).collect();
    let mut claims: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, body) in bodies.iter().enumerate() {
        claims.entry(kind.decorate(body)).or_default().push(index);
    }

    let mut assigned = vec![String::new(); siblings.len()];
    for (plain, claimants) in &claims {
        let keeper = if reserved.contains(plain) {
            None
        } else if let [only] = claimants.as_slice() {
            Some(*only)
        } else {
            let verbatim: Vec<usize> = claimants
                .iter()
                .copied()
                .filter(|index| siblings[*index].base_name == bodies[*index])
                .collect();
            if let [only] = verbatim.as_slice() { Some(*only) } else { None }
        };
        for index in claimants {
            assigned[*index] = if Some(*index) == keeper {
                plain.clone()
            } else {
                format!("{plain}{}", disambiguation_suffix(siblings[*index].full_name))
            };
        }
    }

    ensure_unique(parent, siblings, &assigned, reserved)?;
    Ok(assigned)
}

/// Fails when any identifier is claimed twice.
fn ensure_unique(
    parent: &str,
    siblings: &[SiblingName<'_>],
    assigned: &[String],
    reserved: &BTreeSet<String>,
) -> Result<(), GenerationError> {
    let mut owners: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for identifier in reserved {
        owners.entry(identifier.as_str()).or_default().push(format!("<reserved {identifier}>"));
    }
    for (sibling, identifier) in siblings.iter().zip(assigned) {
        owners.entry(identifier.as_str()).or_default().push(sibling.full_name.to_string());
    }
    match owners.into_iter().find(|(_, names)| names.len() > 1) {
        Some((identifier, names)) => Err(GenerationError::IdentifierCollision {
            parent: parent.to_string(),
            identifier: identifier.to_string(),
            names,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
