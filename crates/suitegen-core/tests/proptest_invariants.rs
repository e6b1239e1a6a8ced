// crates/suitegen-core/tests/proptest_invariants.rs
// ============================================================================
// Module: Naming and Drift Property-Based Tests
// Description: Property tests for identifier injectivity and drift soundness.
// Purpose: Detect collisions and missed drift across wide input ranges.
// ============================================================================

//! Property-based tests for sanitizer and verifier invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use suitegen_core::PresenceOutcome;
use suitegen_core::compare_fixture_sets;
use suitegen_core::sanitizer::IdentifierKind;
use suitegen_core::sanitizer::SiblingName;
use suitegen_core::sanitizer::assign_identifiers;
use suitegen_core::sanitizer::identifier_body;

/// File names drawn from an alphabet that produces frequent body collisions.
fn file_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[aA1_.-]{1,4}\\.kt", 1 .. 12)
}

/// Small fixture-name sets sharing one alphabet.
fn fixture_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-d]{1,2}\\.kt", 0 .. 8)
}

/// Strips the final extension the same way the default matcher does.
fn base_of(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(base, _)| base)
}

proptest! {
    #[test]
    fn identifiers_are_unique_legal_and_order_independent(names in file_names()) {
        let ordered: Vec<&String> = names.iter().collect();
        let siblings: Vec<SiblingName<'_>> = ordered
            .iter()
            .map(|name| SiblingName { full_name: name.as_str(), base_name: base_of(name) })
            .collect();
        let reserved = BTreeSet::from(["testAllFilesPresentInDir".to_string()]);
        let forward = assign_identifiers("dir", IdentifierKind::LeafTest, &siblings, &reserved)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let unique: BTreeSet<&String> = forward.iter().collect();
        prop_assert_eq!(unique.len(), forward.len());
        prop_assert!(!forward.iter().any(|identifier| reserved.contains(identifier)));
        for identifier in &forward {
            prop_assert!(identifier.starts_with("test"));
            prop_assert!(identifier.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        }

        let mut reversed_siblings = siblings.clone();
        reversed_siblings.reverse();
        let mut reversed = assign_identifiers(
            "dir",
            IdentifierKind::LeafTest,
            &reversed_siblings,
            &reserved,
        )
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
        reversed.reverse();
        prop_assert_eq!(forward, reversed);
    }

    #[test]
    fn identifier_body_is_idempotent(name in ".{0,12}") {
        let body = identifier_body(&name);
        prop_assert_eq!(identifier_body(&body), body.clone());
        prop_assert!(!body.is_empty());
        prop_assert!(!body.starts_with(|ch: char| ch.is_ascii_digit()));
    }

    #[test]
    fn drift_is_detected_iff_sets_differ(live in fixture_set(), snapshot in fixture_set()) {
        match compare_fixture_sets(&live, &snapshot) {
            PresenceOutcome::Pass => prop_assert_eq!(&live, &snapshot),
            PresenceOutcome::DriftDetected { added, missing } => {
                prop_assert_ne!(&live, &snapshot);
                prop_assert!(added.iter().all(|name| live.contains(name) && !snapshot.contains(name)));
                prop_assert!(missing.iter().all(|name| snapshot.contains(name) && !live.contains(name)));
                let rebuilt: BTreeSet<String> = snapshot
                    .difference(&missing)
                    .chain(added.iter())
                    .cloned()
                    .collect();
                prop_assert_eq!(rebuilt, live);
            }
        }
    }
}
