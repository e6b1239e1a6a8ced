// crates/suitegen-core/src/emitter/tests.rs
// ============================================================================
// Module: Suite Emitter Unit Tests
// Description: Suite tree shape, naming, and binding coverage.
// Purpose: Ensure emitted suites mirror the directory tree exactly.
// Dependencies: suitegen-core, tempfile
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use super::DisplayNameRule;
use super::SuiteGenerator;
use crate::error::GenerationError;
use crate::matcher::MatchRule;

/// Creates an empty file, including parent directories.
fn touch(root: &Path, relative: &str) -> std::io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "")
}

/// Include rule for `.kt` fixtures.
fn kotlin_rule() -> MatchRule {
    MatchRule::new(r"(.+)\.kt")
}

#[test]
fn flat_directory_emits_one_leaf_per_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("diagnostics");
    for name in [
        "typeAliasForFunctionalType1.kt",
        "localClassType.kt",
        "localNestedClassType.kt",
        "localClassWithTypeArgumentsType.kt",
    ] {
        touch(&root, name)?;
    }
    let document = SuiteGenerator::new("Diagnostics", &root, kotlin_rule())
        .with_root_label("testData/diagnostics")
        .generate()?;
    let suite = &document.suite;

    let identifiers: Vec<&str> =
        suite.leaf_tests.iter().map(|leaf| leaf.identifier.as_str()).collect();
    assert_eq!(
        identifiers,
        vec![
            "testLocalClassType",
            "testLocalClassWithTypeArgumentsType",
            "testLocalNestedClassType",
            "testTypeAliasForFunctionalType1",
        ]
    );
    assert_eq!(suite.presence_check.identifier, "testAllFilesPresentInDiagnostics");
    assert_eq!(suite.presence_check.fixture_snapshot.len(), 4);
    assert_eq!(suite.leaf_tests[0].bound_path, "testData/diagnostics/localClassType.kt");
    assert!(suite.presence_check.run(&root)?.is_pass());
    Ok(())
}

#[test]
fn excluded_variants_are_absent_from_leaves_and_snapshot() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "Foo.kt")?;
    touch(dir.path(), "Foo.fir.kt")?;
    let rule = MatchRule::new(r"^(.+)\.kt$").with_exclude(r"^(.+)\.fir\.kts?$");
    let document = SuiteGenerator::new("Scripts", dir.path(), rule).generate()?;

    let identifiers: Vec<&str> =
        document.suite.leaf_tests.iter().map(|leaf| leaf.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["testFoo"]);
    assert_eq!(
        document.suite.presence_check.fixture_snapshot,
        BTreeSet::from(["Foo.kt".to_string()])
    );
    Ok(())
}

#[test]
fn nested_directories_become_nested_suites() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "top.kt")?;
    touch(dir.path(), "kotlin-test/inner.kt")?;
    touch(dir.path(), "kotlin-test/deeper/leaf.kt")?;
    touch(dir.path(), "empty/notes.txt")?;
    let document = SuiteGenerator::new("Root", dir.path(), kotlin_rule())
        .with_root_label("data")
        .generate()?;
    let suite = &document.suite;

    assert_eq!(suite.child_suites.len(), 1);
    let child = &suite.child_suites[0];
    assert_eq!(child.name, "Kotlin_test");
    assert_eq!(child.qualified_name, "Root.Kotlin_test");
    assert_eq!(child.directory, "kotlin-test");
    assert_eq!(child.presence_check.identifier, "testAllFilesPresentInKotlin_test");
    assert_eq!(child.presence_check.fixture_snapshot, BTreeSet::from(["inner.kt".to_string()]));
    assert_eq!(child.leaf_tests[0].bound_path, "data/kotlin-test/inner.kt");

    let deeper = suite.find("Root.Kotlin_test.Deeper").ok_or("missing nested suite")?;
    assert_eq!(deeper.leaf_tests[0].identifier, "testLeaf");
    assert_eq!(suite.leaf_count(), 3);
    assert_eq!(suite.suite_count(), 3);
    assert!(suite.find("Root.Missing").is_none());
    assert!(suite.find_leaf("Root.Kotlin_test", "testInner").is_some());
    Ok(())
}

#[test]
fn display_rule_controls_leaf_labels() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "my-case.kt")?;
    let generator = SuiteGenerator::new("Cases", dir.path(), kotlin_rule());

    let by_identifier = generator.generate()?;
    assert_eq!(by_identifier.suite.leaf_tests[0].display_name, "testMy_case");

    let by_file = generator.with_display(DisplayNameRule::FileName).generate()?;
    assert_eq!(by_file.suite.leaf_tests[0].display_name, "my-case.kt");
    assert_eq!(by_file.suite.leaf_tests[0].identifier, "testMy_case");
    Ok(())
}

#[test]
fn colliding_file_names_are_disambiguated() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    touch(dir.path(), "Foo-bar.kt")?;
    touch(dir.path(), "Foo_bar.kt")?;
    touch(dir.path(), "x-y.kt")?;
    touch(dir.path(), "x_y.kt")?;
    let document = SuiteGenerator::new("Cases", dir.path(), kotlin_rule()).generate()?;
    let identifiers: BTreeSet<&str> =
        document.suite.leaf_tests.iter().map(|leaf| leaf.identifier.as_str()).collect();
    assert_eq!(identifiers.len(), 4);
    assert!(identifiers.contains("testFoo_bar"));
    assert!(!identifiers.contains("testX_y"));
    Ok(())
}

#[test]
fn empty_root_still_has_a_presence_check() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let document = SuiteGenerator::new("Empty", dir.path(), kotlin_rule()).generate()?;
    assert!(document.suite.leaf_tests.is_empty());
    assert!(document.suite.child_suites.is_empty());
    assert!(document.suite.presence_check.fixture_snapshot.is_empty());
    Ok(())
}

#[test]
fn generation_errors_are_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bad_pattern = SuiteGenerator::new("Cases", dir.path(), MatchRule::new("(")).generate();
    assert!(matches!(bad_pattern, Err(GenerationError::InvalidPattern(_))));

    let missing = SuiteGenerator::new("Cases", dir.path().join("absent"), kotlin_rule()).generate();
    assert!(matches!(missing, Err(GenerationError::Scan(_))));

    let bad_name = SuiteGenerator::new("not a name", dir.path(), kotlin_rule()).generate();
    assert!(matches!(bad_name, Err(GenerationError::InvalidSuite(_))));
    Ok(())
}
