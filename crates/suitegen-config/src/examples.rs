// crates/suitegen-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Seed new projects with a valid suitegen.toml.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example is a static template that must always pass validation; the
//! config tests load it to keep it honest.

/// Returns a canonical example `suitegen.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[output]
dir = "generated/suitegen"

[runner]
command = ["analyze", "--fixture", "{fixture}"]
jobs = 4

[events]
sink = "stderr"

[[suites]]
name = "Diagnostics"
root = "testData/diagnostics"
include = '^(.+)\.kt$'
exclude = '^(.+)\.fir\.kts?$'
excluded_names = ["README.kt", "helpers"]
display_name = "identifier"

[[suites]]
name = "BoxTests"
root = "testData/box"
include = '^(.+)\.kt$'
backend = "jvm"
backend_tags = ["jvm", "js", "native", "wasm"]
display_name = "file_name"
"#,
    )
}
