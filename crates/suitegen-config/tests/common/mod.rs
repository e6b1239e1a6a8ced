// crates/suitegen-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared builders for suitegen-config integration tests.
// Purpose: Keep individual tests focused on one constraint each.
// =============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers.")]

use std::path::PathBuf;

use suitegen_config::ConfigError;
use suitegen_config::SuitegenConfig;

/// Result type shared by config tests.
pub type TestResult = Result<(), String>;

/// Minimal valid configuration text.
pub const MINIMAL_TOML: &str = r#"
[[suites]]
name = "Diagnostics"
root = "testData/diagnostics"
include = '^(.+)\.kt$'
"#;

/// Parses configuration text against a fixed base directory.
pub fn parse(content: &str) -> Result<SuitegenConfig, ConfigError> {
    SuitegenConfig::from_toml_str(content, PathBuf::from("/work"))
}

/// Asserts that a result is an error whose message contains `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

/// Returns minimal configuration text with an extra suite-level line.
pub fn suite_with(extra: &str) -> String {
    format!("{MINIMAL_TOML}{extra}\n")
}
