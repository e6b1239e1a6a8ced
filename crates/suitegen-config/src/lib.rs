// crates/suitegen-config/src/lib.rs
// ============================================================================
// Module: Suitegen Config Library
// Description: Canonical configuration model and validation for suitegen.
// Purpose: Single source of truth for suitegen.toml semantics.
// Dependencies: suitegen-core, serde, toml
// ============================================================================

//! ## Overview
//! `suitegen-config` loads `suitegen.toml`, validates it fail-closed, and turns
//! each `[[suites]]` entry into a [`suitegen_core::SuiteGenerator`]. Relative
//! paths in the file resolve against the directory that contains it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
