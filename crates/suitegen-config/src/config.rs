// crates/suitegen-config/src/config.rs
// ============================================================================
// Module: Suitegen Configuration
// Description: Configuration loading and validation for suitegen.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: suitegen-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `SUITEGEN_CONFIG`, then
//! `suitegen.toml` in the working directory. Missing or invalid
//! configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use suitegen_core::DisplayNameRule;
use suitegen_core::MatchRule;
use suitegen_core::SuiteGenerator;
use suitegen_core::sanitizer::identifier_body;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "suitegen.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SUITEGEN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured suites.
pub(crate) const MAX_SUITES: usize = 256;
/// Maximum length of a suite name.
pub(crate) const MAX_SUITE_NAME_LENGTH: usize = 128;
/// Maximum number of excluded names per suite.
pub(crate) const MAX_EXCLUDED_NAMES: usize = 1024;
/// Maximum number of backend tags per suite.
pub(crate) const MAX_BACKEND_TAGS: usize = 64;
/// Maximum length of a regex pattern.
pub(crate) const MAX_PATTERN_LENGTH: usize = 1024;
/// Maximum runner worker threads.
pub(crate) const MAX_RUNNER_JOBS: usize = 256;
/// Maximum runner command words.
pub(crate) const MAX_COMMAND_WORDS: usize = 256;

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Top-level `suitegen.toml` model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitegenConfig {
    /// Generated suites.
    #[serde(default)]
    pub suites: Vec<SuiteConfig>,
    /// Artifact output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Run-time settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Event sink settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Directory relative paths resolve against (not serialized).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One `[[suites]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Root suite identifier; also the artifact file stem.
    pub name: String,
    /// Scan root, relative to the config file.
    pub root: String,
    /// Full-name include pattern.
    pub include: String,
    /// Full-name exclude pattern.
    #[serde(default)]
    pub exclude: Option<String>,
    /// Names or relative paths permitted to exist untested.
    #[serde(default)]
    pub excluded_names: Vec<String>,
    /// Backend the suite runs against.
    #[serde(default)]
    pub backend: Option<String>,
    /// Known backend variant tags.
    #[serde(default)]
    pub backend_tags: Vec<String>,
    /// Leaf labelling rule.
    #[serde(default)]
    pub display_name: DisplayNameRule,
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Artifact directory, relative to the config file.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executor program and arguments; `{fixture}` marks the bound path.
    #[serde(default)]
    pub command: Vec<String>,
    /// Worker thread count.
    #[serde(default = "default_runner_jobs")]
    pub jobs: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            jobs: default_runner_jobs(),
        }
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `events.path`.
    File,
    /// Events are discarded.
    #[default]
    None,
}

/// `[events]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Log file path for the `file` sink, relative to the config file.
    #[serde(default)]
    pub path: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SuitegenConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = read_bounded(&resolved)?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let base_dir = resolved
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::from_toml_str(content, base_dir)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str, base_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.base_dir = base_dir;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.suites.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[suites]] entry is required".to_string(),
            ));
        }
        if self.suites.len() > MAX_SUITES {
            return Err(ConfigError::Invalid("too many suites".to_string()));
        }
        let mut names = BTreeSet::new();
        for suite in &self.suites {
            suite.validate()?;
            if !names.insert(suite.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate suite name: {}", suite.name)));
            }
        }
        self.output.validate()?;
        self.runner.validate()?;
        self.events.validate()
    }

    /// Resolves a config-relative path against the config directory.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }

    /// Returns the resolved artifact output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.dir)
    }

    /// Returns the resolved event log path for the `file` sink.
    #[must_use]
    pub fn events_path(&self) -> Option<PathBuf> {
        self.events.path.as_deref().map(|path| self.resolve(path))
    }

    /// Finds a suite by name.
    #[must_use]
    pub fn suite(&self, name: &str) -> Option<&SuiteConfig> {
        self.suites.iter().find(|suite| suite.name == name)
    }

    /// Builds the generator for one suite.
    #[must_use]
    pub fn generator(&self, suite: &SuiteConfig) -> SuiteGenerator {
        SuiteGenerator::new(suite.name.clone(), self.resolve(&suite.root), suite.match_rule())
            .with_root_label(suite.root.clone())
            .with_display(suite.display_name)
    }

    /// Builds generators for every suite, in file order.
    #[must_use]
    pub fn generators(&self) -> Vec<SuiteGenerator> {
        self.suites.iter().map(|suite| self.generator(suite)).collect()
    }
}

impl SuiteConfig {
    /// Returns the match rule described by this entry.
    #[must_use]
    pub fn match_rule(&self) -> MatchRule {
        let mut rule = MatchRule::new(self.include.clone());
        rule.exclude_pattern.clone_from(&self.exclude);
        rule.excluded_names = self.excluded_names.iter().cloned().collect();
        rule.backend.clone_from(&self.backend);
        rule.backend_tags = self.backend_tags.iter().cloned().collect();
        rule
    }

    /// Validates one suite entry.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("suites.name must be non-empty".to_string()));
        }
        if name.len() > MAX_SUITE_NAME_LENGTH {
            return Err(ConfigError::Invalid(format!("suites.name too long: {name}")));
        }
        if identifier_body(&self.name) != self.name {
            return Err(ConfigError::Invalid(format!(
                "suites.name must be an identifier starting with an uppercase letter or `_`: {}",
                self.name
            )));
        }
        let field = |suffix: &str| format!("suites.{}.{suffix}", self.name);
        validate_path_string(&field("root"), &self.root)?;
        let patterns = std::iter::once(("include", &self.include))
            .chain(self.exclude.iter().map(|pattern| ("exclude", pattern)));
        for (label, pattern) in patterns {
            if pattern.is_empty() || pattern.len() > MAX_PATTERN_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "{} must be 1..={MAX_PATTERN_LENGTH} bytes",
                    field(label)
                )));
            }
        }
        self.match_rule()
            .compile()
            .map_err(|err| ConfigError::Invalid(format!("suites.{}: {err}", self.name)))?;

        if self.excluded_names.len() > MAX_EXCLUDED_NAMES {
            return Err(ConfigError::Invalid(format!(
                "{} has too many entries",
                field("excluded_names")
            )));
        }
        for entry in &self.excluded_names {
            validate_excluded_name(&field("excluded_names"), entry)?;
        }

        if self.backend_tags.len() > MAX_BACKEND_TAGS {
            return Err(ConfigError::Invalid(format!(
                "{} has too many entries",
                field("backend_tags")
            )));
        }
        for tag in &self.backend_tags {
            if tag.is_empty() || tag.contains(['.', '/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "{} entries must be non-empty and contain no `.` or separators: {tag}",
                    field("backend_tags")
                )));
            }
        }
        if let Some(backend) = &self.backend
            && !self.backend_tags.iter().any(|tag| tag.eq_ignore_ascii_case(backend))
        {
            return Err(ConfigError::Invalid(format!(
                "{} `{backend}` must be listed in backend_tags",
                field("backend")
            )));
        }
        Ok(())
    }
}

impl OutputConfig {
    /// Validates the output section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("output.dir", &self.dir)
    }
}

impl RunnerConfig {
    /// Validates the runner section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 || self.jobs > MAX_RUNNER_JOBS {
            return Err(ConfigError::Invalid(format!(
                "runner.jobs must be between 1 and {MAX_RUNNER_JOBS}"
            )));
        }
        if self.command.len() > MAX_COMMAND_WORDS {
            return Err(ConfigError::Invalid("runner.command has too many words".to_string()));
        }
        if self.command.iter().any(|word| word.is_empty()) {
            return Err(ConfigError::Invalid("runner.command words must be non-empty".to_string()));
        }
        Ok(())
    }
}

impl EventsConfig {
    /// Validates the events section.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (EventSinkKind::File, None) => {
                Err(ConfigError::Invalid("events.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("events.path", path),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Reads at most [`MAX_CONFIG_FILE_SIZE`] bytes, failing when the file is larger.
fn read_bounded(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let oversized = || ConfigError::Invalid("config file exceeds size limit".to_string());
    let limit = u64::try_from(MAX_CONFIG_FILE_SIZE).unwrap_or(u64::MAX);
    let file = File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    let metadata = file.metadata().map_err(|err| ConfigError::Io(err.to_string()))?;
    if metadata.len() > limit {
        return Err(oversized());
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(oversized());
    }
    Ok(bytes)
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an excluded name or scan-root-relative path.
fn validate_excluded_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    if value.contains('\\') {
        return Err(ConfigError::Invalid(format!("{field} must use `/` separators: {value}")));
    }
    for component in Path::new(value).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(ConfigError::Invalid(format!(
                "{field} must be a relative path without `.` or `..`: {value}"
            )));
        }
    }
    Ok(())
}

/// Default artifact directory.
fn default_output_dir() -> String {
    String::from("generated/suitegen")
}

/// Default runner worker count.
const fn default_runner_jobs() -> usize {
    1
}
