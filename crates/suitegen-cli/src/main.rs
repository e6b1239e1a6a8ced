// crates/suitegen-cli/src/main.rs
// ============================================================================
// Module: Suitegen CLI Entry Point
// Description: Command dispatcher for suite generation and execution.
// Purpose: Expose generate/check/verify/run/list over a suitegen.toml.
// Dependencies: clap, serde, serde_jcs, suitegen-config, suitegen-core, thiserror
// ============================================================================

//! ## Overview
//! The `suitegen` binary loads `suitegen.toml`, writes generated suites to
//! the output directory, checks that committed output is current, and runs
//! persisted suites against the live fixture tree. Run and verify failures
//! print their report and exit non-zero; every other failure prints one
//! error line to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;
pub(crate) mod render;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use suitegen_config::DEFAULT_CONFIG_NAME;
use suitegen_config::EventSinkKind;
use suitegen_config::SuiteConfig;
use suitegen_config::SuitegenConfig;
use suitegen_config::config_toml_example;
use suitegen_core::BundleBuilder;
use suitegen_core::CommandExecutor;
use suitegen_core::EventSink;
use suitegen_core::ExecutionResult;
use suitegen_core::FileEventSink;
use suitegen_core::GeneratedSuite;
use suitegen_core::NoopEventSink;
use suitegen_core::RunMode;
use suitegen_core::RunReport;
use suitegen_core::StderrEventSink;
use suitegen_core::SuiteDocument;
use suitegen_core::SuiteRunner;
use suitegen_core::TestExecutor;
use suitegen_core::bundle::read_document;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "suitegen", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (overrides `SUITEGEN_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan fixture roots and write generated suites.
    Generate(OutputDirArgs),
    /// Fail when generated suites differ from a fresh generation.
    Check(OutputDirArgs),
    /// Run presence checks of persisted suites against the live tree.
    Verify(VerifyCommand),
    /// Run presence checks and leaf tests of persisted suites.
    Run(RunCommand),
    /// List persisted suites and their leaf tests.
    List(ListCommand),
    /// Write an example config file.
    Init(InitCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config, then exit.
    Validate,
}

/// Output directory override shared by artifact commands.
#[derive(Args, Debug, Clone, Default)]
struct OutputDirArgs {
    /// Output directory for generated suites (defaults to `[output] dir`).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
}

/// Suite selection shared by verify, run, and list.
#[derive(Args, Debug, Clone, Default)]
struct SelectionArgs {
    /// Configured suite name.
    #[arg(long, value_name = "NAME")]
    suite: Option<String>,
    /// Qualified name of a nested suite, e.g. `Diagnostics.Nested`.
    #[arg(long, value_name = "QUALIFIED")]
    select: Option<String>,
}

/// Output rendering format.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Canonical JSON.
    Json,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyCommand {
    /// Suite selection.
    #[command(flatten)]
    selection: SelectionArgs,
    /// Output directory override.
    #[command(flatten)]
    output: OutputDirArgs,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Suite selection.
    #[command(flatten)]
    selection: SelectionArgs,
    /// Output directory override.
    #[command(flatten)]
    output: OutputDirArgs,
    /// Worker thread count (overrides `[runner] jobs`).
    #[arg(long, value_name = "N")]
    jobs: Option<NonZeroUsize>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Suite selection.
    #[command(flatten)]
    selection: SelectionArgs,
    /// Output directory override.
    #[command(flatten)]
    output: OutputDirArgs,
    /// Listing format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `init`.
#[derive(Args, Debug)]
struct InitCommand {
    /// Replace an existing config file.
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a single display message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    if cli.show_version {
        write_stdout_line(&format!("suitegen {}", env!("CARGO_PKG_VERSION")))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let config_path = cli.config.as_deref();

    match command {
        Commands::Generate(command) => command_generate(config_path, &command),
        Commands::Check(command) => command_check(config_path, &command),
        Commands::Verify(command) => command_verify(config_path, &command),
        Commands::Run(command) => command_run(config_path, &command),
        Commands::List(command) => command_list(config_path, &command),
        Commands::Init(command) => command_init(config_path, &command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end())
}

// ============================================================================
// SECTION: Artifact Commands
// ============================================================================

/// Executes `generate`.
fn command_generate(config_path: Option<&Path>, command: &OutputDirArgs) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output_dir = output_dir(&config, command);
    let builder = BundleBuilder::new(output_dir.clone(), config.generators())
        .with_events(event_sink(&config)?);
    let manifest = builder
        .write()
        .map_err(|err| CliError::new(format!("generation failed: {err}")))?;
    write_stdout_line(&format!(
        "wrote {} artifacts to {}",
        manifest.artifacts.len(),
        output_dir.display()
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `check`.
fn command_check(config_path: Option<&Path>, command: &OutputDirArgs) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output_dir = output_dir(&config, command);
    let builder = BundleBuilder::new(output_dir.clone(), config.generators());
    builder
        .verify_output(&output_dir)
        .map_err(|err| CliError::new(format!("check failed: {err}")))?;
    write_stdout_line(&format!("generated suites in {} are current", output_dir.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run Commands
// ============================================================================

/// Executes `verify`: presence checks only.
fn command_verify(config_path: Option<&Path>, command: &VerifyCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let runner = SuiteRunner::new(config.base_dir.clone(), Arc::new(UnconfiguredExecutor))
        .with_events(event_sink(&config)?)
        .with_jobs(config.runner.jobs)
        .with_mode(RunMode::PresenceOnly);
    let reports = run_selected(&config, &runner, &command.selection, &command.output)?;
    emit_reports(&reports, command.format)
}

/// Executes `run`: presence checks and leaf tests.
fn command_run(config_path: Option<&Path>, command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let executor = CommandExecutor::from_command(&config.runner.command)
        .ok_or_else(|| CliError::new("runner.command is not configured".to_string()))?
        .with_working_dir(config.base_dir.clone());
    let jobs = command.jobs.map_or(config.runner.jobs, NonZeroUsize::get);
    let runner = SuiteRunner::new(config.base_dir.clone(), Arc::new(executor))
        .with_events(event_sink(&config)?)
        .with_jobs(jobs);
    let reports = run_selected(&config, &runner, &command.selection, &command.output)?;
    emit_reports(&reports, command.format)
}

/// Runs every selected suite from its persisted document.
///
/// Each suite scans its own configured root, so the runner's scan root is
/// replaced per suite.
fn run_selected(
    config: &SuitegenConfig,
    runner: &SuiteRunner,
    selection: &SelectionArgs,
    output: &OutputDirArgs,
) -> CliResult<Vec<RunReport>> {
    let output_dir = output_dir(config, output);
    let mut reports = Vec::new();
    for (suite, qualified) in select_suites(config, selection)? {
        let document = load_document(&output_dir, suite)?;
        let suite_runner = SuiteRunner::clone(runner).with_scan_root(config.resolve(&suite.root));
        let report = suite_runner
            .run(&document.suite, qualified)
            .map_err(|err| CliError::new(format!("run failed: {err}")))?;
        reports.push(report);
    }
    Ok(reports)
}

/// Serialized form of a multi-suite run.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    /// True when every report succeeded.
    success: bool,
    /// Per-suite reports in selection order.
    reports: &'a [RunReport],
}

/// Prints run reports and maps success to the exit code.
fn emit_reports(reports: &[RunReport], format: OutputFormat) -> CliResult<ExitCode> {
    let success = reports.iter().all(RunReport::is_success);
    match format {
        OutputFormat::Json => write_canonical_json(&RunSummary {
            success,
            reports,
        })?,
        OutputFormat::Text => {
            for report in reports {
                write_stdout_text(&render::render_run(report))?;
            }
        }
    }
    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Listing and Config Commands
// ============================================================================

/// Executes `list`.
fn command_list(config_path: Option<&Path>, command: &ListCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output_dir = output_dir(&config, &command.output);
    let mut documents = Vec::new();
    for (suite, qualified) in select_suites(&config, &command.selection)? {
        let document = load_document(&output_dir, suite)?;
        if let Some(name) = qualified
            && document.suite.find(name).is_none()
        {
            return Err(CliError::new(format!("no suite named `{name}`")));
        }
        documents.push((document, qualified));
    }
    match command.format {
        OutputFormat::Json => {
            let listed: Vec<&GeneratedSuite> = documents
                .iter()
                .filter_map(|(document, qualified)| match qualified {
                    Some(name) => document.suite.find(name),
                    None => Some(&document.suite),
                })
                .collect();
            write_canonical_json(&listed)?;
        }
        OutputFormat::Text => {
            for (document, qualified) in &documents {
                write_stdout_text(&render::render_listing(document, *qualified))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `init`.
fn command_init(config_path: Option<&Path>, command: &InitCommand) -> CliResult<ExitCode> {
    let path = config_path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME), Path::to_path_buf);
    if !command.force && fs::symlink_metadata(&path).is_ok() {
        return Err(CliError::new(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )));
    }
    fs::write(&path, config_toml_example())
        .map_err(|err| CliError::new(format!("failed to write {}: {err}", path.display())))?;
    write_stdout_line(&format!("wrote {}", path.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    write_stdout_line(&format!("config ok: {} suites", config.suites.len()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<SuitegenConfig> {
    SuitegenConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Resolves the output directory from an override or the config.
fn output_dir(config: &SuitegenConfig, args: &OutputDirArgs) -> PathBuf {
    args.out.clone().unwrap_or_else(|| config.output_dir())
}

/// Builds the configured event sink.
fn event_sink(config: &SuitegenConfig) -> CliResult<Arc<dyn EventSink>> {
    match config.events.sink {
        EventSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
        EventSinkKind::None => Ok(Arc::new(NoopEventSink)),
        EventSinkKind::File => {
            let path = config
                .events_path()
                .ok_or_else(|| CliError::new("events.path is not configured".to_string()))?;
            let sink = FileEventSink::new(&path).map_err(|err| {
                CliError::new(format!("failed to open event log {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
    }
}

/// Resolves `--suite`/`--select` into configured suites and subtree names.
fn select_suites<'a>(
    config: &'a SuitegenConfig,
    selection: &'a SelectionArgs,
) -> CliResult<Vec<(&'a SuiteConfig, Option<&'a str>)>> {
    let qualified = selection.select.as_deref();
    let root_name = qualified.map(|name| name.split('.').next().unwrap_or(name));
    let wanted = match (selection.suite.as_deref(), root_name) {
        (Some(suite), Some(root)) if suite != root => {
            return Err(CliError::new(format!(
                "--select `{}` is not inside suite `{suite}`",
                qualified.unwrap_or_default()
            )));
        }
        (Some(suite), _) => Some(suite),
        (None, root) => root,
    };
    match wanted {
        Some(name) => {
            let suite = config
                .suite(name)
                .ok_or_else(|| CliError::new(format!("no configured suite named `{name}`")))?;
            Ok(vec![(suite, qualified)])
        }
        None => Ok(config.suites.iter().map(|suite| (suite, None)).collect()),
    }
}

/// Reads the persisted document for a configured suite.
fn load_document(output_dir: &Path, suite: &SuiteConfig) -> CliResult<SuiteDocument> {
    read_document(output_dir, &suite.name).map_err(|err| {
        CliError::new(format!(
            "failed to read generated suite `{}` from {}: {err}; run `suitegen generate`",
            suite.name,
            output_dir.display()
        ))
    })
}

/// Executor used when no runner command is configured.
///
/// Presence-only runs never call it.
struct UnconfiguredExecutor;

impl TestExecutor for UnconfiguredExecutor {
    fn execute(&self, _bound_path: &str) -> ExecutionResult {
        ExecutionResult::fail("runner.command is not configured")
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| output_error("stdout", &err))
}

/// Writes pre-rendered text to stdout, ensuring a trailing newline.
fn write_stdout_text(text: &str) -> CliResult<()> {
    let mut output = text.to_string();
    if !output.ends_with('\n') {
        output.push('\n');
    }
    std::io::stdout().write_all(output.as_bytes()).map_err(|err| output_error("stdout", &err))
}

/// Writes canonical JSON to stdout.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| output_error("stdout", &err))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("failed to write to {stream}: {error}"))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
