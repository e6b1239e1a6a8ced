// crates/suitegen-core/src/bundle.rs
// ============================================================================
// Module: Suite Bundle
// Description: Persisted generated-suite artifacts and their drift check.
// Purpose: Write generated suites atomically and verify them byte-for-byte.
// Dependencies: cap-std, cap-primitives, serde, serde_jcs, serde_json
// ============================================================================

//! ## Overview
//! The bundle builder runs every configured [`SuiteGenerator`] in memory and
//! renders, per suite, `<name>.json` (the [`SuiteDocument`]) and `<name>.md`
//! (a reviewable listing), plus an `index.json` manifest carrying SHA-256
//! digests. Nothing is written until every suite generated successfully.
//! After writing, regular files the bundle no longer names (for example the
//! artifacts of a removed suite) are deleted; symlinks are left alone.
//!
//! [`BundleBuilder::verify_output`] regenerates in memory and compares the
//! output directory byte-for-byte: a changed, missing, or unexpected file, or
//! any symlink, fails the check. All filesystem access goes through
//! capability handles and never follows symlinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use serde::Deserialize;
use serde::Serialize;

use crate::emitter::GeneratedSuite;
use crate::emitter::SuiteDocument;
use crate::emitter::SuiteGenerator;
use crate::error::BundleError;
use crate::error::GenerationError;
use crate::events::EventSink;
use crate::events::NoopEventSink;
use crate::events::SuiteEvent;
use crate::events::SuiteEventKind;
use crate::events::SuiteEventParams;
use crate::hashing::DEFAULT_HASH_ALGORITHM;
use crate::hashing::HashAlgorithm;
use crate::hashing::HashDigest;
use crate::hashing::canonical_json_bytes;
use crate::hashing::hash_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "index.json";

/// Maximum size of a suite document read back at run time.
pub const MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Bundle Types
// ============================================================================

/// `index.json` contents: one digest entry per suite artifact.
///
/// # Invariants
/// - `artifacts` are ordered by `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// Version of the generator that produced the artifacts.
    pub generator_version: String,
    /// Digest algorithm for every entry.
    pub hash_algorithm: HashAlgorithm,
    /// Entries sorted by path.
    pub artifacts: Vec<ManifestArtifact>,
}

/// Digest entry for one suite artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    /// File name under the output directory.
    pub path: String,
    /// Content type of the file.
    pub content_type: String,
    /// Digest of the file bytes.
    pub digest: HashDigest,
}

/// One rendered suite file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteArtifact {
    /// File name under the output directory.
    pub path: String,
    /// `application/json` or `text/markdown`.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Everything `generate` would write, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteBundle {
    /// Index of the artifacts.
    pub manifest: SuiteManifest,
    /// Artifact payloads, ordered by path.
    pub artifacts: Vec<SuiteArtifact>,
    /// Generated documents in configuration order.
    pub documents: Vec<SuiteDocument>,
}

// ============================================================================
// SECTION: Bundle Builder
// ============================================================================

/// Builder for generated-suite artifacts.
///
/// # Invariants
/// - `output_dir` itself is trusted; every path beneath it is a validated
///   single-segment suite file name.
#[derive(Clone)]
pub struct BundleBuilder {
    /// Where suite files are written.
    output_dir: PathBuf,
    /// Suites to generate, in configuration order.
    generators: Vec<SuiteGenerator>,
    /// Version recorded in the manifest.
    generator_version: String,
    /// Hash algorithm used for artifact digests.
    hash_algorithm: HashAlgorithm,
    /// Event sink for generation progress.
    events: Arc<dyn EventSink>,
}

impl BundleBuilder {
    /// Creates a builder targeting the provided output directory.
    #[must_use]
    pub fn new(output_dir: PathBuf, generators: Vec<SuiteGenerator>) -> Self {
        Self {
            output_dir,
            generators,
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            events: Arc::new(NoopEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns `generated/suitegen`.
    #[must_use]
    pub fn default_output_dir() -> PathBuf {
        PathBuf::from("generated/suitegen")
    }

    /// Returns the configured output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Builds the bundle without writing to disk.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when any suite fails to generate or render.
    pub fn build(&self) -> Result<SuiteBundle, BundleError> {
        let mut artifacts = Vec::with_capacity(self.generators.len() * 2);
        let mut documents = Vec::with_capacity(self.generators.len());
        for generator in &self.generators {
            let name = generator.suite_name();
            let mut started = SuiteEventParams::new(SuiteEventKind::GenerationStarted, name);
            started.subject = Some(generator.root().display().to_string());
            self.events.record(&SuiteEvent::new(started));

            let document = generator.generate()?;
            artifacts.push(json_artifact(&format!("{name}.json"), &document)?);
            artifacts.push(markdown_artifact(&format!("{name}.md"), suite_markdown(&document)));

            let mut completed = SuiteEventParams::new(SuiteEventKind::GenerationCompleted, name);
            completed.count = Some(document.suite.leaf_count());
            self.events.record(&SuiteEvent::new(completed));
            documents.push(document);
        }

        artifacts.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
        ensure_unique_paths(&artifacts)?;
        let manifest = build_manifest(&self.generator_version, self.hash_algorithm, &artifacts);

        Ok(SuiteBundle {
            manifest,
            artifacts,
            documents,
        })
    }

    /// Writes the bundle to the configured output directory.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when generation or writing fails.
    pub fn write(&self) -> Result<SuiteManifest, BundleError> {
        self.write_to(&self.output_dir)
    }

    /// Writes the bundle to the specified output directory.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when generation or writing fails.
    pub fn write_to(&self, output_dir: &Path) -> Result<SuiteManifest, BundleError> {
        let bundle = self.build()?;
        let output = open_output_dir(output_dir, true)?;
        for artifact in &bundle.artifacts {
            write_artifact(&output, artifact)?;
            self.record_written(&artifact.path, artifact.bytes.len());
        }
        let manifest_bytes = serialize_json_pretty(&bundle.manifest)?;
        write_artifact_bytes(&output, Path::new(MANIFEST_FILE), &manifest_bytes)?;
        self.record_written(MANIFEST_FILE, manifest_bytes.len());
        remove_stale_files(&output, Path::new(""), &expected_paths(&bundle))?;
        Ok(bundle.manifest)
    }

    /// Verifies the on-disk bundle matches the generated bundle.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Stale`] on any difference, and other
    /// [`BundleError`] variants when generation or reading fails.
    pub fn verify_output(&self, output_dir: &Path) -> Result<(), BundleError> {
        let bundle = self.build()?;
        let output = open_output_dir(output_dir, false)?;
        for artifact in &bundle.artifacts {
            let relative = validate_relative_path(&artifact.path)?;
            let bytes = read_expected_bytes(&output, &relative, artifact.bytes.len())?;
            if bytes != artifact.bytes {
                return Err(BundleError::Stale(format!("artifact mismatch: {}", artifact.path)));
            }
        }
        let manifest_bytes = serialize_json_pretty(&bundle.manifest)?;
        let actual_manifest =
            read_expected_bytes(&output, Path::new(MANIFEST_FILE), manifest_bytes.len())?;
        if actual_manifest != manifest_bytes {
            return Err(BundleError::Stale(format!("manifest mismatch: {MANIFEST_FILE}")));
        }
        let expected_files = expected_paths(&bundle);
        for path in collect_output_files(&output)? {
            if !expected_files.contains(&path) {
                return Err(BundleError::Stale(format!("unexpected artifact: {path}")));
            }
        }
        Ok(())
    }

    /// Records an `artifact_written` event.
    fn record_written(&self, path: &str, bytes: usize) {
        let mut params = SuiteEventParams::new(SuiteEventKind::ArtifactWritten, "");
        params.subject = Some(path.to_string());
        params.count = Some(bytes);
        self.events.record(&SuiteEvent::new(params));
    }
}

/// Reads a persisted suite document from the output directory.
///
/// # Errors
///
/// Returns [`BundleError`] when the document is missing, too large, or
/// cannot be parsed.
pub fn read_document(output_dir: &Path, suite_name: &str) -> Result<SuiteDocument, BundleError> {
    let file_name = format!("{suite_name}.json");
    let relative = validate_relative_path(&file_name)?;
    if relative.components().count() != 1 {
        return Err(BundleError::OutputPath(relative));
    }
    let output = open_output_dir(output_dir, false)?;
    let (parent, name, file_path) = open_parent_dir(&output, &relative, false)?;
    let mut file = open_file_nofollow(&parent, Path::new(name.as_os_str()), &file_path)?;
    let metadata = file.metadata().map_err(|err| BundleError::Io(err.to_string()))?;
    if !metadata.is_file() {
        return Err(BundleError::OutputPath(file_path));
    }
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(BundleError::Io(format!("suite document exceeds size limit: {file_name}")));
    }
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|err| BundleError::Io(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| BundleError::Serialization(err.to_string()))
}

// ============================================================================
// SECTION: Markdown Rendering
// ============================================================================

/// Renders the reviewable listing of one suite document.
fn suite_markdown(document: &SuiteDocument) -> String {
    let rule = document.suite.presence_check.match_rule.clone();
    let mut out = String::new();
    let _ = writeln!(out, "# Suite `{}`\n", document.suite.name);
    let _ = writeln!(out, "- Scan root: `{}`", document.root);
    let _ = writeln!(out, "- Include: `{}`", rule.include_pattern);
    if let Some(exclude) = &rule.exclude_pattern {
        let _ = writeln!(out, "- Exclude: `{exclude}`");
    }
    if !rule.excluded_names.is_empty() {
        let names: Vec<String> =
            rule.excluded_names.iter().map(|name| format!("`{name}`")).collect();
        let _ = writeln!(out, "- Excluded names: {}", names.join(", "));
    }
    if let Some(backend) = &rule.backend {
        let _ = writeln!(out, "- Backend: `{backend}`");
    }
    let _ = writeln!(
        out,
        "- Totals: {} suites, {} leaf tests",
        document.suite.suite_count(),
        document.suite.leaf_count()
    );
    render_suite(&mut out, &document.suite);
    out
}

/// Renders one suite section and recurses into children.
fn render_suite(out: &mut String, suite: &GeneratedSuite) {
    let directory = if suite.directory.is_empty() { "." } else { suite.directory.as_str() };
    let _ = writeln!(out, "\n## {}\n", suite.qualified_name);
    let _ = writeln!(out, "Directory: `{directory}`\n");
    let _ = writeln!(
        out,
        "- `{}` ({} fixtures)",
        suite.presence_check.identifier,
        suite.presence_check.fixture_snapshot.len()
    );
    for leaf in &suite.leaf_tests {
        let _ = writeln!(out, "- `{}`: `{}`", leaf.identifier, leaf.bound_path);
    }
    for child in &suite.child_suites {
        render_suite(out, child);
    }
}

// ============================================================================
// SECTION: Artifact Helpers
// ============================================================================

/// Renders a suite document as `<name>.json`.
fn json_artifact<T: Serialize>(path: &str, value: &T) -> Result<SuiteArtifact, BundleError> {
    Ok(SuiteArtifact {
        path: path.to_string(),
        content_type: String::from("application/json"),
        bytes: serialize_json_pretty(value)?,
    })
}

/// Wraps a rendered listing as `<name>.md`.
fn markdown_artifact(path: &str, content: String) -> SuiteArtifact {
    SuiteArtifact {
        path: path.to_string(),
        content_type: String::from("text/markdown"),
        bytes: content.into_bytes(),
    }
}

/// Canonical (JCS) key order, pretty printed, trailing newline.
fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>, BundleError> {
    let canonical = canonical_json_bytes(value).map_err(BundleError::Serialization)?;
    let canonical_value: serde_json::Value = serde_json::from_slice(&canonical)
        .map_err(|err| BundleError::Serialization(err.to_string()))?;
    let mut bytes = serde_json::to_vec_pretty(&canonical_value)
        .map_err(|err| BundleError::Serialization(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Digests every artifact into the index.
fn build_manifest(
    generator_version: &str,
    algorithm: HashAlgorithm,
    artifacts: &[SuiteArtifact],
) -> SuiteManifest {
    SuiteManifest {
        generator_version: generator_version.to_string(),
        hash_algorithm: algorithm,
        artifacts: artifacts
            .iter()
            .map(|artifact| ManifestArtifact {
                path: artifact.path.clone(),
                content_type: artifact.content_type.clone(),
                digest: hash_bytes(algorithm, &artifact.bytes),
            })
            .collect(),
    }
}

/// Ensures artifact paths are unique and never shadow the manifest.
fn ensure_unique_paths(artifacts: &[SuiteArtifact]) -> Result<(), BundleError> {
    let mut seen = BTreeSet::from([MANIFEST_FILE]);
    for artifact in artifacts {
        if !seen.insert(artifact.path.as_str()) {
            return Err(GenerationError::InvalidSuite(format!(
                "duplicate artifact path: {}",
                artifact.path
            ))
            .into());
        }
    }
    Ok(())
}

/// Paths `check` expects to find, manifest included.
fn expected_paths(bundle: &SuiteBundle) -> BTreeSet<String> {
    let mut expected = BTreeSet::from([String::from(MANIFEST_FILE)]);
    expected.extend(bundle.artifacts.iter().map(|artifact| artifact.path.clone()));
    expected
}

// ============================================================================
// SECTION: Filesystem Helpers
// ============================================================================

/// Opens (optionally creating) the suite output directory.
fn open_output_dir(output_dir: &Path, create_missing: bool) -> Result<Dir, BundleError> {
    if output_dir.as_os_str().is_empty() {
        return Err(BundleError::OutputPath(output_dir.to_path_buf()));
    }
    let normalized = normalize_output_dir(output_dir)?;
    let (anchor, components) = split_anchor_and_components(&normalized)?;
    if components.is_empty() {
        return Err(BundleError::OutputPath(normalized));
    }
    let mut current = Dir::open_ambient_dir(&anchor, ambient_authority())
        .map_err(|err| BundleError::Io(err.to_string()))?;
    for component in components {
        current = open_or_create_child_dir_nofollow(
            &current,
            Path::new(component.as_os_str()),
            create_missing,
        )
        .map_err(|err| map_open_error(&err, output_dir))?;
    }
    Ok(current)
}

/// Anchors a relative output directory at the working directory.
fn normalize_output_dir(output_dir: &Path) -> Result<PathBuf, BundleError> {
    if output_dir.is_absolute() {
        return Ok(output_dir.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(output_dir))
        .map_err(|err| BundleError::Io(err.to_string()))
}

/// Splits off the root so each remaining segment is opened no-follow.
fn split_anchor_and_components(path: &Path) -> Result<(PathBuf, Vec<OsString>), BundleError> {
    let mut anchor = PathBuf::new();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => anchor.push(component.as_os_str()),
            Component::CurDir => {}
            Component::Normal(value) => components.push(value.to_os_string()),
            Component::ParentDir => return Err(BundleError::OutputPath(path.to_path_buf())),
        }
    }
    if anchor.as_os_str().is_empty() {
        return Err(BundleError::OutputPath(path.to_path_buf()));
    }
    Ok((anchor, components))
}

/// Opens `child` under `parent`, refusing symlinks.
fn open_child_dir_nofollow(parent: &Dir, child: &Path) -> std::io::Result<Dir> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let file = parent.open_with(child, &options)?;
    if !file.metadata()?.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path component is not a directory",
        ));
    }
    Ok(Dir::from_std_file(file.into_std()))
}

/// Like `open_child_dir_nofollow`, creating `child` when allowed.
fn open_or_create_child_dir_nofollow(
    parent: &Dir,
    child: &Path,
    create_missing: bool,
) -> std::io::Result<Dir> {
    match open_child_dir_nofollow(parent, child) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::NotFound && create_missing => {
            parent.create_dir(child)?;
            open_child_dir_nofollow(parent, child)
        }
        Err(err) => Err(err),
    }
}

/// Opens a file for reading without following symlinks.
fn open_file_nofollow(
    parent: &Dir,
    file_name: &Path,
    file_path: &Path,
) -> Result<cap_std::fs::File, BundleError> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    parent.open_with(file_name, &options).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            BundleError::Stale(format!("missing artifact: {}", file_path.display()))
        } else {
            map_open_error(&err, file_path)
        }
    })
}

/// Maps low-level open errors into bundle-level path errors.
fn map_open_error(err: &std::io::Error, path: &Path) -> BundleError {
    if matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::InvalidInput
            | ErrorKind::PermissionDenied
            | ErrorKind::NotADirectory
            | ErrorKind::Unsupported
    ) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    #[cfg(unix)]
    if err.raw_os_error() == Some(ELOOP) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    // ERROR_CANT_RESOLVE_FILENAME, ERROR_CANT_ACCESS_FILE
    #[cfg(windows)]
    if matches!(err.raw_os_error(), Some(681 | 1920)) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    BundleError::Io(err.to_string())
}

/// `ELOOP`: a no-follow open hit a symlink.
#[cfg(any(target_os = "linux", target_os = "android"))]
const ELOOP: i32 = 40;

/// `ELOOP`: a no-follow open hit a symlink.
#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const ELOOP: i32 = 62;

/// Writes one suite file.
fn write_artifact(output_dir: &Dir, artifact: &SuiteArtifact) -> Result<(), BundleError> {
    let relative = validate_relative_path(&artifact.path)?;
    write_artifact_bytes(output_dir, &relative, &artifact.bytes)
}

/// Writes `bytes` at `relative` via temp file plus rename.
fn write_artifact_bytes(output_dir: &Dir, relative: &Path, bytes: &[u8]) -> Result<(), BundleError> {
    let (parent_dir, file_name, file_path) = open_parent_dir(output_dir, relative, true)?;
    write_file_atomic(&parent_dir, Path::new(file_name.as_os_str()), &file_path, bytes)
}

/// Resolves the directory holding `relative` and its final name.
fn open_parent_dir(
    output_dir: &Dir,
    relative: &Path,
    create_missing: bool,
) -> Result<(Dir, OsString, PathBuf), BundleError> {
    let mut current = output_dir.try_clone().map_err(|err| BundleError::Io(err.to_string()))?;
    let mut parent = PathBuf::new();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        let Component::Normal(name) = component else {
            return Err(BundleError::OutputPath(relative.to_path_buf()));
        };
        if components.peek().is_none() {
            let file_name = name.to_os_string();
            let file_path = parent.join(&file_name);
            return Ok((current, file_name, file_path));
        }
        parent.push(name);
        current = open_or_create_child_dir_nofollow(&current, Path::new(name), create_missing)
            .map_err(|err| map_open_error(&err, relative))?;
    }
    Err(BundleError::OutputPath(relative.to_path_buf()))
}

/// Temp sibling, then rename over the target.
fn write_file_atomic(
    parent: &Dir,
    file_name: &Path,
    file_path: &Path,
    bytes: &[u8],
) -> Result<(), BundleError> {
    for attempt in 0 .. 64_u32 {
        let temp_name = temp_file_name(file_name, attempt)?;
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        match parent.open_with(&temp_name, &options) {
            Ok(mut temp_file) => {
                let written = temp_file
                    .write_all(bytes)
                    .and_then(|()| temp_file.sync_all())
                    .and_then(|()| parent.rename(&temp_name, parent, file_name));
                if let Err(err) = written {
                    let _ = parent.remove_file(&temp_name);
                    return Err(BundleError::Io(err.to_string()));
                }
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(map_open_error(&err, file_path)),
        }
    }
    Err(BundleError::Io(String::from("unable to allocate temporary output file")))
}

/// `.tmp-<name>.<pid>.<attempt>`.
fn temp_file_name(file_name: &Path, attempt: u32) -> Result<PathBuf, BundleError> {
    let Some(base_name) = file_name.file_name() else {
        return Err(BundleError::OutputPath(file_name.to_path_buf()));
    };
    let mut temp = OsString::from(".tmp-");
    temp.push(base_name);
    temp.push(format!(".{}.{}", std::process::id(), attempt));
    Ok(PathBuf::from(temp))
}

/// Rejects absolute paths and `..` in artifact names.
fn validate_relative_path(path: &str) -> Result<PathBuf, BundleError> {
    let candidate = PathBuf::from(path);
    if path.trim().is_empty() || candidate.is_absolute() {
        return Err(BundleError::OutputPath(candidate));
    }
    for component in candidate.components() {
        if matches!(component, Component::ParentDir | Component::RootDir | Component::Prefix(_)) {
            return Err(BundleError::OutputPath(candidate));
        }
    }
    Ok(candidate)
}

/// Reads an existing artifact, failing stale on a size mismatch.
fn read_expected_bytes(
    output_dir: &Dir,
    relative: &Path,
    expected_len: usize,
) -> Result<Vec<u8>, BundleError> {
    let (parent_dir, file_name, file_path) = open_parent_dir(output_dir, relative, false)
        .map_err(|_| BundleError::Stale(format!("missing artifact: {}", relative.display())))?;
    let mut file = open_file_nofollow(&parent_dir, Path::new(file_name.as_os_str()), &file_path)?;
    let metadata = file.metadata().map_err(|err| BundleError::Io(err.to_string()))?;
    if !metadata.is_file() {
        return Err(BundleError::OutputPath(file_path));
    }
    let expected_len = u64::try_from(expected_len)
        .map_err(|_| BundleError::Io(String::from("expected length exceeds addressable size")))?;
    if metadata.len() != expected_len {
        return Err(BundleError::Stale(format!("artifact size mismatch: {}", relative.display())));
    }
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|err| BundleError::Io(err.to_string()))?;
    Ok(bytes)
}

/// Lists every file under the output directory.
fn collect_output_files(output_dir: &Dir) -> Result<BTreeSet<String>, BundleError> {
    let mut files = BTreeSet::new();
    collect_files_recursive(output_dir, Path::new(""), &mut files)?;
    Ok(files)
}

/// Walks `directory`, recording paths relative to the output root.
fn collect_files_recursive(
    current: &Dir,
    prefix: &Path,
    files: &mut BTreeSet<String>,
) -> Result<(), BundleError> {
    let entries = current.entries().map_err(|err| BundleError::Io(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| BundleError::Io(err.to_string()))?;
        let relative = prefix.join(entry.file_name());
        let file_type = entry.file_type().map_err(|err| BundleError::Io(err.to_string()))?;
        if file_type.is_symlink() {
            return Err(BundleError::Stale(format!(
                "symlink in output directory: {}",
                relative.display()
            )));
        }
        if file_type.is_dir() {
            let directory = entry.open_dir().map_err(|err| BundleError::Io(err.to_string()))?;
            collect_files_recursive(&directory, &relative, files)?;
        } else if file_type.is_file() {
            let text = relative.to_str().ok_or_else(|| BundleError::OutputPath(relative.clone()))?;
            files.insert(text.replace('\\', "/"));
        }
    }
    Ok(())
}

/// Deletes regular files under `current` whose path is not in `expected`.
///
/// Symlinks are neither followed nor removed.
fn remove_stale_files(
    current: &Dir,
    prefix: &Path,
    expected: &BTreeSet<String>,
) -> Result<(), BundleError> {
    let entries = current.entries().map_err(|err| BundleError::Io(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| BundleError::Io(err.to_string()))?;
        let name = entry.file_name();
        let relative = prefix.join(&name);
        let file_type = entry.file_type().map_err(|err| BundleError::Io(err.to_string()))?;
        if file_type.is_dir() && !file_type.is_symlink() {
            let directory = entry.open_dir().map_err(|err| BundleError::Io(err.to_string()))?;
            remove_stale_files(&directory, &relative, expected)?;
        } else if file_type.is_file() && !file_type.is_symlink() {
            let known = relative
                .to_str()
                .is_some_and(|text| expected.contains(&text.replace('\\', "/")));
            if !known {
                current.remove_file(&name).map_err(|err| BundleError::Io(err.to_string()))?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
