//! Upgrade path resolution over a directory of version steps.
//!
//! Each immediate subdirectory of the schema directory is one step and is
//! named for the version it upgrades *to*:
//!
//! ```text
//! schema/
//!   v0.2/
//!     schema.cql      exactly one .cql file
//!     manifest.yml    optional: upgrades_from, description
//!   v0.3/
//!     schema.cql
//! ```
//!
//! Scanning ([`discover_steps`]) and interpretation ([`plan_path`]) are kept
//! apart so path rules can be tested without touching a filesystem.

use crate::error::{MigrateError, MigrateResult};
use crate::fs::SchemaFs;
use ksm_core::{SchemaManifest, Version};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Manifest file names, in lookup order.
pub const STEP_MANIFEST_FILES: &[&str] = &["manifest.yml", "manifest.yaml"];

/// Extension of the schema source inside a step directory.
pub const SCHEMA_EXTENSION: &str = "cql";

/// Optional per-step `manifest.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepManifestFile {
    /// Version this step upgrades from
    #[serde(default)]
    pub upgrades_from: Option<String>,

    /// Free text recorded in the update log
    #[serde(default)]
    pub description: Option<String>,
}

/// One step directory as found on disk, before path planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredStep {
    /// Directory name as written
    pub dir_name: String,
    /// Version this step upgrades to
    pub version: Version,
    /// Declared predecessor; `None` means "the previous version"
    pub upgrades_from: Option<Version>,
    pub description: Option<String>,
    /// Path of the step's `.cql` source
    pub schema_path: PathBuf,
}

/// A resolved step with its parsed schema.
#[derive(Debug, Clone)]
pub struct VersionStep {
    pub from: Version,
    pub to: Version,
    pub manifest: SchemaManifest,
    pub description: String,
    pub source: PathBuf,
}

fn path_error(path: &Path, reason: impl Into<String>) -> MigrateError {
    MigrateError::PathError {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Read the optional manifest file of a step directory.
fn read_step_manifest(
    fs: &dyn SchemaFs,
    dir: &Path,
    files: &[String],
) -> MigrateResult<StepManifestFile> {
    let Some(name) = STEP_MANIFEST_FILES
        .iter()
        .find(|name| files.iter().any(|f| f == *name))
    else {
        return Ok(StepManifestFile::default());
    };

    let path = dir.join(name);
    let content = fs
        .read_to_string(&path)
        .map_err(|e| path_error(&path, format!("cannot read manifest: {}", e)))?;
    if content.trim().is_empty() {
        return Ok(StepManifestFile::default());
    }
    serde_yaml::from_str(&content)
        .map_err(|e| path_error(&path, format!("invalid manifest: {}", e)))
}

/// Scan `dir` (one step directory) into a [`DiscoveredStep`].
fn discover_step(fs: &dyn SchemaFs, root: &Path, dir_name: &str) -> MigrateResult<DiscoveredStep> {
    let dir = root.join(dir_name);
    let version = Version::parse(dir_name)
        .map_err(|e| path_error(&dir, format!("directory name is not a version: {}", e)))?;

    let files = fs
        .list_files(&dir)
        .map_err(|e| path_error(&dir, e.to_string()))?;
    let mut sources = files.iter().filter(|f| {
        Path::new(f.as_str())
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SCHEMA_EXTENSION))
    });
    let schema_file = match (sources.next(), sources.next()) {
        (Some(only), None) => only,
        (None, _) => return Err(path_error(&dir, "no .cql schema file found")),
        (Some(_), Some(_)) => {
            return Err(path_error(&dir, "more than one .cql schema file found"))
        }
    };

    let manifest = read_step_manifest(fs, &dir, &files)?;
    let upgrades_from = match manifest.upgrades_from.as_deref() {
        Some(text) => {
            let from = Version::parse(text)
                .map_err(|e| path_error(&dir, format!("invalid upgrades_from: {}", e)))?;
            if from >= version {
                return Err(path_error(
                    &dir,
                    format!("upgrades_from {} is not older than {}", from, version),
                ));
            }
            Some(from)
        }
        None => None,
    };

    Ok(DiscoveredStep {
        dir_name: dir_name.to_string(),
        version,
        upgrades_from,
        description: manifest.description,
        schema_path: dir.join(schema_file),
    })
}

/// Scan the immediate subdirectories of `root` into steps sorted by version.
///
/// Hidden directories and plain files are ignored. Two directories naming the
/// same version (`v1.0` and `1.0.0`) fail with `AmbiguousStep`.
pub fn discover_steps(fs: &dyn SchemaFs, root: &Path) -> MigrateResult<Vec<DiscoveredStep>> {
    let dirs = fs
        .list_dirs(root)
        .map_err(|e| path_error(root, e.to_string()))?;

    let mut steps = Vec::with_capacity(dirs.len());
    for dir_name in dirs.iter().filter(|d| !d.starts_with('.')) {
        steps.push(discover_step(fs, root, dir_name)?);
    }
    steps.sort_by(|a, b| a.version.cmp(&b.version));

    for pair in steps.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(MigrateError::AmbiguousStep {
                version: pair[1].version.clone(),
                first: pair[0].dir_name.clone(),
                second: pair[1].dir_name.clone(),
            });
        }
    }

    log::debug!("Discovered {} step(s) in {}", steps.len(), root.display());
    Ok(steps)
}

/// Highest discovered version.
pub fn latest_version(steps: &[DiscoveredStep]) -> Option<&Version> {
    steps.iter().map(|s| &s.version).max()
}

/// Choose the steps leading from `from` (exclusive) to `to` (inclusive).
///
/// Returns `(from, step)` pairs in application order. `from == to` is an
/// empty plan, never an error.
pub fn plan_path<'s>(
    steps: &'s [DiscoveredStep],
    from: &Version,
    to: &Version,
) -> MigrateResult<Vec<(Version, &'s DiscoveredStep)>> {
    if from == to {
        return Ok(Vec::new());
    }
    if to < from {
        return Err(MigrateError::NoUpgradePath {
            from: from.clone(),
            to: to.clone(),
        });
    }
    if !steps.iter().any(|s| &s.version == to) {
        return Err(MigrateError::VersionNotFound(to.clone()));
    }

    let mut expected = from.clone();
    let mut plan = Vec::new();
    for step in steps.iter().filter(|s| &s.version > from && &s.version <= to) {
        let declared = step
            .upgrades_from
            .clone()
            .unwrap_or_else(|| expected.clone());
        if declared != expected {
            return Err(MigrateError::GapInPath {
                expected,
                declared,
                to: step.version.clone(),
            });
        }
        plan.push((expected, step));
        expected = step.version.clone();
    }
    Ok(plan)
}

/// Resolve and load every step between `from` and `to`.
///
/// All schema sources on the path are read and parsed before anything is
/// returned, so a malformed later step fails before the first one runs.
pub fn resolve(
    fs: &dyn SchemaFs,
    root: &Path,
    from: &Version,
    to: &Version,
) -> MigrateResult<Vec<VersionStep>> {
    let steps = discover_steps(fs, root)?;
    load_steps(fs, plan_path(&steps, from, to)?)
}

/// Read and parse the schema source of each planned step.
pub fn load_steps(
    fs: &dyn SchemaFs,
    plan: Vec<(Version, &DiscoveredStep)>,
) -> MigrateResult<Vec<VersionStep>> {
    plan.into_iter()
        .map(|(from, step)| {
            let raw = fs
                .read_to_string(&step.schema_path)
                .map_err(|e| path_error(&step.schema_path, e.to_string()))?;
            let manifest = SchemaManifest::parse(&raw).map_err(|e| MigrateError::Parse {
                path: step.schema_path.display().to_string(),
                source: e,
            })?;
            let description = step
                .description
                .clone()
                .unwrap_or_else(|| format!("upgrade from {} to {}", from, step.version));
            Ok(VersionStep {
                from,
                to: step.version.clone(),
                manifest,
                description,
                source: step.schema_path.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
