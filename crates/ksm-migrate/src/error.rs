//! Error types for the migration engine.
//!
//! Every failure reaches the caller as a distinct variant, and
//! [`MigrateError::kind`] flattens them into a `Copy` value scripts can
//! branch on. Only `PartialApplication` and `VersionRecordFailed` mean the
//! keyspace was changed; everything else fails before the first statement.

use ksm_core::{CoreError, Version};
use ksm_db::DbError;
use std::fmt;
use thiserror::Error;

/// Which unit of work a statement belonged to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// The full schema applied by setup
    Setup,
    /// One incremental version step
    Step { from: Version, to: Version },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Step { from, to } => write!(f, "step {} -> {}", from, to),
        }
    }
}

fn describe_progress(last_succeeded: &Option<usize>) -> String {
    match last_succeeded {
        Some(idx) => format!("statements 0..={} applied", idx),
        None => "no statements applied".to_string(),
    }
}

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Bad or missing task input (M001).
    #[error("[M001] Configuration error: {0}")]
    Configuration(String),

    /// Malformed schema source (M002).
    #[error("[M002] Failed to parse schema source '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: CoreError,
    },

    /// Schema directory could not be read or has an invalid layout (M003).
    #[error("[M003] Schema directory error at '{path}': {reason}")]
    PathError { path: String, reason: String },

    /// Discovered steps do not chain from the current version (M004).
    #[error("[M004] Gap in upgrade path: step to {to} upgrades from {declared}, expected {expected}")]
    GapInPath {
        expected: Version,
        declared: Version,
        to: Version,
    },

    /// Target version has no step directory (M005).
    #[error("[M005] Version {0} not found in schema directory")]
    VersionNotFound(Version),

    /// Two step directories upgrade to the same version (M006).
    #[error("[M006] Ambiguous step: directories '{first}' and '{second}' both upgrade to {version}")]
    AmbiguousStep {
        version: Version,
        first: String,
        second: String,
    },

    /// Target is older than the current version (M007).
    #[error("[M007] No upgrade path from {from} to {to}: downgrades are not supported")]
    NoUpgradePath { from: Version, to: Version },

    /// Cluster unreachable while touching the version store (M008).
    #[error("[M008] Version store unavailable: {0}")]
    StoreUnavailable(#[source] DbError),

    /// Version tables missing or empty (M009).
    #[error("[M009] Version store is not initialized")]
    NotInitialized,

    /// Update requested on a keyspace that was never set up (M010).
    #[error("[M010] Keyspace '{keyspace}' has no recorded schema version; run setup-schema first")]
    NotSetUp { keyspace: String },

    /// Stored version data cannot be interpreted (M011).
    #[error("[M011] Version store is corrupt: {0}")]
    StoreCorrupt(String),

    /// A statement failed after earlier ones were applied (M012).
    #[error(
        "[M012] Partial application during {phase} ({}): failed statement: {statement}: {source}",
        describe_progress(.last_succeeded)
    )]
    PartialApplication {
        phase: Phase,
        last_succeeded: Option<usize>,
        statement: String,
        #[source]
        source: DbError,
    },

    /// All statements of a unit applied but its version was not recorded (M013).
    #[error("[M013] {phase} applied but recording the version failed: {source}")]
    VersionRecordFailed {
        phase: Phase,
        #[source]
        source: Box<MigrateError>,
    },

    /// Any other client failure (M014).
    #[error("[M014] CQL execution failed: {0}")]
    Execution(#[source] DbError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Flat classification of [`MigrateError`] for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Parse,
    Path,
    GapInPath,
    VersionNotFound,
    AmbiguousStep,
    NoUpgradePath,
    StoreUnavailable,
    NotInitialized,
    NotSetUp,
    StoreCorrupt,
    PartialApplication,
    Execution,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Configuration(_) => ErrorKind::Configuration,
            MigrateError::Parse { .. } => ErrorKind::Parse,
            MigrateError::PathError { .. } => ErrorKind::Path,
            MigrateError::GapInPath { .. } => ErrorKind::GapInPath,
            MigrateError::VersionNotFound(_) => ErrorKind::VersionNotFound,
            MigrateError::AmbiguousStep { .. } => ErrorKind::AmbiguousStep,
            MigrateError::NoUpgradePath { .. } => ErrorKind::NoUpgradePath,
            MigrateError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            MigrateError::NotInitialized => ErrorKind::NotInitialized,
            MigrateError::NotSetUp { .. } => ErrorKind::NotSetUp,
            MigrateError::StoreCorrupt(_) => ErrorKind::StoreCorrupt,
            MigrateError::PartialApplication { .. } | MigrateError::VersionRecordFailed { .. } => {
                ErrorKind::PartialApplication
            }
            MigrateError::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Whether the keyspace may have been modified before the failure.
    pub fn mutated(&self) -> bool {
        self.kind() == ErrorKind::PartialApplication
    }

    /// Wrap a client error, singling out an unreachable cluster.
    pub(crate) fn from_store(err: DbError) -> Self {
        match err {
            DbError::ConnectionError(_) => MigrateError::StoreUnavailable(err),
            DbError::TableNotFound(_) => MigrateError::NotInitialized,
            other => MigrateError::Execution(other),
        }
    }

    /// Map a core configuration failure to `Configuration`.
    pub(crate) fn from_config(err: CoreError) -> Self {
        match err {
            CoreError::ConfigInvalid { message } => MigrateError::Configuration(message),
            other => MigrateError::Configuration(other.to_string()),
        }
    }
}
