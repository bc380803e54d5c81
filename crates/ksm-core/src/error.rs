//! Error types for ksm-core

use thiserror::Error;

/// Core error type for ksm
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Malformed version string
    #[error("[E004] Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// E005: Malformed CQL schema source
    #[error("[E005] CQL parse error at line {line}: {message}")]
    StatementParse { line: usize, message: String },

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
