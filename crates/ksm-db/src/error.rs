//! Error types for ksm-db

use thiserror::Error;

/// CQL client errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Cluster connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] CQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Mutex poisoned (D004)
    #[error("[D004] Client mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Internal error (D005)
    #[error("[D005] Internal client error: {0}")]
    Internal(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Classify an error that carries only a message.
    ///
    /// Must be given the driver's own message, never statement text, since
    /// object names could match the substrings below.
    pub fn classify(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if Self::is_missing_table(&msg) {
            DbError::TableNotFound(msg)
        } else if lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("no known nodes")
        {
            DbError::ConnectionError(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }

    /// Whether a server message reports a table that does not exist.
    pub fn is_missing_table(message: &str) -> bool {
        let lower = message.to_lowercase();
        lower.contains("unconfigured table")
            || (lower.contains("table") && lower.contains("does not exist"))
    }

    /// Append the statement that failed, keeping the classification.
    pub fn with_statement(self, statement: &str) -> Self {
        let attach = |msg: String| format!("{}: {}", msg, statement);
        match self {
            DbError::ConnectionError(m) => DbError::ConnectionError(attach(m)),
            DbError::ExecutionError(m) => DbError::ExecutionError(attach(m)),
            DbError::TableNotFound(m) => DbError::TableNotFound(attach(m)),
            DbError::MutexPoisoned(m) => DbError::MutexPoisoned(attach(m)),
            DbError::Internal(m) => DbError::Internal(attach(m)),
        }
    }

    /// Whether the error means the cluster could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::ConnectionError(_))
    }
}
