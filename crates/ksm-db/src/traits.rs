//! SchemaClient trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ksm_core::KeyspaceName;

/// Table holding the single current-version row per keyspace.
pub const VERSION_TABLE: &str = "schema_version";

/// Append-only table of every applied version transition.
pub const UPDATE_LOG_TABLE: &str = "schema_update_history";

/// DDL for the version tracking tables, in creation order.
///
/// The update log is clustered by a server-generated `timeuuid`, so two
/// entries written in the same millisecond never overwrite each other.
pub const VERSION_TABLES_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (keyspace_name text PRIMARY KEY, creation_time timestamp, curr_version text)",
    "CREATE TABLE IF NOT EXISTS schema_update_history (keyspace_name text, update_id timeuuid, update_time timestamp, old_version text, new_version text, manifest_ref text, description text, PRIMARY KEY (keyspace_name, update_id)) WITH CLUSTERING ORDER BY (update_id ASC)",
];

/// One row of the update log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLogEntry {
    pub old_version: String,
    pub new_version: String,
    /// Checksum (or name) of the schema source that was applied
    pub manifest_ref: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Statement execution against one keyspace of the cluster.
///
/// The migration engine only ever talks to the cluster through this trait.
/// Every call is a single round trip with the backend's own timeout; there
/// is no cross-call transaction.
#[async_trait]
pub trait SchemaClient: Send + Sync {
    /// Execute one CQL statement
    async fn exec(&self, cql: &str) -> DbResult<()>;

    /// Read the current-version row, `None` when the row is absent
    async fn read_current_version(&self) -> DbResult<Option<String>>;

    /// Overwrite the current-version row
    async fn write_current_version(&self, version: &str) -> DbResult<()>;

    /// All update log entries, oldest first
    async fn read_update_log(&self) -> DbResult<Vec<UpdateLogEntry>>;

    /// Append one update log entry
    async fn append_update_log(&self, entry: &UpdateLogEntry) -> DbResult<()>;

    /// Names of all tables in the keyspace
    async fn list_tables(&self) -> DbResult<Vec<String>>;

    /// Names of all user-defined types in the keyspace
    async fn list_types(&self) -> DbResult<Vec<String>>;

    /// Keyspace this client is bound to
    fn keyspace(&self) -> &KeyspaceName;

    /// Release the connection
    async fn close(&self) -> DbResult<()> {
        Ok(())
    }
}
