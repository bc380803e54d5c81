//! ScyllaDB / Cassandra backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{SchemaClient, UpdateLogEntry};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ksm_core::{ConnectionConfig, KeyspaceName};
use scylla::frame::value::CqlTimestamp;
use scylla::load_balancing::DefaultPolicy;
use scylla::statement::Consistency;
use scylla::transport::errors::{DbError as ServerError, QueryError};
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::time::Duration;

/// Backend talking CQL to a real cluster through the scylla driver.
pub struct ScyllaClient {
    session: Session,
    keyspace: KeyspaceName,
}

impl ScyllaClient {
    /// Connect and bind the session to `keyspace`.
    pub async fn connect(config: &ConnectionConfig, keyspace: KeyspaceName) -> DbResult<Self> {
        let nodes = config
            .contact_points()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut profile = ExecutionProfile::builder()
            .consistency(parse_consistency(config.consistency.as_deref())?)
            .request_timeout(Some(timeout));
        if let Some(dc) = &config.datacenter {
            profile = profile.load_balancing_policy(
                DefaultPolicy::builder()
                    .prefer_datacenter(dc.clone())
                    .build(),
            );
        }

        let mut builder = SessionBuilder::new()
            .known_nodes(&nodes)
            .connection_timeout(timeout)
            .default_execution_profile_handle(profile.build().into_handle())
            .use_keyspace(keyspace.as_str(), false);
        if let Some(user) = &config.user {
            builder = builder.user(user, config.password.as_deref().unwrap_or_default());
        }

        log::debug!("Connecting to {} (keyspace {})", nodes.join(","), keyspace);
        let session = builder
            .build()
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        Ok(Self { session, keyspace })
    }

    async fn select_names(&self, cql: &str) -> DbResult<Vec<String>> {
        let result = self
            .session
            .query_unpaged(cql, (self.keyspace.to_string(),))
            .await
            .map_err(|e| query_error(e, None))?;
        let mut names = Vec::new();
        for row in result
            .rows_typed::<(String,)>()
            .map_err(|e| DbError::Internal(e.to_string()))?
        {
            let (name,) = row.map_err(|e| DbError::Internal(e.to_string()))?;
            names.push(name);
        }
        Ok(names)
    }
}

/// Map a consistency name from the profile to the driver enum.
fn parse_consistency(name: Option<&str>) -> DbResult<Consistency> {
    let Some(name) = name else {
        return Ok(Consistency::Quorum);
    };
    match name.to_ascii_lowercase().as_str() {
        "any" => Ok(Consistency::Any),
        "one" => Ok(Consistency::One),
        "two" => Ok(Consistency::Two),
        "three" => Ok(Consistency::Three),
        "quorum" => Ok(Consistency::Quorum),
        "all" => Ok(Consistency::All),
        "local_quorum" => Ok(Consistency::LocalQuorum),
        "each_quorum" => Ok(Consistency::EachQuorum),
        "local_one" => Ok(Consistency::LocalOne),
        other => Err(DbError::ConnectionError(format!(
            "unknown consistency level '{}'",
            other
        ))),
    }
}

/// Map a driver error to a `DbError` by its structure, then attach the
/// statement text. Only transport-level failures and server-side
/// unavailability count as a lost connection.
fn query_error(err: QueryError, statement: Option<&str>) -> DbError {
    let classified = match &err {
        QueryError::DbError(
            ServerError::Unavailable { .. }
            | ServerError::Overloaded
            | ServerError::IsBootstrapping
            | ServerError::ReadTimeout { .. }
            | ServerError::WriteTimeout { .. },
            _,
        )
        | QueryError::IoError(_)
        | QueryError::TimeoutError
        | QueryError::RequestTimeout(_) => DbError::ConnectionError(err.to_string()),
        QueryError::DbError(_, message) if DbError::is_missing_table(message) => {
            DbError::TableNotFound(err.to_string())
        }
        QueryError::DbError(..) => DbError::ExecutionError(err.to_string()),
        _ => DbError::classify(err.to_string()),
    };
    match statement {
        Some(cql) => classified.with_statement(cql),
        None => classified,
    }
}

fn to_datetime(ts: Option<CqlTimestamp>) -> DateTime<Utc> {
    ts.and_then(|CqlTimestamp(millis)| Utc.timestamp_millis_opt(millis).single())
        .unwrap_or_default()
}

#[async_trait]
impl SchemaClient for ScyllaClient {
    async fn exec(&self, cql: &str) -> DbResult<()> {
        self.session
            .query_unpaged(cql, &[])
            .await
            .map_err(|e| query_error(e, Some(cql)))?;
        Ok(())
    }

    async fn read_current_version(&self) -> DbResult<Option<String>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT curr_version FROM schema_version WHERE keyspace_name = ?",
                (self.keyspace.to_string(),),
            )
            .await
            .map_err(|e| query_error(e, None))?;

        let mut rows = result
            .rows_typed::<(Option<String>,)>()
            .map_err(|e| DbError::Internal(e.to_string()))?;
        match rows.next() {
            Some(row) => {
                let (version,) = row.map_err(|e| DbError::Internal(e.to_string()))?;
                Ok(version)
            }
            None => Ok(None),
        }
    }

    async fn write_current_version(&self, version: &str) -> DbResult<()> {
        self.session
            .query_unpaged(
                "INSERT INTO schema_version (keyspace_name, creation_time, curr_version) VALUES (?, ?, ?)",
                (
                    self.keyspace.to_string(),
                    CqlTimestamp(Utc::now().timestamp_millis()),
                    version.to_string(),
                ),
            )
            .await
            .map_err(|e| query_error(e, None))?;
        Ok(())
    }

    async fn read_update_log(&self) -> DbResult<Vec<UpdateLogEntry>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT old_version, new_version, manifest_ref, description, update_time FROM schema_update_history WHERE keyspace_name = ?",
                (self.keyspace.to_string(),),
            )
            .await
            .map_err(|e| query_error(e, None))?;

        let mut entries = Vec::new();
        for row in result
            .rows_typed::<(
                Option<String>,
                Option<String>,
                Option<String>,
                Option<String>,
                Option<CqlTimestamp>,
            )>()
            .map_err(|e| DbError::Internal(e.to_string()))?
        {
            let (old_version, new_version, manifest_ref, description, update_time) =
                row.map_err(|e| DbError::Internal(e.to_string()))?;
            entries.push(UpdateLogEntry {
                old_version: old_version.unwrap_or_default(),
                new_version: new_version.unwrap_or_default(),
                manifest_ref: manifest_ref.unwrap_or_default(),
                description: description.unwrap_or_default(),
                updated_at: to_datetime(update_time),
            });
        }
        Ok(entries)
    }

    async fn append_update_log(&self, entry: &UpdateLogEntry) -> DbResult<()> {
        self.session
            .query_unpaged(
                "INSERT INTO schema_update_history (keyspace_name, update_id, update_time, old_version, new_version, manifest_ref, description) VALUES (?, now(), ?, ?, ?, ?, ?)",
                (
                    self.keyspace.to_string(),
                    CqlTimestamp(entry.updated_at.timestamp_millis()),
                    entry.old_version.clone(),
                    entry.new_version.clone(),
                    entry.manifest_ref.clone(),
                    entry.description.clone(),
                ),
            )
            .await
            .map_err(|e| query_error(e, None))?;
        Ok(())
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        self.select_names("SELECT table_name FROM system_schema.tables WHERE keyspace_name = ?")
            .await
    }

    async fn list_types(&self) -> DbResult<Vec<String>> {
        self.select_names("SELECT type_name FROM system_schema.types WHERE keyspace_name = ?")
            .await
    }

    fn keyspace(&self) -> &KeyspaceName {
        &self.keyspace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_consistency_default() {
        assert_eq!(parse_consistency(None).unwrap(), Consistency::Quorum);
    }

    #[test]
    fn test_parse_consistency_names() {
        assert_eq!(
            parse_consistency(Some("LOCAL_QUORUM")).unwrap(),
            Consistency::LocalQuorum
        );
        assert_eq!(parse_consistency(Some("one")).unwrap(), Consistency::One);
        assert!(parse_consistency(Some("most")).is_err());
    }

    #[test]
    fn test_query_error_ignores_object_names_in_statement() {
        let err = QueryError::DbError(
            ServerError::Invalid,
            "Cannot drop user type ks.connection_info as it is still used by ks.endpoint"
                .to_string(),
        );
        let mapped = query_error(err, Some("DROP TYPE IF EXISTS ks.\"connection_info\""));
        assert!(matches!(mapped, DbError::ExecutionError(_)));
        assert!(!mapped.is_unavailable());
        assert!(mapped.to_string().contains("DROP TYPE IF EXISTS ks.\"connection_info\""));
    }

    #[test]
    fn test_query_error_missing_table() {
        let err = QueryError::DbError(
            ServerError::Invalid,
            "unconfigured table schema_version".to_string(),
        );
        assert!(matches!(query_error(err, None), DbError::TableNotFound(_)));
    }

    #[test]
    fn test_query_error_transport_failures() {
        assert!(query_error(QueryError::TimeoutError, None).is_unavailable());
        let err = QueryError::DbError(ServerError::Overloaded, "busy".to_string());
        assert!(query_error(err, Some("CREATE TABLE session_timeout (k int PRIMARY KEY)"))
            .is_unavailable());
    }

    #[test]
    fn test_to_datetime() {
        let dt = to_datetime(Some(CqlTimestamp(1_700_000_000_000)));
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(to_datetime(None), DateTime::<Utc>::default());
    }
}
