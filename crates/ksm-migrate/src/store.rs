//! Version store backed by the two version tables in the target keyspace.
//!
//! The current-version row is a cache of the newest update-log entry. Writes
//! go to the log first, so a failure between the two statements leaves the
//! log ahead of the row and the version can still be recomputed. Reads trust
//! the log whenever the two disagree.

use crate::error::{MigrateError, MigrateResult, Phase};
use chrono::Utc;
use ksm_core::{cql_utils, Version};
use ksm_db::{SchemaClient, UpdateLogEntry, VERSION_TABLES_DDL};

/// Raw contents of both version tables.
#[derive(Debug, Clone)]
pub struct VersionStatus {
    /// Value of the current-version row, if present
    pub row: Option<String>,
    /// Update log, oldest first
    pub log: Vec<UpdateLogEntry>,
}

impl VersionStatus {
    fn parse_stored(text: &str, what: &str) -> MigrateResult<Version> {
        Version::parse(text).map_err(|e| {
            MigrateError::StoreCorrupt(format!("{} '{}' is not a version: {}", what, text, e))
        })
    }

    /// The version the keyspace is at: the newest log entry, else the row.
    pub fn effective(&self) -> MigrateResult<Version> {
        match (&self.row, self.log.last()) {
            (_, Some(entry)) => Self::parse_stored(&entry.new_version, "update log version"),
            (Some(row), None) => Self::parse_stored(row, "current version row"),
            (None, None) => Err(MigrateError::NotInitialized),
        }
    }

    /// Whether the row agrees with the newest log entry.
    pub fn is_consistent(&self) -> bool {
        let Some(entry) = self.log.last() else {
            return true;
        };
        match (&self.row, Version::parse(&entry.new_version)) {
            (Some(row), Ok(logged)) => Version::parse(row).is_ok_and(|r| r == logged),
            _ => false,
        }
    }
}

/// Reads and writes the recorded schema version of one keyspace.
pub struct VersionStore<'a> {
    client: &'a dyn SchemaClient,
}

impl<'a> VersionStore<'a> {
    pub fn new(client: &'a dyn SchemaClient) -> Self {
        Self { client }
    }

    /// Create the version tables if they do not exist yet.
    pub async fn initialize(&self) -> MigrateResult<()> {
        for ddl in VERSION_TABLES_DDL {
            log::debug!("{}", ddl);
            self.client.exec(ddl).await.map_err(MigrateError::from_store)?;
        }
        Ok(())
    }

    /// Both version tables as stored.
    pub async fn status(&self) -> MigrateResult<VersionStatus> {
        let row = self
            .client
            .read_current_version()
            .await
            .map_err(MigrateError::from_store)?;
        let log = self
            .client
            .read_update_log()
            .await
            .map_err(MigrateError::from_store)?;
        Ok(VersionStatus { row, log })
    }

    /// The current schema version.
    ///
    /// Fails with `NotInitialized` when the tables are missing or empty.
    pub async fn current_version(&self) -> MigrateResult<Version> {
        let status = self.status().await?;
        let version = status.effective()?;
        if !status.is_consistent() {
            log::warn!(
                "Current version row ({}) disagrees with the update log ({}) in keyspace '{}'; using the log. Run repair-version to fix the row.",
                status.row.as_deref().unwrap_or("<missing>"),
                version,
                self.client.keyspace()
            );
        }
        Ok(version)
    }

    /// Append one log entry, then overwrite the current-version row.
    pub async fn record_version(
        &self,
        old: &Version,
        new: &Version,
        manifest_ref: &str,
        description: &str,
    ) -> MigrateResult<()> {
        let entry = UpdateLogEntry {
            old_version: old.to_string(),
            new_version: new.to_string(),
            manifest_ref: manifest_ref.to_string(),
            description: description.to_string(),
            updated_at: Utc::now(),
        };
        self.client
            .append_update_log(&entry)
            .await
            .map_err(MigrateError::from_store)?;
        self.client
            .write_current_version(&entry.new_version)
            .await
            .map_err(MigrateError::from_store)?;
        log::debug!(
            "Recorded version {} -> {} for keyspace '{}'",
            old,
            new,
            self.client.keyspace()
        );
        Ok(())
    }

    /// All update log entries, oldest first.
    pub async fn update_log(&self) -> MigrateResult<Vec<UpdateLogEntry>> {
        self.client
            .read_update_log()
            .await
            .map_err(MigrateError::from_store)
    }

    /// Rewrite the current-version row from the newest log entry.
    ///
    /// Returns the version written, or `None` when the row was already in
    /// agreement with the log.
    pub async fn repair(&self) -> MigrateResult<Option<Version>> {
        let status = self.status().await?;
        if status.log.is_empty() {
            return match status.row {
                None => Err(MigrateError::NotInitialized),
                Some(_) => Ok(None),
            };
        }
        if status.is_consistent() {
            return Ok(None);
        }
        let version = status.effective()?;
        self.client
            .write_current_version(&version.to_string())
            .await
            .map_err(MigrateError::from_store)?;
        log::info!(
            "Repaired current version of keyspace '{}' to {}",
            self.client.keyspace(),
            version
        );
        Ok(Some(version))
    }

    /// Drop every table, version tables included, then every type.
    ///
    /// Types may reference each other, so they are dropped in passes until
    /// one pass makes no progress. Returns the names of dropped objects.
    pub async fn drop_all(&self) -> MigrateResult<Vec<String>> {
        let keyspace = self.client.keyspace();
        let mut dropped: Vec<String> = Vec::new();

        let tables = self
            .client
            .list_tables()
            .await
            .map_err(MigrateError::from_store)?;
        for table in tables {
            let cql = cql_utils::drop_table(keyspace, &table);
            log::info!("{}", cql);
            if let Err(e) = self.client.exec(&cql).await {
                return Err(Self::drop_failure(&dropped, cql, e));
            }
            dropped.push(table);
        }

        let mut remaining = self
            .client
            .list_types()
            .await
            .map_err(MigrateError::from_store)?;
        while !remaining.is_empty() {
            let mut blocked = Vec::new();
            let mut last_failure = None;
            for type_name in &remaining {
                let cql = cql_utils::drop_type(keyspace, type_name);
                log::info!("{}", cql);
                match self.client.exec(&cql).await {
                    Ok(()) => dropped.push(type_name.clone()),
                    Err(e) if e.is_unavailable() => {
                        return Err(Self::drop_failure(&dropped, cql, e));
                    }
                    Err(e) => {
                        log::debug!("Could not drop type {} yet: {}", type_name, e);
                        blocked.push(type_name.clone());
                        last_failure = Some((cql, e));
                    }
                }
            }
            if blocked.len() == remaining.len() {
                if let Some((cql, e)) = last_failure {
                    return Err(Self::drop_failure(&dropped, cql, e));
                }
            }
            remaining = blocked;
        }

        Ok(dropped)
    }

    fn drop_failure(dropped: &[String], statement: String, err: ksm_db::DbError) -> MigrateError {
        if dropped.is_empty() {
            return MigrateError::from_store(err);
        }
        MigrateError::PartialApplication {
            phase: Phase::Setup,
            last_succeeded: Some(dropped.len() - 1),
            statement,
            source: err,
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
