//! In-memory backend implementation
//!
//! Keeps a tiny catalog of the tables and types created through `exec`, plus
//! the version rows, so the migration engine can be exercised end to end
//! without a cluster. Failures can be injected per statement to rehearse
//! partial application.

use crate::error::{DbError, DbResult};
use crate::traits::{SchemaClient, UpdateLogEntry, UPDATE_LOG_TABLE, VERSION_TABLE};
use async_trait::async_trait;
use ksm_core::KeyspaceName;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    tables: Vec<String>,
    types: Vec<String>,
    current_version: Option<String>,
    update_log: Vec<UpdateLogEntry>,
    executed: Vec<String>,
    fail_on: Vec<String>,
    disconnect_on: Vec<String>,
    fail_version_row_writes: bool,
    unreachable: bool,
    closed: bool,
}

impl MemoryState {
    fn require_version_tables(&self) -> DbResult<()> {
        for table in [VERSION_TABLE, UPDATE_LOG_TABLE] {
            if !self.tables.iter().any(|t| t == table) {
                return Err(DbError::TableNotFound(format!("unconfigured table {}", table)));
            }
        }
        Ok(())
    }
}

/// DDL shapes the catalog understands; everything else is accepted as-is.
#[derive(Debug, PartialEq, Eq)]
enum CatalogChange {
    CreateTable { name: String, if_not_exists: bool },
    CreateType { name: String, if_not_exists: bool },
    DropTable { name: String, if_exists: bool },
    DropType { name: String, if_exists: bool },
    Other,
}

/// Reduce a possibly keyspace-qualified, possibly quoted name to its catalog key.
fn object_name(token: &str) -> String {
    let token = token.split('(').next().unwrap_or(token);
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in token.char_indices() {
        if c == '"' {
            in_quote = !in_quote;
        } else if c == '.' && !in_quote {
            start = i + 1;
        }
    }
    let local = &token[start..];
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        local[1..local.len() - 1].replace("\"\"", "\"")
    } else {
        local.to_lowercase()
    }
}

fn classify(cql: &str) -> CatalogChange {
    let words: Vec<&str> = cql.split_whitespace().collect();
    let upper: Vec<String> = words.iter().take(5).map(|w| w.to_uppercase()).collect();
    let upper: Vec<&str> = upper.iter().map(String::as_str).collect();

    let (verb, kind, rest) = match upper.as_slice() {
        [verb @ ("CREATE" | "DROP"), kind @ ("TABLE" | "COLUMNFAMILY" | "TYPE"), ..] => {
            (*verb, *kind, &words[2..])
        }
        _ => return CatalogChange::Other,
    };

    let rest_upper: Vec<String> = rest.iter().take(3).map(|w| w.to_uppercase()).collect();
    let (guarded, name) = match (verb, rest_upper.as_slice()) {
        ("CREATE", [a, b, c, ..]) if a == "IF" && b == "NOT" && c == "EXISTS" => {
            (true, rest.get(3))
        }
        ("DROP", [a, b, ..]) if a == "IF" && b == "EXISTS" => (true, rest.get(2)),
        _ => (false, rest.first()),
    };
    let Some(name) = name.map(|n| object_name(n)) else {
        return CatalogChange::Other;
    };

    match (verb, kind) {
        ("CREATE", "TYPE") => CatalogChange::CreateType {
            name,
            if_not_exists: guarded,
        },
        ("CREATE", _) => CatalogChange::CreateTable {
            name,
            if_not_exists: guarded,
        },
        ("DROP", "TYPE") => CatalogChange::DropType {
            name,
            if_exists: guarded,
        },
        _ => CatalogChange::DropTable {
            name,
            if_exists: guarded,
        },
    }
}

/// Apply a create to one catalog list, honoring `IF NOT EXISTS`.
fn create_object(list: &mut Vec<String>, what: &str, name: String, guarded: bool) -> DbResult<()> {
    if list.contains(&name) {
        if guarded {
            return Ok(());
        }
        return Err(DbError::ExecutionError(format!("{} {} already exists", what, name)));
    }
    list.push(name);
    Ok(())
}

/// Apply a drop to one catalog list, honoring `IF EXISTS`.
fn drop_object(list: &mut Vec<String>, what: &str, name: &str, guarded: bool) -> DbResult<()> {
    match list.iter().position(|n| n == name) {
        Some(pos) => {
            list.remove(pos);
            Ok(())
        }
        None if guarded => Ok(()),
        None => Err(DbError::ExecutionError(format!("{} {} does not exist", what, name))),
    }
}

/// In-memory stand-in for a cluster keyspace.
pub struct MemoryClient {
    keyspace: KeyspaceName,
    state: Mutex<MemoryState>,
}

impl MemoryClient {
    pub fn new(keyspace: KeyspaceName) -> Self {
        Self {
            keyspace,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn inspect(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every statement containing `fragment` fail.
    pub fn fail_on(&self, fragment: impl Into<String>) {
        self.inspect().fail_on.push(fragment.into());
    }

    /// Make every statement containing `fragment` fail as a lost connection.
    pub fn disconnect_on(&self, fragment: impl Into<String>) {
        self.inspect().disconnect_on.push(fragment.into());
    }

    /// Remove all injected statement failures.
    pub fn clear_failures(&self) {
        let mut state = self.inspect();
        state.fail_on.clear();
        state.disconnect_on.clear();
        state.fail_version_row_writes = false;
    }

    /// Make writes of the current-version row fail (the log still accepts writes).
    pub fn fail_version_row_writes(&self, fail: bool) {
        self.inspect().fail_version_row_writes = fail;
    }

    /// Simulate a cluster that cannot be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inspect().unreachable = unreachable;
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inspect().closed
    }

    /// Statements that executed successfully, in order.
    pub fn executed(&self) -> Vec<String> {
        self.inspect().executed.clone()
    }

    /// Tables currently in the keyspace, in creation order.
    pub fn tables(&self) -> Vec<String> {
        self.inspect().tables.clone()
    }

    /// Types currently in the keyspace, in creation order.
    pub fn types(&self) -> Vec<String> {
        self.inspect().types.clone()
    }

    /// Overwrite the current-version row directly, bypassing the log.
    pub fn force_current_version(&self, version: Option<&str>) {
        self.inspect().current_version = version.map(String::from);
    }

    fn check_reachable(state: &MemoryState) -> DbResult<()> {
        if state.unreachable {
            return Err(DbError::ConnectionError(
                "no known nodes are reachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaClient for MemoryClient {
    async fn exec(&self, cql: &str) -> DbResult<()> {
        let mut state = self.lock()?;
        Self::check_reachable(&state)?;

        if let Some(fragment) = state
            .disconnect_on
            .iter()
            .find(|f| cql.contains(f.as_str()))
        {
            return Err(DbError::ConnectionError(format!(
                "injected connection loss on '{}'",
                fragment
            )));
        }
        if let Some(fragment) = state.fail_on.iter().find(|f| cql.contains(f.as_str())) {
            return Err(DbError::ExecutionError(format!(
                "injected failure on '{}': {}",
                fragment, cql
            )));
        }

        match classify(cql) {
            CatalogChange::CreateTable {
                name,
                if_not_exists,
            } => create_object(&mut state.tables, "table", name, if_not_exists)?,
            CatalogChange::CreateType {
                name,
                if_not_exists,
            } => create_object(&mut state.types, "type", name, if_not_exists)?,
            CatalogChange::DropTable { name, if_exists } => {
                drop_object(&mut state.tables, "table", &name, if_exists)?;
                if name == VERSION_TABLE {
                    state.current_version = None;
                } else if name == UPDATE_LOG_TABLE {
                    state.update_log.clear();
                }
            }
            CatalogChange::DropType { name, if_exists } => {
                drop_object(&mut state.types, "type", &name, if_exists)?
            }
            CatalogChange::Other => {}
        }

        state.executed.push(cql.to_string());
        Ok(())
    }

    async fn read_current_version(&self) -> DbResult<Option<String>> {
        let state = self.lock()?;
        Self::check_reachable(&state)?;
        state.require_version_tables()?;
        Ok(state.current_version.clone())
    }

    async fn write_current_version(&self, version: &str) -> DbResult<()> {
        let mut state = self.lock()?;
        Self::check_reachable(&state)?;
        state.require_version_tables()?;
        if state.fail_version_row_writes {
            return Err(DbError::ExecutionError(
                "injected failure writing current version".to_string(),
            ));
        }
        state.current_version = Some(version.to_string());
        Ok(())
    }

    async fn read_update_log(&self) -> DbResult<Vec<UpdateLogEntry>> {
        let state = self.lock()?;
        Self::check_reachable(&state)?;
        state.require_version_tables()?;
        Ok(state.update_log.clone())
    }

    async fn append_update_log(&self, entry: &UpdateLogEntry) -> DbResult<()> {
        let mut state = self.lock()?;
        Self::check_reachable(&state)?;
        state.require_version_tables()?;
        state.update_log.push(entry.clone());
        Ok(())
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        let state = self.lock()?;
        Self::check_reachable(&state)?;
        Ok(state.tables.clone())
    }

    async fn list_types(&self) -> DbResult<Vec<String>> {
        let state = self.lock()?;
        Self::check_reachable(&state)?;
        Ok(state.types.clone())
    }

    fn keyspace(&self) -> &KeyspaceName {
        &self.keyspace
    }

    async fn close(&self) -> DbResult<()> {
        self.lock()?.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
