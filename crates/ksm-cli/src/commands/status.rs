//! status command implementation

use anyhow::Result;
use ksm_db::UpdateLogEntry;
use ksm_migrate::{ErrorKind, MigrateError, VersionStatus, VersionStore};
use serde_json::json;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{
    close_after, connect, connection_config, exit_code_for_kind, target_keyspace, ExitCode,
};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let connection = connection_config(global)?;
    let keyspace = target_keyspace(&connection)?;
    let client = connect(&connection, &keyspace).await?;

    let result = VersionStore::new(&client).status().await;
    let status = close_after(&client, result).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&status_json(&keyspace, &status))?);
    } else {
        print_status(&keyspace, &status)?;
    }
    Ok(())
}

fn entry_json(entry: &UpdateLogEntry) -> serde_json::Value {
    json!({
        "old_version": entry.old_version,
        "new_version": entry.new_version,
        "manifest_ref": entry.manifest_ref,
        "description": entry.description,
        "updated_at": entry.updated_at.to_rfc3339(),
    })
}

fn status_json(keyspace: &str, status: &VersionStatus) -> serde_json::Value {
    json!({
        "keyspace": keyspace,
        "current_version": status.effective().ok().map(|v| v.to_string()),
        "version_row": status.row,
        "consistent": status.is_consistent(),
        "history": status.log.iter().rev().map(entry_json).collect::<Vec<_>>(),
    })
}

fn print_status(keyspace: &str, status: &VersionStatus) -> Result<()> {
    let current = match status.effective() {
        Ok(version) => version,
        Err(MigrateError::NotInitialized) => {
            println!("Keyspace '{}' has no recorded schema version", keyspace);
            return Err(ExitCode(exit_code_for_kind(ErrorKind::NotInitialized)).into());
        }
        Err(e) => return Err(e.into()),
    };
    println!("Keyspace:        {}", keyspace);
    println!("Current version: {}", current);
    if !status.is_consistent() {
        println!(
            "Version row:     {} (out of date, run repair-version)",
            status.row.as_deref().unwrap_or("<missing>")
        );
    }

    if status.log.is_empty() {
        return Ok(());
    }
    println!();
    println!("History (newest first):");
    for entry in status.log.iter().rev() {
        println!(
            "  {}  {} -> {}  {}",
            entry.updated_at.format("%Y-%m-%d %H:%M:%S"),
            entry.old_version,
            entry.new_version,
            entry.description
        );
    }
    Ok(())
}
