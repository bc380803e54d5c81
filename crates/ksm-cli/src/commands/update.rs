//! update-schema command implementation

use anyhow::Result;
use ksm_core::UpdateConfig;
use ksm_migrate::{LocalFs, Migrator};

use crate::cli::{GlobalArgs, UpdateSchemaArgs};
use crate::commands::common::{close_after, connect, connection_config, target_keyspace};

/// Execute the update-schema command
pub async fn execute(args: &UpdateSchemaArgs, global: &GlobalArgs) -> Result<()> {
    let connection = connection_config(global)?;
    let config = UpdateConfig {
        keyspace: target_keyspace(&connection)?,
        schema_dir: args.schema_dir.clone(),
        target_version: args.target_version.clone(),
        dry_run: args.dry_run,
    };
    config.validate()?;

    let client = connect(&connection, &config.keyspace).await?;
    let result = Migrator::new(&client, &LocalFs).update(&config).await;
    let report = close_after(&client, result).await?;

    if report.is_noop() {
        println!(
            "Keyspace '{}' is already at version {}",
            report.keyspace, report.to
        );
        return Ok(());
    }

    for step in &report.steps {
        println!(
            "  {} -> {}  {} statement(s)",
            step.from, step.to, step.statements
        );
    }
    if report.dry_run {
        println!(
            "Dry run: would upgrade '{}' from {} to {} in {} step(s)",
            report.keyspace,
            report.from,
            report.to,
            report.steps.len()
        );
    } else {
        println!(
            "Upgraded '{}' from {} to {} in {} step(s)",
            report.keyspace,
            report.from,
            report.to,
            report.steps.len()
        );
    }
    Ok(())
}
