//! setup-schema command implementation

use anyhow::Result;
use ksm_core::SetupConfig;
use ksm_migrate::{LocalFs, Migrator};

use crate::cli::{GlobalArgs, SetupSchemaArgs};
use crate::commands::common::{close_after, connect, connection_config, target_keyspace};

/// Execute the setup-schema command
pub async fn execute(args: &SetupSchemaArgs, global: &GlobalArgs) -> Result<()> {
    let connection = connection_config(global)?;
    let config = SetupConfig {
        keyspace: target_keyspace(&connection)?,
        schema_file: args.schema_file.clone(),
        initial_version: args.initial_version.clone(),
        overwrite: args.overwrite,
        disable_versioning: args.disable_versioning,
    };
    // Fail on bad flags before opening a session.
    config.validate()?;

    if config.overwrite {
        log::warn!(
            "--overwrite drops every table and type in keyspace '{}' before setup",
            config.keyspace
        );
    }

    let client = connect(&connection, &config.keyspace).await?;
    let result = Migrator::new(&client, &LocalFs).setup(&config).await;
    let report = close_after(&client, result).await?;

    if !report.dropped.is_empty() {
        println!("Dropped {} object(s)", report.dropped.len());
    }
    match &report.version {
        Some(version) => println!(
            "Keyspace '{}' set up at version {} ({} statement(s))",
            report.keyspace, version, report.statements_applied
        ),
        None => println!(
            "Keyspace '{}' set up without versioning ({} statement(s))",
            report.keyspace, report.statements_applied
        ),
    }
    Ok(())
}
