//! create-keyspace command implementation

use anyhow::Result;
use ksm_core::CreateKeyspaceConfig;

use crate::cli::{CreateKeyspaceArgs, GlobalArgs};
use crate::commands::common::{close_after, connect, connection_config, target_keyspace};

/// Keyspace the session is bound to while creating another one.
const SYSTEM_KEYSPACE: &str = "system";

/// Execute the create-keyspace command
pub async fn execute(args: &CreateKeyspaceArgs, global: &GlobalArgs) -> Result<()> {
    let connection = connection_config(global)?;
    let config = CreateKeyspaceConfig {
        keyspace: target_keyspace(&connection)?,
        replication_factor: args.replication_factor,
    };
    config.validate()?;

    let client = connect(&connection, SYSTEM_KEYSPACE).await?;
    let result = ksm_migrate::create_keyspace(&client, &config).await;
    let keyspace = close_after(&client, result).await?;
    println!(
        "Keyspace '{}' ready (replication factor {})",
        keyspace, config.replication_factor
    );
    Ok(())
}
