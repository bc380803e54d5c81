//! repair-version command implementation

use anyhow::Result;
use ksm_migrate::VersionStore;

use crate::cli::GlobalArgs;
use crate::commands::common::{close_after, connect, connection_config, target_keyspace};

/// Execute the repair-version command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let connection = connection_config(global)?;
    let keyspace = target_keyspace(&connection)?;
    let client = connect(&connection, &keyspace).await?;

    let result = VersionStore::new(&client).repair().await;
    match close_after(&client, result).await? {
        Some(version) => println!("Current version of '{}' set to {}", keyspace, version),
        None => println!("Current version of '{}' already matches the update log", keyspace),
    }
    Ok(())
}
