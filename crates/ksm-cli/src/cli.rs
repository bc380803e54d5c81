//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ksm - versioned schema setup and migration for Cassandra keyspaces
#[derive(Parser, Debug)]
#[command(name = "ksm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and logging options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Comma separated cluster contact points
    #[arg(short, long, global = true, env = "KSM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Native transport port for endpoints without one
    #[arg(long, global = true, env = "KSM_PORT")]
    pub port: Option<u16>,

    /// Username for password authentication
    #[arg(short, long, global = true, env = "KSM_USER")]
    pub user: Option<String>,

    /// Password for password authentication
    #[arg(long, global = true, env = "KSM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Target keyspace
    #[arg(short, long, global = true, env = "KSM_KEYSPACE")]
    pub keyspace: Option<String>,

    /// Consistency level (one, quorum, local_quorum, all, ...)
    #[arg(long, global = true)]
    pub consistency: Option<String>,

    /// Preferred datacenter
    #[arg(long, global = true)]
    pub datacenter: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Connection profile file (default: ksm.yml in --config-dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory searched for ksm.yml / ksm.yaml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a full schema file to a keyspace and record its initial version
    SetupSchema(SetupSchemaArgs),

    /// Upgrade a keyspace through the version steps in a schema directory
    UpdateSchema(UpdateSchemaArgs),

    /// Create a keyspace with SimpleStrategy replication
    CreateKeyspace(CreateKeyspaceArgs),

    /// Show the recorded version and update history of a keyspace
    Status(StatusArgs),

    /// Rewrite the current-version row from the update log
    RepairVersion,
}

/// Arguments for the setup-schema command
#[derive(Args, Debug)]
pub struct SetupSchemaArgs {
    /// CQL file with the full schema
    #[arg(short = 'f', long)]
    pub schema_file: Option<PathBuf>,

    /// Version to record once the schema is applied
    #[arg(short, long)]
    pub initial_version: Option<String>,

    /// Drop every table and type in the keyspace first
    #[arg(short, long)]
    pub overwrite: bool,

    /// Apply the schema without recording a version
    #[arg(short, long)]
    pub disable_versioning: bool,
}

/// Arguments for the update-schema command
#[derive(Args, Debug)]
pub struct UpdateSchemaArgs {
    /// Directory containing one subdirectory per version step
    #[arg(short = 'd', long)]
    pub schema_dir: PathBuf,

    /// Version to upgrade to (default: highest version found)
    #[arg(short, long)]
    pub target_version: Option<String>,

    /// Log the statements that would run without executing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the create-keyspace command
#[derive(Args, Debug)]
pub struct CreateKeyspaceArgs {
    /// Replication factor for SimpleStrategy
    #[arg(short, long, default_value_t = 1)]
    pub replication_factor: u32,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
