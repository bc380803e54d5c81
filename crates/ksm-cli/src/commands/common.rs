//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use ksm_core::{ConnectionConfig, CoreError, KeyspaceName};
use ksm_db::{DbError, SchemaClient, ScyllaClient};
use ksm_migrate::{ErrorKind, MigrateError};
use std::fmt;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Process exit code for each migration error kind.
pub(crate) fn exit_code_for_kind(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => 2,
        ErrorKind::Parse => 3,
        ErrorKind::Path
        | ErrorKind::GapInPath
        | ErrorKind::VersionNotFound
        | ErrorKind::AmbiguousStep
        | ErrorKind::NoUpgradePath => 4,
        ErrorKind::StoreUnavailable => 5,
        ErrorKind::NotInitialized | ErrorKind::NotSetUp => 6,
        ErrorKind::StoreCorrupt => 7,
        ErrorKind::PartialApplication => 8,
        ErrorKind::Execution => 9,
    }
}

/// Map any command failure to a process exit code.
///
/// Falls back to 1 for errors that carry no classification.
pub(crate) fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(code) = err.downcast_ref::<ExitCode>() {
        return code.0;
    }
    for cause in err.chain() {
        if let Some(migrate) = cause.downcast_ref::<MigrateError>() {
            return exit_code_for_kind(migrate.kind());
        }
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return match core {
                CoreError::ConfigNotFound { .. }
                | CoreError::ConfigParseError { .. }
                | CoreError::ConfigInvalid { .. } => exit_code_for_kind(ErrorKind::Configuration),
                _ => 1,
            };
        }
    }
    1
}

/// Install the logger. `RUST_LOG` wins over the flags.
pub(crate) fn init_logger(global: &GlobalArgs) {
    let level = if global.quiet {
        "warn"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Load the connection profile and apply command line overrides.
pub(crate) fn connection_config(global: &GlobalArgs) -> Result<ConnectionConfig> {
    let mut config = match &global.config {
        Some(path) => ConnectionConfig::load(path)
            .with_context(|| format!("Failed to load connection profile {}", path.display()))?,
        None => ConnectionConfig::load_from_dir(&global.config_dir)
            .context("Failed to load connection profile")?
            .unwrap_or_default(),
    };

    if let Some(endpoint) = &global.endpoint {
        config.hosts = endpoint.clone();
    }
    if let Some(port) = global.port {
        config.port = port;
    }
    if global.user.is_some() {
        config.user = global.user.clone();
    }
    if global.password.is_some() {
        config.password = global.password.clone();
    }
    if global.keyspace.is_some() {
        config.keyspace = global.keyspace.clone();
    }
    if global.consistency.is_some() {
        config.consistency = global.consistency.clone();
    }
    if global.datacenter.is_some() {
        config.datacenter = global.datacenter.clone();
    }
    if let Some(timeout) = global.timeout {
        config.timeout_secs = timeout;
    }

    config.contact_points()?;
    Ok(config)
}

/// Keyspace from flags or profile; required by every command.
pub(crate) fn target_keyspace(config: &ConnectionConfig) -> Result<String> {
    match config.keyspace.as_deref().map(str::trim) {
        Some(keyspace) if !keyspace.is_empty() => Ok(keyspace.to_string()),
        _ => Err(MigrateError::Configuration(
            "missing keyspace (--keyspace, KSM_KEYSPACE or keyspace in ksm.yml)".to_string(),
        )
        .into()),
    }
}

/// Open a session bound to `keyspace`.
pub(crate) async fn connect(config: &ConnectionConfig, keyspace: &str) -> Result<ScyllaClient> {
    let keyspace = KeyspaceName::parse(keyspace)?;
    log::debug!("Connecting to {} (keyspace '{}')", config.hosts, keyspace);
    ScyllaClient::connect(config, keyspace)
        .await
        .map_err(|e| match e {
            DbError::ConnectionError(_) => MigrateError::StoreUnavailable(e),
            other => MigrateError::Execution(other),
        })
        .context("Failed to connect to cluster")
}

/// Close the session once a task has finished, whatever its outcome.
///
/// A failed close is logged; it never replaces the task's own result.
pub(crate) async fn close_after<T, E>(
    client: &dyn SchemaClient,
    result: std::result::Result<T, E>,
) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    if let Err(e) = client.close().await {
        log::warn!("Failed to close session for keyspace '{}': {}", client.keyspace(), e);
    }
    result.map_err(Into::into)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
