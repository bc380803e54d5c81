//! Task configuration and the optional `ksm.yml` connection profile.
//!
//! The raw `*Config` structs are filled in by whatever front end drives the
//! tool. Each has a `validate()` that produces the typed value the migration
//! engine consumes, so nothing past this point deals with flag names or
//! unparsed version strings.

use crate::error::{CoreError, CoreResult};
use crate::keyspace::KeyspaceName;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default CQL native transport port.
pub const DEFAULT_PORT: u16 = 9042;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection profile loaded from `ksm.yml`.
///
/// Every field can be overridden on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Comma separated contact points, with or without `:port`
    #[serde(default)]
    pub hosts: String,

    /// Port applied to hosts that do not name one
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Keyspace the schema tasks operate on
    #[serde(default)]
    pub keyspace: Option<String>,

    /// Default consistency level (`one`, `quorum`, `local_quorum`, ...)
    #[serde(default)]
    pub consistency: Option<String>,

    /// Preferred datacenter for request routing
    #[serde(default)]
    pub datacenter: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: String::new(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            keyspace: None,
            consistency: None,
            datacenter: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConnectionConfig {
    /// Load a connection profile from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        log::debug!("Loading connection profile {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ConnectionConfig =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        Ok(config)
    }

    /// Look for `ksm.yml` or `ksm.yaml` in a directory.
    ///
    /// Returns `Ok(None)` when neither exists; the profile is optional.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Option<Self>> {
        let yml_path = dir.join("ksm.yml");
        let yaml_path = dir.join("ksm.yaml");

        if yml_path.exists() {
            Self::load(&yml_path).map(Some)
        } else if yaml_path.exists() {
            Self::load(&yaml_path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Contact points as `host:port`, filling in the default port.
    pub fn contact_points(&self) -> CoreResult<Vec<String>> {
        let points: Vec<String> = self
            .hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| {
                if h.contains(':') {
                    h.to_string()
                } else {
                    format!("{}:{}", h, self.port)
                }
            })
            .collect();

        if points.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "missing cassandra endpoint (hosts)".to_string(),
            });
        }
        Ok(points)
    }
}

/// Whether setup records a schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Versioning {
    /// Create the version tables and record this initial version.
    Enabled(Version),
    /// Apply the schema only; no version tables are touched.
    Disabled,
}

/// Raw input for a schema setup task.
#[derive(Debug, Clone, Default)]
pub struct SetupConfig {
    pub keyspace: String,
    pub schema_file: Option<PathBuf>,
    pub initial_version: Option<String>,
    /// Drop every table and type in the keyspace first
    pub overwrite: bool,
    pub disable_versioning: bool,
}

/// A setup task that passed validation.
#[derive(Debug, Clone)]
pub struct SetupTask {
    pub keyspace: KeyspaceName,
    pub schema_file: Option<PathBuf>,
    pub versioning: Versioning,
    pub overwrite: bool,
}

impl SetupConfig {
    /// Check the configuration before anything touches the cluster.
    ///
    /// Exactly one of "initial version given" and "versioning disabled" must
    /// hold, and disabling versioning requires a schema file.
    pub fn validate(&self) -> CoreResult<SetupTask> {
        let keyspace = KeyspaceName::parse(self.keyspace.clone())?;

        let version = self
            .initial_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let versioning = match (version, self.disable_versioning) {
            (Some(_), true) | (None, false) => {
                return Err(CoreError::ConfigInvalid {
                    message: "either an initial version or disabled versioning, but not both, must be specified".to_string(),
                });
            }
            (Some(v), false) => Versioning::Enabled(Version::parse(v).map_err(|e| {
                CoreError::ConfigInvalid {
                    message: format!("invalid initial version: {}", e),
                }
            })?),
            (None, true) => Versioning::Disabled,
        };

        if versioning == Versioning::Disabled && self.schema_file.is_none() {
            return Err(CoreError::ConfigInvalid {
                message: "a schema file is required when versioning is disabled".to_string(),
            });
        }

        Ok(SetupTask {
            keyspace,
            schema_file: self.schema_file.clone(),
            versioning,
            overwrite: self.overwrite,
        })
    }
}

/// Raw input for a schema update task.
#[derive(Debug, Clone, Default)]
pub struct UpdateConfig {
    pub keyspace: String,
    pub schema_dir: PathBuf,
    /// Upgrade to this version; the highest discovered one when unset
    pub target_version: Option<String>,
    pub dry_run: bool,
}

/// An update task that passed validation.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub keyspace: KeyspaceName,
    pub schema_dir: PathBuf,
    pub target_version: Option<Version>,
    pub dry_run: bool,
}

impl UpdateConfig {
    pub fn validate(&self) -> CoreResult<UpdateTask> {
        let keyspace = KeyspaceName::parse(self.keyspace.clone())?;

        if self.schema_dir.as_os_str().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "missing schema directory".to_string(),
            });
        }

        let target_version = match self
            .target_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            Some(v) => Some(Version::parse(v).map_err(|e| CoreError::ConfigInvalid {
                message: format!("invalid target version: {}", e),
            })?),
            None => None,
        };

        Ok(UpdateTask {
            keyspace,
            schema_dir: self.schema_dir.clone(),
            target_version,
            dry_run: self.dry_run,
        })
    }
}

/// Raw input for keyspace creation.
#[derive(Debug, Clone)]
pub struct CreateKeyspaceConfig {
    pub keyspace: String,
    pub replication_factor: u32,
}

impl Default for CreateKeyspaceConfig {
    fn default() -> Self {
        Self {
            keyspace: String::new(),
            replication_factor: 1,
        }
    }
}

impl CreateKeyspaceConfig {
    pub fn validate(&self) -> CoreResult<(KeyspaceName, u32)> {
        let keyspace = KeyspaceName::parse(self.keyspace.clone())?;
        if self.replication_factor == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "replication factor must be at least 1".to_string(),
            });
        }
        Ok((keyspace, self.replication_factor))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
