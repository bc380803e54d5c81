//! ksm-core - Core library for ksm
//!
//! This crate provides the schema version type, the CQL statement parser,
//! and the validated task configuration shared by the migration engine and
//! the command line front end.

pub mod checksum;
pub mod config;
pub mod cql_utils;
pub mod error;
pub mod keyspace;
pub mod statement;
pub mod version;

pub use checksum::compute_checksum;
pub use config::{
    ConnectionConfig, CreateKeyspaceConfig, SetupConfig, SetupTask, UpdateConfig, UpdateTask,
    Versioning,
};
pub use error::{CoreError, CoreResult};
pub use keyspace::KeyspaceName;
pub use statement::{parse_statements, SchemaManifest, Statement};
pub use version::Version;
