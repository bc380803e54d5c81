//! Schema version migration engine for ksm.
//!
//! Provides the version store kept in the target keyspace, upgrade path
//! resolution over a directory of version steps, and the setup and update
//! tasks that tie them together.

pub mod error;
pub mod fs;
pub mod orchestrator;
pub mod resolver;
pub mod store;

pub use error::{ErrorKind, MigrateError, MigrateResult, Phase};
pub use fs::{LocalFs, MemoryFs, SchemaFs};
pub use orchestrator::{
    create_keyspace, Migrator, SetupReport, StepSummary, UpdateReport,
    INITIAL_VERSION_DESCRIPTION,
};
pub use resolver::{discover_steps, resolve, DiscoveredStep, VersionStep};
pub use store::{VersionStatus, VersionStore};
