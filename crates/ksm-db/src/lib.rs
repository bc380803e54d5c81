//! ksm-db - CQL client abstraction for ksm
//!
//! This crate provides the `SchemaClient` trait the migration engine executes
//! statements through, a ScyllaDB/Cassandra implementation, and an in-memory
//! implementation for tests and rehearsals.

pub mod error;
pub mod memory;
pub mod scylla_client;
pub mod traits;

pub use error::{DbError, DbResult};
pub use memory::MemoryClient;
pub use scylla_client::ScyllaClient;
pub use traits::{
    SchemaClient, UpdateLogEntry, UPDATE_LOG_TABLE, VERSION_TABLE, VERSION_TABLES_DDL,
};
