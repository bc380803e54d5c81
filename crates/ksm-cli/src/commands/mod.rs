//! CLI command implementations

pub(crate) mod common;
pub(crate) mod create_keyspace;
pub(crate) mod repair;
pub(crate) mod setup;
pub(crate) mod status;
pub(crate) mod update;
