//! Strongly-typed keyspace name wrapper.

use crate::error::{CoreError, CoreResult};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Longest keyspace name Cassandra accepts.
pub const MAX_KEYSPACE_LEN: usize = 48;

/// A validated keyspace name.
///
/// Keyspace names are interpolated into DDL (`CREATE KEYSPACE`, `DROP TABLE
/// ks.t`), so only the unquoted-identifier alphabet is accepted: ASCII
/// letters, digits and `_`, at most 48 characters. Unquoted identifiers are
/// case-insensitive, so the name is stored lowercased to match what
/// `system_schema` reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyspaceName(String);

impl KeyspaceName {
    /// Validate and wrap a keyspace name.
    pub fn parse(name: impl Into<String>) -> CoreResult<Self> {
        let s = name.into();
        if s.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "keyspace must not be empty".to_string(),
            });
        }
        if s.len() > MAX_KEYSPACE_LEN {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "keyspace '{}' is longer than {} characters",
                    s, MAX_KEYSPACE_LEN
                ),
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "keyspace '{}' may only contain letters, digits and underscores",
                    s
                ),
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for KeyspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyspaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for KeyspaceName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for KeyspaceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for KeyspaceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for KeyspaceName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
