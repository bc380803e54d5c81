//! Dotted numeric schema versions (`major.minor.patch`, any depth).

use crate::error::{CoreError, CoreResult};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A parsed schema version such as `0.1` or `1.2.3`.
///
/// Comparison zero-pads the shorter version on the right, so `1.2` and
/// `1.2.0` are equal. A single leading `v` is accepted and dropped when
/// parsing, which lets step directories be named `v0.2`.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    /// Parse and validate a version string.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            version: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if body.is_empty() {
            return Err(invalid("version is empty"));
        }

        let mut parts = Vec::new();
        for component in body.split('.') {
            if component.is_empty() {
                return Err(invalid("empty component (leading, trailing or doubled dot)"));
            }
            if !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(&format!("component '{}' is not a number", component)));
            }
            let value = component
                .parse::<u64>()
                .map_err(|_| invalid(&format!("component '{}' is out of range", component)))?;
            parts.push(value);
        }

        Ok(Self { parts })
    }

    /// Numeric components in order.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Components with trailing zeros removed; equal versions share this form.
    fn significant(&self) -> &[u64] {
        let len = self
            .parts
            .iter()
            .rposition(|&p| p != 0)
            .map_or(0, |pos| pos + 1);
        &self.parts[..len]
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Version {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
