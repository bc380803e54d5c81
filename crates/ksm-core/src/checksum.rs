//! SHA-256 digests used as the manifest reference in the update log.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 of a schema source
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            compute_checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_differs_on_content() {
        assert_ne!(compute_checksum("a"), compute_checksum("b"));
    }
}
