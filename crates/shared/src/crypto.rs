//! Hashing utilities for admin API key verification.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented API key against a stored SHA-256 hex digest.
///
/// The comparison runs over every byte regardless of where the first
/// mismatch occurs. An empty stored hash never matches.
pub fn verify_api_key(presented: &str, stored_hash: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }

    let computed = sha256_hex(presented);
    let stored = stored_hash.to_ascii_lowercase();
    if computed.len() != stored.len() {
        return false;
    }

    computed
        .bytes()
        .zip(stored.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_api_key_matches() {
        let stored = sha256_hex("dm_admin_secret");
        assert!(verify_api_key("dm_admin_secret", &stored));
    }

    #[test]
    fn test_verify_api_key_accepts_uppercase_digest() {
        let stored = sha256_hex("dm_admin_secret").to_uppercase();
        assert!(verify_api_key("dm_admin_secret", &stored));
    }

    #[test]
    fn test_verify_api_key_rejects_wrong_key() {
        let stored = sha256_hex("dm_admin_secret");
        assert!(!verify_api_key("dm_admin_other", &stored));
    }

    #[test]
    fn test_verify_api_key_rejects_empty_stored_hash() {
        assert!(!verify_api_key("", ""));
        assert!(!verify_api_key("anything", ""));
    }

    #[test]
    fn test_verify_api_key_rejects_truncated_hash() {
        let stored = sha256_hex("dm_admin_secret");
        assert!(!verify_api_key("dm_admin_secret", &stored[..32]));
    }
}
