//! Refresh secret generation and hashing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Entropy of a refresh secret in bytes (256 bits)
pub const SECRET_BYTES: usize = 32;

/// Generates a fresh refresh secret: 32 OS-random bytes, base64url without padding
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercase hex SHA-256 of a secret, the form persisted and looked up
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_secret_has_full_entropy() {
        let secret = generate_secret();
        let decoded = URL_SAFE_NO_PAD.decode(&secret).unwrap();

        assert_eq!(decoded.len(), SECRET_BYTES);
        assert!(!secret.contains('='));
    }

    #[test]
    fn test_secrets_are_distinct() {
        let secrets: HashSet<String> = (0..1000).map(|_| generate_secret()).collect();
        assert_eq!(secrets.len(), 1000);
    }

    #[test]
    fn test_hash_is_stable_lowercase_hex() {
        let hash = hash_secret("abc");

        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(hash, hash_secret("abc"));
        assert_ne!(hash, hash_secret("abd"));
    }
}
