//! Client identity hashing
//!
//! Views are deduplicated on a salted one-way hash of the client address;
//! the raw address never reaches storage.

use sha2::{Digest, Sha256};

#[derive(Clone, Debug)]
pub struct IdentityHasher {
    salt: String,
}

impl IdentityHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Lowercase hex SHA-256 of `"{salt}:{address}"`
    pub fn identity(&self, address: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(b":");
        hasher.update(address.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_stable_and_salted() {
        let a = IdentityHasher::new("pepper");
        let b = IdentityHasher::new("other");

        let first = a.identity("203.0.113.7");
        assert_eq!(first, a.identity("203.0.113.7"));
        assert_eq!(first.len(), 64);
        assert!(!first.contains("203.0.113.7"));
        assert_ne!(first, a.identity("203.0.113.8"));
        assert_ne!(first, b.identity("203.0.113.7"));
    }

    #[test]
    fn test_known_digest() {
        // sha256(":abc")
        let hasher = IdentityHasher::new("");
        assert_eq!(
            hasher.identity("abc"),
            hex::encode(Sha256::digest(b":abc"))
        );
    }
}
