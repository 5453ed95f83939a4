//! Salted one-way password hashing.
//!
//! Accounts store a random 16-byte salt and the SHA-256 digest of
//! salt‖password, both hex-encoded. The plaintext never leaves the caller's
//! `Zeroizing` buffer and is never persisted or logged.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Number of random salt bytes generated per credential.
pub const SALT_LEN: usize = 16;

/// Stored credential material: hex-encoded salt and digest.
///
/// Verification recomputes the digest with the stored salt and compares the
/// hex strings; the caller learns only whether the pair matched, never which
/// half was wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordCredential {
    salt_hex: String,
    hash_hex: String,
}

impl PasswordCredential {
    /// Derive a fresh credential from a plaintext password.
    ///
    /// A new salt is drawn from the operating system RNG on every call, so
    /// deriving twice from the same password yields distinct credentials.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let hash_hex = digest_hex(&salt, password);
        Self {
            salt_hex: hex::encode(salt),
            hash_hex,
        }
    }

    /// Rebuild a credential from stored hex fields.
    pub fn from_stored(salt_hex: impl Into<String>, hash_hex: impl Into<String>) -> Self {
        Self {
            salt_hex: salt_hex.into(),
            hash_hex: hash_hex.into(),
        }
    }

    /// Check a plaintext password against the stored salt and digest.
    ///
    /// A salt that fails to decode verifies as `false` rather than erroring:
    /// corrupt credential material must behave like a wrong password.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(salt) = hex::decode(&self.salt_hex) else {
            return false;
        };
        digest_hex(&salt, password) == self.hash_hex
    }

    /// Hex-encoded salt for persistence.
    pub fn salt_hex(&self) -> &str {
        &self.salt_hex
    }

    /// Hex-encoded digest for persistence.
    pub fn hash_hex(&self) -> &str {
        &self.hash_hex
    }
}

fn digest_hex(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
