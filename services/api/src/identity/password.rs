//! Credential hashing with argon2.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes and verifies user credentials as PHC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash `secret` with a fresh random salt.
    pub async fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| PasswordError::Hash(e.to_string()))
        })
        .await?
    }

    /// Check `secret` against a stored hash. A malformed hash never verifies.
    pub async fn verify(&self, secret: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let secret = secret.to_string();
        let stored_hash = stored_hash.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&stored_hash) else {
                return false;
            };
            Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok()
        })
        .await?;
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("hunter22").await.unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("hunter22", &hash).await.unwrap());
        assert!(!hasher.verify("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_salts_differ() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash("same-secret").await.unwrap();
        let b = hasher.hash("same-secret").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_does_not_verify() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("anything", "plaintext").await.unwrap());
    }
}
