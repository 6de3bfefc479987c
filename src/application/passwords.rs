//! bcrypt hashing, run off the async executor.

use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let cost = self.cost;
        let password = password.to_owned();
        let hashed = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    /// A malformed stored hash verifies as `false`.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
        Ok(outcome.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_against_the_original_password() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("password123").await.expect("hash");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("password123", &hash).await.expect("verify"));
        assert!(!hasher.verify("password124", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn malformed_hashes_never_verify() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("anything", "not-a-hash").await.expect("verify"));
    }
}
