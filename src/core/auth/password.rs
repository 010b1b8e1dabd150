//! Password hashing with bcrypt
//!
//! Every hash carries its own random salt, so verification needs nothing but
//! the stored string. The hasher holds no mutable state and is safe to share.

use std::sync::Arc;

use crate::core::config::DEFAULT_BCRYPT_COST;

/// Plaintext behind the dummy hash; never matches a real account
const DUMMY_PASSWORD: &str = "sessiongate-dummy-password";

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingError(String),
}

/// bcrypt-based credential hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash at `cost` used to spend equal time on unknown accounts
    dummy_hash: Option<Arc<str>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost factor
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: bcrypt::hash(DUMMY_PASSWORD, cost).ok().map(Arc::from),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        bcrypt::hash(password, self.cost).map_err(|e| PasswordError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A malformed hash never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Run a full verify against a hash no account owns.
    ///
    /// Called when the account does not exist so that the response takes as
    /// long as a password mismatch. Always false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        if let Some(hash) = &self.dummy_hash {
            let _ = self.verify(password, hash);
        }
        false
    }
}
