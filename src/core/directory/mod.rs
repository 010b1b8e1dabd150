//! User directory client
//!
//! The directory owns identities and their password hashes. The auth protocol
//! only reads identities, creates them on sign-up and flips `verified`.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryDirectory;
#[cfg(feature = "postgres")]
pub use postgres::PgDirectory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Role
// ============================================================================

/// Authorization role attached to every identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// ============================================================================
// Identity
// ============================================================================

/// A registered user as seen by the auth protocol (never carries the hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Identity together with its stored password hash
#[derive(Clone)]
pub struct UserRecord {
    pub identity: Identity,
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("identity", &self.identity)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Data for creating a user (hash computed by the caller)
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

// ============================================================================
// Directory trait
// ============================================================================

/// Directory error types
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("User not found")]
    NotFound,

    #[error("User directory unavailable: {0}")]
    Unavailable(String),
}

/// Client for the external user directory
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Create a user; fails with `EmailAlreadyExists` on a duplicate email
    async fn create_user(&self, new_user: NewUser) -> Result<Identity, DirectoryError>;

    /// Find a user and its password hash by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError>;

    /// Set the verified flag and return the updated identity
    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Identity, DirectoryError>;
}
