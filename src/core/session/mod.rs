//! Session store for refresh tokens
//!
//! Holds at most one refresh token per identity key. `put` overwrites whatever
//! was stored before, which is what revokes the previous token. Every operation
//! is atomic on the store side; callers never lock.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemorySessionStore;
#[cfg(feature = "postgres")]
pub use postgres::PgSessionStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often expired session records are swept
pub const PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Session store error types
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// The store could not be reached or failed mid-operation
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session TTL out of range")]
    InvalidTtl,
}

/// Key-value store holding the single active refresh token per identity
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `refresh_token` under `key` for `ttl`, replacing any previous value
    async fn put(&self, key: &str, refresh_token: &str, ttl: Duration)
    -> Result<(), SessionStoreError>;

    /// Current refresh token for `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Remove the record for `key`; returns whether one existed
    async fn delete(&self, key: &str) -> Result<bool, SessionStoreError>;

    /// Remove every record for every identity
    async fn clear_all(&self) -> Result<(), SessionStoreError>;

    /// Drop expired records, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, SessionStoreError>;
}

// ============================================================================
// Periodic Purge Task
// ============================================================================

/// Background task sweeping expired records out of a session store.
///
/// Expired records are already invisible to `get`; this only reclaims space
/// for identities that never come back.
pub struct PurgeTask {
    store: Arc<dyn SessionStore>,
    every: Duration,
}

impl PurgeTask {
    pub fn new(store: Arc<dyn SessionStore>, every: Duration) -> Self {
        Self { store, every }
    }

    /// Start the periodic purge
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.every);

            loop {
                interval.tick().await;

                match self.store.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Purged expired sessions"),
                    Err(e) => tracing::warn!("Session purge failed: {}", e),
                }
            }
        })
    }
}
