//! In-process session store
//!
//! Expired records are treated as absent and evicted lazily on access, or in
//! bulk through `purge_expired`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::{SessionStore, SessionStoreError};

struct StoredSession {
    refresh_token: String,
    expires_at: Instant,
}

impl StoredSession {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Session store backed by a `DashMap`
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired records
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records held, expired ones included
    #[cfg(test)]
    pub(crate) fn record_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        key: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or(SessionStoreError::InvalidTtl)?;

        self.sessions.insert(
            key.to_string(),
            StoredSession {
                refresh_token: refresh_token.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let now = Instant::now();

        if let Some(session) = self.sessions.get(key)
            && !session.is_expired(now)
        {
            return Ok(Some(session.refresh_token.clone()));
        }

        self.sessions
            .remove_if(key, |_, session| session.is_expired(now));
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool, SessionStoreError> {
        let now = Instant::now();
        Ok(self
            .sessions
            .remove(key)
            .is_some_and(|(_, session)| !session.is_expired(now)))
    }

    async fn clear_all(&self) -> Result<(), SessionStoreError> {
        self.sessions.clear();
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}
