//! PostgreSQL session store
//!
//! One row per identity key in `auth_sessions`; `put` is an upsert so the
//! single-record-per-key rule holds under concurrent writers.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;

use super::{SessionStore, SessionStoreError};

impl From<sqlx::Error> for SessionStoreError {
    fn from(err: sqlx::Error) -> Self {
        SessionStoreError::Unavailable(err.to_string())
    }
}

/// Session store for database operations
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn put(
        &self,
        key: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| SessionStoreError::InvalidTtl)?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(SessionStoreError::InvalidTtl)?;

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (session_key, refresh_token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_key)
            DO UPDATE SET refresh_token = EXCLUDED.refresh_token, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(refresh_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let token: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT refresh_token
            FROM auth_sessions
            WHERE session_key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token.map(|(token,)| token))
    }

    async fn delete(&self, key: &str) -> Result<bool, SessionStoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_sessions
            WHERE session_key = $1
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_all(&self) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM auth_sessions")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_sessions
            WHERE expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
