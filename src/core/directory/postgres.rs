//! PostgreSQL user directory
//!
//! Uniqueness of email is enforced by the `users` table constraint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{DirectoryError, Identity, NewUser, Role, UserDirectory, UserRecord};

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DirectoryError::EmailAlreadyExists
            }
            _ => DirectoryError::Unavailable(err.to_string()),
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    verified: bool,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            // An unknown role string grants the least privilege.
            role: self.role.parse().unwrap_or(Role::User),
            verified: self.verified,
            created_at: self.created_at,
        }
    }
}

/// User directory for database operations
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Create a new directory over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<Identity, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, role, verified, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.identity())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, verified, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserRecord {
            identity: row.identity(),
            password_hash: row.password_hash,
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.identity()))
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Identity, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET verified = $2
            WHERE id = $1
            RETURNING id, email, password_hash, role, verified, created_at
            "#,
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.identity()).ok_or(DirectoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::create_test_pool;

    fn unique_user() -> NewUser {
        NewUser {
            email: format!("directory_test_{}@example.com", Uuid::new_v4()),
            password_hash: "test_hash".to_string(),
            role: Role::User,
        }
    }

    async fn cleanup(pool: &PgPool, id: Uuid) {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_user() {
        let pool = create_test_pool().await;
        let directory = PgDirectory::new(pool.clone());
        let new_user = unique_user();

        let identity = directory.create_user(new_user.clone()).await.unwrap();
        assert_eq!(identity.email, new_user.email);
        assert!(!identity.verified);

        let record = directory
            .find_by_email(&new_user.email)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.identity.id, identity.id);
        assert_eq!(record.password_hash, "test_hash");

        cleanup(&pool, identity.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_duplicate_email_is_conflict() {
        let pool = create_test_pool().await;
        let directory = PgDirectory::new(pool.clone());
        let new_user = unique_user();

        let identity = directory.create_user(new_user.clone()).await.unwrap();
        let result = directory.create_user(new_user).await;
        assert!(matches!(result, Err(DirectoryError::EmailAlreadyExists)));

        cleanup(&pool, identity.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_set_verified() {
        let pool = create_test_pool().await;
        let directory = PgDirectory::new(pool.clone());

        let identity = directory.create_user(unique_user()).await.unwrap();
        let updated = directory.set_verified(identity.id, true).await.unwrap();
        assert!(updated.verified);

        let missing = directory.set_verified(Uuid::new_v4(), true).await;
        assert!(matches!(missing, Err(DirectoryError::NotFound)));

        cleanup(&pool, identity.id).await;
    }
}
