//! In-process user directory backed by a `DashMap` keyed by email.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use super::{DirectoryError, Identity, NewUser, UserDirectory, UserRecord};

/// Directory for development and tests
#[derive(Default)]
pub struct MemoryDirectory {
    users: DashMap<String, UserRecord>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find_entry_by_id(&self, id: Uuid) -> Option<String> {
        self.users
            .iter()
            .find(|entry| entry.value().identity.id == id)
            .map(|entry| entry.key().clone())
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<Identity, DirectoryError> {
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                let identity = Identity {
                    id: Uuid::new_v4(),
                    email: new_user.email,
                    role: new_user.role,
                    verified: false,
                    created_at: Utc::now(),
                };
                slot.insert(UserRecord {
                    identity: identity.clone(),
                    password_hash: new_user.password_hash,
                });
                Ok(identity)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.get(email).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.value().identity.id == id)
            .map(|entry| entry.value().identity.clone()))
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Identity, DirectoryError> {
        // The iterator guard must be released before taking the write lock.
        let email = self.find_entry_by_id(id).ok_or(DirectoryError::NotFound)?;

        let mut entry = self.users.get_mut(&email).ok_or(DirectoryError::NotFound)?;
        entry.identity.verified = verified;

        Ok(entry.identity.clone())
    }
}
