use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{email_taken, DirectoryResult, UserDirectory};
use crate::models::{CredentialRecord, Identity, NewUser, UserChanges};

/// Process-local user directory. Emails are compared case-insensitively with
/// Unicode lowercasing, matching `lower(email)` in the Postgres directory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, CredentialRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<Identity>> {
        Ok(self
            .find_credentials(email)
            .await?
            .map(|record| record.identity))
    }

    async fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let users = self.users.read().await;
        Ok(users
            .get(&id)
            .filter(|r| !r.identity.is_deleted)
            .map(|r| r.identity.clone()))
    }

    async fn find_credentials(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|r| !r.identity.is_deleted && same_email(&r.identity.email, email))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> DirectoryResult<Identity> {
        let mut users = self.users.write().await;
        if users.values().any(|r| same_email(&r.identity.email, &user.email)) {
            return Err(email_taken());
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            identity.id,
            CredentialRecord {
                identity: identity.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(identity)
    }

    async fn list(&self) -> DirectoryResult<Vec<Identity>> {
        let users = self.users.read().await;
        let mut listed: Vec<Identity> = users
            .values()
            .filter(|r| !r.identity.is_deleted)
            .map(|r| r.identity.clone())
            .collect();
        listed.sort_by_key(|i| i.created_at);
        Ok(listed)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> DirectoryResult<Option<Identity>> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            let taken = users
                .values()
                .any(|r| r.identity.id != id && same_email(&r.identity.email, email));
            if taken {
                return Err(email_taken());
            }
        }

        let record = match users.get_mut(&id) {
            Some(record) if !record.identity.is_deleted => record,
            _ => return Ok(None),
        };

        if let Some(name) = changes.name {
            record.identity.name = name;
        }
        if let Some(email) = changes.email {
            record.identity.email = email;
        }
        if let Some(hash) = changes.password_hash {
            record.password_hash = hash;
        }
        record.identity.updated_at = Utc::now();
        Ok(Some(record.identity.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(record) if !record.identity.is_deleted => {
                record.identity.is_deleted = true;
                record.identity.updated_at = Utc::now();
                Ok(Some(record.identity.clone()))
            }
            _ => Ok(None),
        }
    }
}
