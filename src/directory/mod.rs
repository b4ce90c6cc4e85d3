//! The user directory: identity lookup and storage behind a single trait.
//!
//! The session core only needs `find_credentials` and `find_by_id`; the rest of
//! the trait backs the user routes. Two backings exist: [`InMemoryUserDirectory`]
//! and [`PgUserDirectory`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{CredentialRecord, Identity, NewUser, UserChanges};

pub use memory::InMemoryUserDirectory;
pub use postgres::PgUserDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A uniqueness rule was violated (e.g. the email is taken).
    Conflict(String),
    /// The backing store failed.
    Backend(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DirectoryError::Conflict(msg) => write!(f, "{}", msg),
            DirectoryError::Backend(msg) => write!(f, "Directory backend error: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Identity storage consumed by the session core and the user routes.
///
/// Lookups never return soft-deleted users, except that their email stays
/// reserved for `create` and `update`.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<Identity>>;

    async fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>>;

    /// The only lookup that exposes the password hash.
    async fn find_credentials(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>>;

    async fn create(&self, user: NewUser) -> DirectoryResult<Identity>;

    async fn list(&self) -> DirectoryResult<Vec<Identity>>;

    /// Returns `None` when the user does not exist.
    async fn update(&self, id: Uuid, changes: UserChanges) -> DirectoryResult<Option<Identity>>;

    /// Marks the user deleted. Returns `None` when the user does not exist.
    async fn soft_delete(&self, id: Uuid) -> DirectoryResult<Option<Identity>>;
}

pub(crate) fn email_taken() -> DirectoryError {
    DirectoryError::Conflict("User already exists".into())
}
