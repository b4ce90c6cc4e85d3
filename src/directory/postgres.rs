use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{email_taken, DirectoryError, DirectoryResult, UserDirectory};
use crate::models::{CredentialRecord, Identity, NewUser, UserChanges};

const USER_COLUMNS: &str =
    "user_id, name, email, password_hash, is_deleted, created_at, updated_at";

/// Row shape of the `users` table.
#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for CredentialRecord {
    fn from(row: UserRow) -> Self {
        CredentialRecord {
            identity: Identity {
                id: row.user_id,
                name: row.name,
                email: row.email,
                is_deleted: row.is_deleted,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        }
    }
}

/// Converts `sqlx::Error` into `DirectoryError`.
///
/// Unique violations on `users.email` become `Conflict`, everything else is a
/// backend failure.
impl From<sqlx::Error> for DirectoryError {
    fn from(error: sqlx::Error) -> DirectoryError {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => email_taken(),
            _ => DirectoryError::Backend(error.to_string()),
        }
    }
}

/// User directory backed by PostgreSQL.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> DirectoryResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled migrations in `migrations/`.
    pub async fn migrate(&self) -> DirectoryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DirectoryError::Backend(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<Identity>> {
        Ok(self.find_credentials(email).await?.map(|r| r.identity))
    }

    async fn find_by_id(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let sql = format!(
            "SELECT {} FROM users WHERE user_id = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| CredentialRecord::from(r).identity))
    }

    async fn find_credentials(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let sql = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1) AND is_deleted = FALSE",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CredentialRecord::from))
    }

    async fn create(&self, user: NewUser) -> DirectoryResult<Identity> {
        let sql = format!(
            "INSERT INTO users (user_id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(CredentialRecord::from(row).identity)
    }

    async fn list(&self) -> DirectoryResult<Vec<Identity>> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_deleted = FALSE ORDER BY created_at",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| CredentialRecord::from(r).identity)
            .collect())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> DirectoryResult<Option<Identity>> {
        let sql = format!(
            "UPDATE users \
             SET name = COALESCE($2, name), email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), updated_at = now() \
             WHERE user_id = $1 AND is_deleted = FALSE \
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| CredentialRecord::from(r).identity))
    }

    async fn soft_delete(&self, id: Uuid) -> DirectoryResult<Option<Identity>> {
        let sql = format!(
            "UPDATE users SET is_deleted = TRUE, updated_at = now() \
             WHERE user_id = $1 AND is_deleted = FALSE \
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| CredentialRecord::from(r).identity))
    }
}
