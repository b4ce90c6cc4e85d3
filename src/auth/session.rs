//! Session & credential management: login, logout and request authorization.
//!
//! Tokens are stateless signed values; the only server-side state is the
//! blacklist of tokens revoked before their natural expiry. A token moves from
//! valid to either blacklisted (via [`SessionManager::invalidate`]) or expired
//! (via time passing) and never comes back.
//!
//! Revocation is per token string. Logging out one session does not end other
//! sessions of the same user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::blacklist::TokenBlacklist;
use super::password::{hash_password, verify_password};
use super::token::TokenSigner;
use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::models::Identity;

/// Outcome of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

pub struct SessionManager {
    directory: Arc<dyn UserDirectory>,
    signer: TokenSigner,
    blacklist: TokenBlacklist,
    bcrypt_cost: u32,
    // Verified against when the email is unknown, so both failure paths cost a bcrypt check.
    dummy_hash: String,
}

impl SessionManager {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        signer: TokenSigner,
        blacklist: TokenBlacklist,
        bcrypt_cost: u32,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("not-a-real-password", bcrypt_cost)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(Self {
            directory,
            signer,
            blacklist,
            bcrypt_cost,
            dummy_hash,
        })
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub fn blacklist(&self) -> &TokenBlacklist {
        &self.blacklist
    }

    /// Verifies `email`/`password` and issues a token.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    /// Directory failures yield `DependencyError`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let record = self.directory.find_credentials(email).await?;

        let (identity, stored_hash) = match record {
            Some(record) => (Some(record.identity), record.password_hash),
            None => (None, self.dummy_hash.clone()),
        };
        let matches = self.check_password(password, stored_hash).await?;

        let identity = match identity {
            Some(identity) if matches => identity,
            _ => {
                log::info!("login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self.signer.issue(identity.id)?;
        log::info!("session issued for user {}", identity.id);

        Ok(Session {
            token: issued.token,
            expires_at: issued.expires_at,
            identity,
        })
    }

    /// Revokes `token`. Revoking an already revoked token succeeds.
    pub async fn invalidate(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        // Unreadable tokens are kept for the longest a real token could live.
        let expires_at = self
            .signer
            .expiry_hint(token)
            .unwrap_or_else(|| Utc::now() + self.signer.ttl());
        self.blacklist.revoke(token, expires_at).await;
        log::debug!("token revoked until {}", expires_at);
        Ok(())
    }

    /// Resolves the identity behind `token`.
    pub async fn authorize(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        if self.blacklist.is_revoked(token).await {
            return Err(AuthError::Unauthorized);
        }
        let claims = self.signer.verify(token)?;

        match self.directory.find_by_id(claims.sub).await? {
            Some(identity) if !identity.is_deleted => Ok(identity),
            _ => {
                log::debug!("token subject {} no longer exists", claims.sub);
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Hashes a new password at the configured cost off the async executor.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let plaintext = plaintext.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&plaintext, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Forgets revoked tokens that have expired on their own.
    pub async fn purge_expired(&self) -> usize {
        self.blacklist.purge_expired(Utc::now()).await
    }

    /// Discards all session state. Called when the server stops.
    pub async fn shutdown(&self) {
        let dropped = self.blacklist.len().await;
        self.blacklist.clear().await;
        log::info!("session manager stopped, {} revoked tokens discarded", dropped);
    }

    async fn check_password(&self, password: &str, stored_hash: String) -> Result<bool, AuthError> {
        let password = password.to_string();
        let outcome = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?;

        outcome.map_err(|e| {
            log::error!("stored password hash is unreadable: {}", e);
            AuthError::DependencyError("Stored credential is unreadable".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, DirectoryResult, InMemoryUserDirectory};
    use crate::models::{CredentialRecord, NewUser, UserChanges};
    use async_trait::async_trait;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    const TEST_COST: u32 = 4;
    const SECRET: &str = "session-test-secret";

    async fn fixture() -> (SessionManager, Identity) {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let identity = directory
            .create(NewUser {
                name: "User One".into(),
                email: "a@b.com".into(),
                password_hash: hash_password("secret1234", TEST_COST).unwrap(),
            })
            .await
            .unwrap();

        let manager = SessionManager::new(
            directory,
            TokenSigner::new(SECRET, Duration::hours(1)),
            TokenBlacklist::new(),
            TEST_COST,
        )
        .unwrap();
        (manager, identity)
    }

    #[actix_rt::test]
    async fn test_login_authorize_logout_scenario() {
        let (manager, user) = fixture().await;

        let session = manager.authenticate("a@b.com", "secret1234").await.unwrap();
        assert_eq!(session.identity, user);

        let resolved = manager.authorize(Some(&session.token)).await.unwrap();
        assert_eq!(resolved.id, user.id);

        manager.invalidate(Some(&session.token)).await.unwrap();
        assert_eq!(
            manager.authorize(Some(&session.token)).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[actix_rt::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let (manager, _) = fixture().await;

        let wrong_password = manager.authenticate("a@b.com", "wrongpass").await.unwrap_err();
        let unknown_user = manager
            .authenticate("nobody@x.com", "whatever")
            .await
            .unwrap_err();

        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[actix_rt::test]
    async fn test_invalidate_requires_token_and_is_idempotent() {
        let (manager, _) = fixture().await;
        assert_eq!(manager.invalidate(None).await, Err(AuthError::NotAuthenticated));
        assert_eq!(manager.invalidate(Some("  ")).await, Err(AuthError::NotAuthenticated));

        let session = manager.authenticate("a@b.com", "secret1234").await.unwrap();
        manager.invalidate(Some(&session.token)).await.unwrap();
        manager.invalidate(Some(&session.token)).await.unwrap();

        assert_eq!(manager.blacklist().len().await, 1);
        assert_eq!(
            manager.authorize(Some(&session.token)).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[actix_rt::test]
    async fn test_revocation_is_per_token() {
        let (manager, user) = fixture().await;
        let first = manager.authenticate("a@b.com", "secret1234").await.unwrap();
        let second = manager.authenticate("a@b.com", "secret1234").await.unwrap();

        manager.invalidate(Some(&first.token)).await.unwrap();

        assert!(manager.authorize(Some(&first.token)).await.is_err());
        assert_eq!(manager.authorize(Some(&second.token)).await.unwrap().id, user.id);
    }

    #[actix_rt::test]
    async fn test_expired_token_is_rejected() {
        let (manager, user) = fixture().await;
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        let expired = signer
            .issue_at(user.id, Utc::now() - Duration::hours(3))
            .unwrap();

        assert_eq!(
            manager.authorize(Some(&expired.token)).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[actix_rt::test]
    async fn test_missing_and_malformed_tokens() {
        let (manager, _) = fixture().await;
        assert_eq!(manager.authorize(None).await, Err(AuthError::Unauthorized));
        assert_eq!(manager.authorize(Some("")).await, Err(AuthError::Unauthorized));
        assert_eq!(
            manager.authorize(Some("garbage.token.value")).await,
            Err(AuthError::Unauthorized)
        );

        let foreign = TokenSigner::new("someone-else", Duration::hours(1))
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(
            manager.authorize(Some(&foreign.token)).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[actix_rt::test]
    async fn test_deleted_identity_is_unauthorized() {
        let (manager, user) = fixture().await;
        let session = manager.authenticate("a@b.com", "secret1234").await.unwrap();

        manager.directory().soft_delete(user.id).await.unwrap();

        assert_eq!(
            manager.authorize(Some(&session.token)).await,
            Err(AuthError::Unauthorized)
        );
        assert_eq!(
            manager.authenticate("a@b.com", "secret1234").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[actix_rt::test]
    async fn test_purge_and_shutdown() {
        let (manager, user) = fixture().await;
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        let stale = signer
            .issue_at(user.id, Utc::now() - Duration::hours(2))
            .unwrap();
        let live = manager.authenticate("a@b.com", "secret1234").await.unwrap();

        manager.invalidate(Some(&stale.token)).await.unwrap();
        manager.invalidate(Some(&live.token)).await.unwrap();
        manager.invalidate(Some("unreadable")).await.unwrap();

        assert_eq!(manager.purge_expired().await, 1);
        assert_eq!(manager.blacklist().len().await, 2);

        manager.shutdown().await;
        assert!(manager.blacklist().is_empty().await);
    }

    #[actix_rt::test]
    async fn test_purge_does_not_revive_token_in_its_last_second() {
        let (fixture_manager, _) = fixture().await;
        // Zero TTL: `exp` is the current whole second.
        let manager = SessionManager::new(
            Arc::clone(fixture_manager.directory()),
            TokenSigner::new(SECRET, Duration::zero()),
            TokenBlacklist::new(),
            TEST_COST,
        )
        .unwrap();

        let mut token = None;
        for _ in 0..5 {
            let session = manager.authenticate("a@b.com", "secret1234").await.unwrap();
            if manager.authorize(Some(&session.token)).await.is_ok() {
                token = Some(session.token);
                break;
            }
        }
        let token = token.expect("a zero-ttl token should verify within its own second");

        manager.invalidate(Some(&token)).await.unwrap();
        manager.purge_expired().await;
        assert_eq!(
            manager.authorize(Some(&token)).await,
            Err(AuthError::Unauthorized)
        );
    }

    #[actix_rt::test]
    async fn test_hash_password_round_trip() {
        let (manager, _) = fixture().await;
        let hashed = manager.hash_password("another-secret").await.unwrap();
        assert!(verify_password("another-secret", &hashed).unwrap());
    }

    struct UnavailableDirectory;

    #[async_trait]
    impl UserDirectory for UnavailableDirectory {
        async fn find_by_email(&self, _: &str) -> DirectoryResult<Option<Identity>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn find_by_id(&self, _: Uuid) -> DirectoryResult<Option<Identity>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn find_credentials(&self, _: &str) -> DirectoryResult<Option<CredentialRecord>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn create(&self, _: NewUser) -> DirectoryResult<Identity> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn list(&self) -> DirectoryResult<Vec<Identity>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn update(&self, _: Uuid, _: UserChanges) -> DirectoryResult<Option<Identity>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
        async fn soft_delete(&self, _: Uuid) -> DirectoryResult<Option<Identity>> {
            Err(DirectoryError::Backend("connection refused".into()))
        }
    }

    #[actix_rt::test]
    async fn test_directory_failure_is_not_an_auth_verdict() {
        let signer = TokenSigner::new(SECRET, Duration::hours(1));
        let token = signer.issue(Uuid::new_v4()).unwrap().token;
        let manager = SessionManager::new(
            Arc::new(UnavailableDirectory),
            signer,
            TokenBlacklist::new(),
            TEST_COST,
        )
        .unwrap();

        assert!(matches!(
            manager.authenticate("a@b.com", "secret1234").await,
            Err(AuthError::DependencyError(_))
        ));
        assert!(matches!(
            manager.authorize(Some(&token)).await,
            Err(AuthError::DependencyError(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_authorize_and_invalidate() {
        let (manager, user) = fixture().await;
        let manager = Arc::new(manager);
        let user_id = user.id;

        let mut tokens = Vec::new();
        for _ in 0..8 {
            tokens.push(manager.authenticate("a@b.com", "secret1234").await.unwrap().token);
        }

        let handles: Vec<_> = tokens
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, token)| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        manager.invalidate(Some(&token)).await.unwrap();
                    } else {
                        assert_eq!(manager.authorize(Some(&token)).await.unwrap().id, user_id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(manager.authorize(Some(token)).await.is_ok(), i % 2 == 1);
        }
    }
}
