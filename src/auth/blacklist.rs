//! In-memory set of revoked session tokens.
//!
//! Entries are keyed by the literal token string, so revoking one token never
//! affects another token issued to the same user. Each entry remembers when the
//! token would have expired anyway. Token expiry has whole-second resolution and
//! a token is still accepted during its `exp` second, so an entry is only dropped
//! once that second is over.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct TokenBlacklist {
    inner: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revokes `token`. Re-revoking keeps the later of the two expiries.
    pub async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) {
        let mut entries = self.inner.write().await;
        entries
            .entry(token.to_string())
            .and_modify(|current| {
                if expires_at > *current {
                    *current = expires_at;
                }
            })
            .or_insert(expires_at);
    }

    pub async fn is_revoked(&self, token: &str) -> bool {
        self.inner.read().await.contains_key(token)
    }

    /// Drops entries whose token can no longer verify at `now`. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let now_secs = now.timestamp();
        let mut entries = self.inner.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| expires_at.timestamp() >= now_secs);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
