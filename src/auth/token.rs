use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token, the user's unique identifier.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id. Two tokens for the same user never share a string.
    pub jti: Uuid,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expired means expired.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            validation,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` valid from now for the configured TTL.
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("Token expiry is out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry and returns the claims.
    ///
    /// Every failure collapses into `AuthError::Unauthorized`; the reason is only logged.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("token rejected: {}", e);
                AuthError::Unauthorized
            })
    }

    /// Reads the expiry of a correctly signed token, even an expired one.
    pub fn expiry_hint(&self, token: &str) -> Option<DateTime<Utc>> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .ok()?
            .claims;
        Utc.timestamp_opt(claims.exp, 0).single()
    }
}
