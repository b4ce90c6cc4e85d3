pub mod blacklist;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Identity;

// Re-export necessary items
pub use blacklist::TokenBlacklist;
pub use extractors::{bearer_token, AuthenticatedUser, BearerToken};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use session::{Session, SessionManager};
pub use token::{Claims, IssuedToken, TokenSigner};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    /// Must be at least 8 characters long.
    #[validate(length(min = 8))]
    pub password: String,
}

/// Response structure after a successful login.
/// Contains the bearer token, its expiry and the public profile of the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token for session authentication.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Identity,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user: session.identity,
        }
    }
}
