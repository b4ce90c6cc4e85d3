use actix_web::{get, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// Tokens currently held in the blacklist, absent when no session core is mounted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_tokens: Option<usize>,
}

/// Liveness probe. Public, outside `/api`.
#[get("/health")]
pub async fn health(sessions: Option<web::Data<SessionManager>>) -> impl Responder {
    let revoked_tokens = match sessions {
        Some(sessions) => Some(sessions.blacklist().len().await),
        None => None,
    };

    HttpResponse::Ok().json(HealthStatus {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now(),
        revoked_tokens,
    })
}
