use crate::{
    auth::{AuthResponse, BearerToken, LoginRequest, SessionManager},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Login user
///
/// Authenticates a user and returns a bearer token with the user's public profile.
/// An unknown email and a wrong password produce the same 401 response.
#[post("/login")]
pub async fn login(
    sessions: web::Data<SessionManager>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let session = sessions
        .authenticate(login_data.email.trim(), &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse::from(session)))
}

/// Logout user
///
/// Revokes the bearer token sent in the `Authorization` header. Logging out
/// twice with the same token succeeds both times.
#[post("/logout")]
pub async fn logout(
    sessions: web::Data<SessionManager>,
    token: BearerToken,
) -> Result<impl Responder, AppError> {
    sessions.invalidate(token.0.as_deref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User logged out successfully"
    })))
}
