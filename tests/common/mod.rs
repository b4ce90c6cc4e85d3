#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use taskforge::auth::{AuthMiddleware, AuthResponse, SessionManager, TokenBlacklist, TokenSigner};
use taskforge::directory::InMemoryUserDirectory;
use taskforge::models::Identity;
use taskforge::notification::Notifier;
use taskforge::routes::{self, health};
use taskforge::tasks::TaskStore;

pub const PASSWORD: &str = "Password123!";

// Helper struct to hold auth details
pub struct TestUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub token: String,
}

/// Builds the full application over an in-memory user directory.
pub async fn init_app() -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let sessions = SessionManager::new(
        Arc::new(InMemoryUserDirectory::new()),
        TokenSigner::new("integration-test-secret", Duration::hours(1)),
        TokenBlacklist::new(),
        4,
    )
    .expect("session manager should build");

    test::init_service(
        App::new()
            .app_data(web::Data::new(sessions))
            .app_data(web::Data::new(TaskStore::new()))
            .app_data(web::Data::new(Notifier::new()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

pub async fn register(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
) -> Identity {
    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(&json!({
            "name": name,
            "email": email,
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Failed to register {}. Body: {}",
        email,
        String::from_utf8_lossy(&body_bytes)
    );
    serde_json::from_slice(&body_bytes).expect("Failed to parse registration response")
}

pub async fn login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
) -> AuthResponse {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({
            "email": email,
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::OK,
        "Failed to log in {}. Body: {}",
        email,
        String::from_utf8_lossy(&body_bytes)
    );
    serde_json::from_slice(&body_bytes).expect("Failed to parse login response")
}

pub async fn register_and_login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
) -> TestUser {
    let identity = register(app, name, email).await;
    let auth = login(app, email).await;
    TestUser {
        id: identity.id,
        email: identity.email,
        token: auth.token,
    }
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (actix_web::http::header::AUTHORIZATION, format!("Bearer {}", token))
}
