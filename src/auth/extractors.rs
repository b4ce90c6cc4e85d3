use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::Identity;

/// Extracts the bare token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` (scheme matched case-insensitively) and a raw token
/// with no scheme. Any other scheme, or an empty value, yields `None`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    if value.is_empty() {
        return None;
    }

    match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = rest.trim();
            (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
        }
        Some(_) => None,
        None if value.eq_ignore_ascii_case("bearer") => None,
        None => Some(value),
    }
}

/// Reads and normalizes the token of a request, if any.
pub fn request_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
}

/// The normalized bearer token of the request, possibly absent.
///
/// Unlike [`AuthenticatedUser`] this never fails; logout decides what a missing
/// token means.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Option<String>);

impl FromRequest for BearerToken {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(BearerToken(request_token(req))))
    }
}

/// Extracts the identity resolved by `AuthMiddleware` from request extensions.
///
/// If the identity is missing (the route is not behind the middleware), the
/// extractor fails with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity))),
            None => {
                let err = AppError::Unauthorized("Unauthorized".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
