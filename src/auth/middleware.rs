use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::extractors::request_token;
use super::session::SessionManager;
use crate::error::AppError;

/// Routes reachable without a session.
fn is_public(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    match path {
        "/health" | "/api/auth/login" | "/api/auth/logout" => true,
        "/api/users" => *method == Method::POST,
        _ => false,
    }
}

/// Guards every non-public route: the request's bearer token must authorize
/// against the `SessionManager` registered as app data. The resolved `Identity`
/// is stored in request extensions for `AuthenticatedUser`. Rejections are
/// answered directly with the `AppError` response.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if is_public(req.method(), req.path()) {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        }

        let manager = match req.app_data::<web::Data<SessionManager>>() {
            Some(manager) => manager.clone(),
            None => {
                log::error!("AuthMiddleware is mounted without a SessionManager");
                let app_err = AppError::InternalServerError("Authentication is not configured".into());
                return Box::pin(async move { Ok(reject(req, app_err)) });
            }
        };
        let token = request_token(req.request());

        Box::pin(async move {
            match manager.authorize(token.as_deref()).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    Ok(service.call(req).await?.map_into_left_body())
                }
                Err(auth_err) => Ok(reject(req, auth_err.into())),
            }
        })
    }
}

fn reject<B>(req: ServiceRequest, app_err: AppError) -> ServiceResponse<EitherBody<B>> {
    let response = app_err.error_response();
    req.into_response(response).map_into_right_body()
}
