use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web::Data,
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use jwt_libs::decode_access_token;
use logger_libs::{info_logger, warning_logger};
use uuid::Uuid;

use crate::{error::PostError, modules::user::model::UserPayload, AppState};

pub const TOKEN_COOKIE: &str = "token";

/// Cookie `token` first, then `Authorization: Bearer <token>`.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Identity inserted by [`AuthMW`].
pub fn current_user(req: &HttpRequest) -> Result<UserPayload, PostError> {
    req.extensions()
        .get::<UserPayload>()
        .cloned()
        .ok_or_else(|| {
            PostError::Unauthenticated("Unauthorized. User not found in request.".to_string())
        })
}

async fn authenticate(req: &ServiceRequest, log_id: &str) -> Result<UserPayload, PostError> {
    let handler_name = "auth";

    let app_state = req
        .app_data::<Data<AppState>>()
        .ok_or_else(|| PostError::internal("Authentication failed", "AppState not registered"))?;

    let token = extract_token(req.request()).ok_or_else(|| {
        warning_logger(log_id, handler_name, "extract_token", "no token provided");
        PostError::Unauthenticated("Unauthorized: No token provided".to_string())
    })?;

    let claims = decode_access_token(&token, &app_state.jwt_secret).map_err(|error| {
        warning_logger(log_id, handler_name, "decode_token", &error.to_string());
        PostError::Unauthenticated("Unauthorized: Invalid token".to_string())
    })?;

    let user = app_state
        .users
        .find_user_by_id(claims.claims.token.id)
        .await
        .map_err(|error| PostError::internal("Authentication failed", error))?;

    user.ok_or_else(|| {
        warning_logger(log_id, handler_name, "find_user", "token subject has no user");
        PostError::Unauthenticated("Unauthorized: User not found".to_string())
    })
}

/// Verifies the request token and attaches the resolved [`UserPayload`].
/// Rejected requests never reach the wrapped service.
pub struct AuthMW;

impl<S, B> Transform<S, ServiceRequest> for AuthMW
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = AuthMiddleware<S>;
    type Error = Error;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
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

        Box::pin(async move {
            let log_id = format!("auth.{}", Uuid::new_v4());

            let outcome = authenticate(&req, &log_id).await;
            match outcome {
                Ok(user) => {
                    info_logger(&log_id, "auth", "resolve_user");
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(error) => Ok(req.error_response(error).map_into_right_body()),
            }
        })
    }
}
