//! Request extractors for bearer-token authentication.

use crate::auth::{Claims, ROLE_ADMIN};
use crate::error::AppError;
use crate::server::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

fn state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("app state not configured".into()))
}

fn authenticate(req: &HttpRequest) -> Result<Claims, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = state(req)?.tokens.verify_header(header)?;
    if claims.role != ROLE_ADMIN {
        log::warn!("user '{}' has role '{}', admin required", claims.username, claims.role);
        return Err(AppError::InvalidToken);
    }
    Ok(claims)
}

/// Admin caller; rejects the request with 401/403 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthUser))
    }
}

/// Admin caller if a valid token was presented; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Claims>);

impl MaybeAuthUser {
    pub fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequest for MaybeAuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeAuthUser(authenticate(req).ok())))
    }
}
