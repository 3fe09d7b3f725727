//! HTTP route handlers (DTO boundary). Handlers stay thin: extract, run the
//! use case on the blocking pool, serialize.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod extract;
pub mod homepage;
pub mod media;
pub mod posts;
pub mod uploads;

use crate::error::AppError;
use crate::middleware::{RateLimiter, RateLimiterState};
use actix_web::{get, web, HttpRequest};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MessageResp {
    pub message: String,
}

impl MessageResp {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResp {
    pub status: &'static str,
    pub time: String,
}

#[get("/health")]
pub async fn health() -> web::Json<HealthResp> {
    web::Json(HealthResp {
        status: "ok",
        time: chrono::Utc::now().to_rfc3339(),
    })
}

fn json_error(err: actix_web::error::JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("invalid JSON body: {}", err)).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("invalid query: {}", err)).into()
}

fn path_error(err: actix_web::error::PathError, _: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("invalid path: {}", err)).into()
}

/// Mount every route; `/api` sits behind the per-IP rate limiter.
pub fn configure(cfg: &mut web::ServiceConfig, limiter: Arc<RateLimiterState>) {
    cfg.app_data(web::JsonConfig::default().limit(1024 * 1024).error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api")
                .wrap(RateLimiter::new(limiter))
                .service(health)
                .service(auth::routes())
                .service(posts::routes())
                .service(categories::routes())
                .service(media::routes())
                .service(dashboard::routes())
                .service(homepage::routes()),
        )
        .service(uploads::routes());
}
