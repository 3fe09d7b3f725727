//! Stable error codes for API clients.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub const MSG_MISSING_CREDENTIALS: &str = "请提供用户名和密码";
pub const MSG_BAD_CREDENTIALS: &str = "用户名或密码错误";
pub const MSG_MISSING_TOKEN: &str = "访问令牌缺失";
pub const MSG_INVALID_TOKEN: &str = "无效的访问令牌";
pub const MSG_SLUG_TAKEN: &str = "文章链接已存在";
pub const MSG_TOO_LARGE: &str = "文件大小超出限制";
pub const MSG_RATE_LIMITED: &str = "请求过于频繁，请稍后再试";
pub const MSG_INTERNAL: &str = "服务器内部错误";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Db(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{}", MSG_BAD_CREDENTIALS)]
    BadCredentials,

    #[error("{}", MSG_MISSING_TOKEN)]
    MissingToken,

    #[error("{}", MSG_INVALID_TOKEN)]
    InvalidToken,

    #[error("{}", MSG_TOO_LARGE)]
    PayloadTooLarge,

    #[error("{0}")]
    UnsupportedMedia(String),

    #[error("{}", MSG_RATE_LIMITED)]
    RateLimited,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "DB_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMedia(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::RateLimited => "RATE_LIMITED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Db(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadCredentials | Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Server-side failures are reported generically; the detail only goes to the log.
    pub fn to_serde(&self) -> AppErrorDto {
        let error = if self.status().is_server_error() {
            MSG_INTERNAL.to_string()
        } else {
            self.to_string()
        };
        AppErrorDto {
            error,
            code: self.code().to_string(),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", e))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_serde().serialize(serializer)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{} {}: {}", status.as_u16(), self.code(), self);
        } else {
            log::debug!("{} {}: {}", status.as_u16(), self.code(), self);
        }
        HttpResponse::build(status).json(self.to_serde())
    }
}

#[derive(Debug, Serialize)]
pub struct AppErrorDto {
    pub error: String,
    pub code: String,
}
