//! Server configuration from command line flags and environment.

use crate::error::AppError;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Used when `JWT_SECRET` is unset; refused in production.
pub const DEV_JWT_SECRET: &str = "dev-only-jwt-secret-change-me";
pub const DEV_SESSION_SECRET: &str = "dev-only-session-secret-change-me";

#[derive(Debug, Clone, Parser)]
#[command(name = "blog-cms", version, about = "Blog CMS API server")]
pub struct ServerConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Accepted for compatibility with existing deployments; no session store uses it.
    #[arg(long, env = "SESSION_SECRET", default_value = DEV_SESSION_SECRET, hide_env_values = true)]
    pub session_secret: String,

    /// `development` or `production`.
    #[arg(long = "env", env = "NODE_ENV", default_value = "development")]
    pub environment: String,

    /// Directory holding the database file (default: platform data dir).
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Upload directory (default: `<data-dir>/uploads`).
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 5 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 24 * 60 * 60)]
    pub token_ttl_secs: i64,

    /// Password for the seeded admin account; only used on first boot.
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub admin_password: String,

    /// Turn the per-IP limiter off, e.g. behind a proxy that already limits.
    #[arg(long, env = "RATE_LIMIT_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub rate_limit_enabled: bool,

    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 100)]
    pub rate_limit_max: u32,

    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 15 * 60)]
    pub rate_limit_window_secs: u64,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("blog-cms")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("blog.db")
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("uploads"))
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    /// Reject settings that are unsafe or meaningless before anything starts.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::Validation("JWT_SECRET must not be empty".into()));
        }
        if self.is_production() && self.jwt_secret == DEV_JWT_SECRET {
            return Err(AppError::Validation(
                "JWT_SECRET must be set when NODE_ENV=production".into(),
            ));
        }
        if self.is_production() && self.session_secret == DEV_SESSION_SECRET {
            log::warn!("SESSION_SECRET is the development default");
        }
        if self.token_ttl_secs <= 0 {
            return Err(AppError::Validation("TOKEN_TTL_SECS must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::Validation("MAX_UPLOAD_BYTES must be positive".into()));
        }
        if self.rate_limit_enabled
            && (self.rate_limit_max == 0 || self.rate_limit_window_secs == 0)
        {
            return Err(AppError::Validation("rate limit settings must be positive".into()));
        }
        Ok(())
    }
}
