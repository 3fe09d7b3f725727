//! Service construction and the HTTP server lifecycle.

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::infra::{init_db, DbPool, MediaStore, SeedOptions};
use crate::middleware::{RateLimitConfig, RateLimiterState};
use crate::routes;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;

/// Services shared by every worker. Built once at startup, torn down at shutdown.
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenService,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(pool: DbPool, tokens: TokenService, media: MediaStore) -> Self {
        Self {
            pool,
            tokens,
            media,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, AppError> {
        let db_path = config.db_path();
        log::info!("DB path: {:?}", db_path);
        let seed = SeedOptions {
            admin_password: config.admin_password.clone(),
            ..SeedOptions::default()
        };
        let pool = init_db(&db_path, &seed).map_err(|e| {
            log::error!("DB init failed: {}", e);
            e
        })?;
        let upload_dir = config.upload_dir();
        log::info!("upload dir: {:?}", upload_dir);
        let media = MediaStore::new(upload_dir, config.max_upload_bytes)?;
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_secs);
        Ok(Self::new(pool, tokens, media))
    }

    /// Close the database connection.
    pub fn shutdown(self) {
        match self.pool.close() {
            Ok(()) => log::info!("database closed"),
            Err(e) => log::error!("database close failed: {}", e),
        }
    }
}

pub fn rate_limiter_from_config(config: &ServerConfig) -> Arc<RateLimiterState> {
    Arc::new(RateLimiterState::new(RateLimitConfig {
        max_requests: config.rate_limit_max,
        window_duration: Duration::from_secs(config.rate_limit_window_secs),
        enabled: config.rate_limit_enabled,
    }))
}

pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    config.validate().map_err(std::io::Error::other)?;
    if !config.is_production() {
        log::info!("running in {} mode", config.environment);
    }

    let state = web::Data::new(AppState::from_config(&config).map_err(std::io::Error::other)?);
    let limiter = rate_limiter_from_config(&config);

    let sweeper = {
        let limiter = limiter.clone();
        let every = Duration::from_secs(config.rate_limit_window_secs);
        actix_web::rt::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                limiter.cleanup();
            }
        })
    };

    let addr = config.bind_addr();
    log::info!("listening on {}:{}", addr.0, addr.1);

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(|cfg| routes::configure(cfg, limiter))
    })
    .bind(addr)?
    .run();

    let result = server.await;
    sweeper.abort();

    log::info!("server stopped, shutting down");
    match Arc::try_unwrap(state.into_inner()) {
        Ok(state) => state.shutdown(),
        Err(_) => log::warn!("app state still referenced at shutdown; skipping explicit close"),
    }
    result
}
