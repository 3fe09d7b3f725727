pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::ServerConfig;
pub use server::{run, AppState};
