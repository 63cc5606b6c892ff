//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use crate::config::Config;
use crate::services::auth_service::AuthService;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: PgPool) -> Self {
        let auth = Arc::new(AuthService::new(db.clone(), config.clone()));
        Self { config, db, auth }
    }
}

pub type SharedState = Arc<AppState>;
