//! Central application state
//!
//! Every handler dependency lives here and reaches handlers through
//! `web::Data<AppState>`. Nothing is held in module-level globals.

use crate::config::Config;
use crate::middleware::SessionManager;
use crate::security::TokenService;
use crate::services::{Mailer, Renderer};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub sessions: SessionManager,
    pub mailer: Arc<dyn Mailer>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Wire token and session services from configuration
    pub fn new(
        db: SqlitePool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let tokens = TokenService::new(
            &config.security.secret_key,
            config.security.reset_token_ttl_secs,
        );
        let sessions = SessionManager::new(tokens.clone(), &config.security);

        Self {
            db,
            config: Arc::new(config),
            tokens,
            sessions,
            mailer,
            renderer,
        }
    }
}
