use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::response::ResponseFlags;

/// Shared handler state. Cloned per request, so everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt_secret_key, config.jwt_expiration_hours);
        Self {
            db,
            config: Arc::new(config),
            tokens,
            passwords: PasswordHasher::default(),
        }
    }

    #[must_use]
    pub fn response_flags(&self) -> ResponseFlags {
        self.config.response_flags()
    }
}
