use chrono::Duration;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::cart::CartService;
use crate::config::{AppConfig, MAX_TOKEN_TTL_HOURS};

/// Shared by every handler through an `Extension` layer.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub carts: CartService,
    pub jwt: JwtSettings,
}

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: Arc<str>,
    pub ttl: Duration,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        AppState {
            carts: CartService::new(db.clone()),
            db,
            jwt: JwtSettings {
                secret: Arc::from(config.secret.as_str()),
                ttl: Duration::hours(config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
            },
        }
    }
}
