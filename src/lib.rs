pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod routes;
pub mod structs;
pub mod utils;

use sqlx::SqlitePool;

use auth::TokenKeys;
use config::Config;
use errors::AppError;

/// Shared per-process state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, jwt_secret: &str) -> Self {
        Self {
            db_pool,
            tokens: TokenKeys::from_secret(jwt_secret.as_bytes()),
        }
    }

    /// Opens the database, applies migrations and seeds the first admin.
    pub async fn bootstrap(config: &Config) -> Result<Self, AppError> {
        let db_pool = db::init_pool(&config.database_url).await?;
        db::migrate(&db_pool).await?;
        db::seed_admin(&db_pool, &config.admin_username, &config.admin_password).await?;
        Ok(Self::new(db_pool, &config.jwt_secret))
    }
}
