use sqlx::PgPool;
use crate::auth::JwtService;
use crate::storage::StorageService;
use crate::config::Config;

/// Central application state shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,

    /// Metadata-aware storage over the configured backend (local filesystem or MinIO).
    pub storage: StorageService,

    /// Issues and verifies bearer tokens.
    pub jwt: JwtService,

    /// Application configuration loaded from environment variables or `.env`.
    pub config: Config,
}
