pub mod auth;
pub mod files;
pub mod users;

/// Liveness check.
pub async fn health_check() -> &'static str {
    "OK"
}
