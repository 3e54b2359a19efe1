pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod state;
pub mod storage;
pub mod utils;

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    auth::hash_password,
    handlers::{auth as auth_handlers, files, health_check, users},
    middleware::{handle_panic, not_found, rate_limit, RateLimiter},
    models::UserRole,
    repositories::{NewUser, UserRepository},
    state::AppState,
};

// Room for multipart boundaries and the folder field on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the HTTP router: API routes under `/v1`, locally stored files under `/uploads`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.max_file_size as usize + MULTIPART_OVERHEAD;
    let auth_limiter = RateLimiter::new(
        state.config.auth_rate_limit,
        Duration::from_secs(state.config.auth_rate_window_secs),
    );

    let auth = Router::new()
        .route("/login", post(auth_handlers::login))
        .route_layer(from_fn_with_state(auth_limiter, rate_limit));

    let api = Router::new()
        .nest("/auth", auth)
        .route(
            "/files/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/delete", delete(files::delete_file))
        .route("/files/info", get(files::get_file_info))
        .route("/files/my-files", get(files::get_my_files))
        .route("/files/mine", get(files::list_my_files))
        .route("/files", get(files::list_files))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", api)
        .nest_service("/uploads", ServeDir::new(&state.config.storage_local_path))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the configured admin account unless a user with that email exists.
///
/// Returns `true` when a user was created.
pub async fn seed_admin(state: &AppState) -> Result<bool, anyhow::Error> {
    let users = UserRepository::new(state.pool.clone());
    let email = state.config.admin_email.to_lowercase();

    if users.find_by_email(&email).await?.is_some() {
        info!("Seed skipped: admin {} already exists", email);
        return Ok(false);
    }

    let password_hash = hash_password(&state.config.admin_password)?;
    let admin = users
        .create_user(NewUser {
            name: state.config.admin_name.clone(),
            email,
            password_hash,
            role: UserRole::Admin,
            verified_email: true,
        })
        .await?;

    info!("Seeded admin user {} ({})", admin.email, admin.id);
    Ok(true)
}
