use axum::{Json, extract::State};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    auth::{verify_dummy_password, verify_password, AuthError},
    error::AppError,
    models::{LoginRequest, LoginResponse},
    repositories::UserRepository,
    state::AppState,
};

/// Exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let user = UserRepository::new(state.pool.clone())
        .find_by_email(&payload.email)
        .await?;

    let verified = match &user {
        Some(user) => verify_password(&payload.password, &user.password),
        None => verify_dummy_password(&payload.password),
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!("Failed login attempt for {}", payload.email);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let token = state.jwt.create_token_for_user(user.id, user.email.clone(), user.role)?;

    info!("User {} logged in", user.id);
    Ok(Json(LoginResponse { user, token }))
}
