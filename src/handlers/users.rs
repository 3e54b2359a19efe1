use axum::{Json, extract::{Path, Query, State}, http::StatusCode};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{hash_password, AdminUser, AuthenticatedUser},
    error::{is_unique_violation, AppError},
    models::{CreateUser, UpdateUser, User, UserFilter, UserRole},
    pagination::{PaginationParams, PaginationResult},
    repositories::{NewUser, UserChanges, UserRepository},
    state::AppState,
};

/// Paginated user listing with search over name, email and role.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<PaginationResult<User>>, AppError> {
    let page = UserRepository::new(state.pool.clone())
        .list_users(&params, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    payload.validate()?;

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        password_hash: hash_password(&payload.password)?,
        role: payload.role.unwrap_or(UserRole::User),
        verified_email: false,
    };

    let user = UserRepository::new(state.pool.clone())
        .create_user(new_user)
        .await
        .map_err(email_conflict)?;

    info!("User {} created by {}", user.id, admin.user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Callers may read themselves; admins may read anyone.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self_or_admin(&auth, user_id)?;

    let user = UserRepository::new(state.pool.clone())
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<User>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self_or_admin(&auth, user_id)?;
    payload.validate()?;

    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    if payload.role.is_some() && !auth.user.is_admin() {
        return Err(AppError::Forbidden("Only admins can change roles".into()));
    }

    let password_hash = payload.password.as_deref().map(hash_password).transpose()?;
    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role,
    };

    let user = UserRepository::new(state.pool.clone())
        .update_user(user_id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    ensure_self_or_admin(&auth, user_id)?;

    let deleted = UserRepository::new(state.pool.clone()).delete_user(user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!("User {} deleted by {}", user_id, auth.user.id);
    Ok(Json(json!({ "message": "Delete user successfully" })))
}

fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid user ID".into()))
}

fn ensure_self_or_admin(auth: &AuthenticatedUser, user_id: Uuid) -> Result<(), AppError> {
    if auth.user.id == user_id || auth.user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("You can only access your own account".into()))
    }
}

fn email_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Email already taken".into())
    } else {
        AppError::DatabaseError(err)
    }
}
