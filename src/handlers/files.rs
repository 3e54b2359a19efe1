use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    auth::{AdminUser, AuthenticatedUser},
    error::AppError,
    models::{FileInfoResponse, FilePathQuery, FileRecord, UploadResult},
    pagination::{PaginationParams, PaginationResult},
    repositories::PgFileRepository,
    state::AppState,
    storage::UploadedFile,
};

const DEFAULT_FOLDER: &str = "general";

/// Upload a file using multipart/form-data (`file`, optional `folder`).
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, AppError> {
    // Temporary holders for multipart fields
    let mut upload: Option<UploadedFile> = None;
    let mut folder = DEFAULT_FOLDER.to_string();

    let max_file_size = state.config.max_file_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "parse multipart form", max_file_size))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let content_type = field.content_type().map(|s| s.to_string());
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "read the file", max_file_size))?;
                upload = Some(UploadedFile::new(file_name, content_type, data));
            }
            "folder" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "read folder", max_file_size))?;
                if !value.trim().is_empty() {
                    folder = value;
                }
            }
            _ => {}
        }
    }

    let upload = upload
        .filter(|file| !file.file_name.is_empty())
        .ok_or_else(|| AppError::BadRequest("File is required".into()))?;

    let result = state.storage.upload(upload, &folder, Some(auth.user.id)).await?;

    info!("User {} uploaded {}", auth.user.id, result.file_path);
    Ok(Json(result))
}

/// Delete a file by its storage path. Owners and admins only.
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<FilePathQuery>,
) -> Result<Json<Value>, AppError> {
    let file_path = required_path(query)?;

    let record = state.storage.get_by_path(&file_path).await?;
    if record.uploaded_by != Some(auth.user.id) && !auth.user.is_admin() {
        warn!("User {} attempted to delete {} owned by someone else", auth.user.id, file_path);
        return Err(AppError::Forbidden("You can only delete your own files".into()));
    }

    state.storage.delete(&file_path).await?;

    Ok(Json(json!({ "message": "File deleted successfully" })))
}

/// Public URL for a storage path. Does not check that the file exists.
pub async fn get_file_info(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Query(query): Query<FilePathQuery>,
) -> Result<Json<FileInfoResponse>, AppError> {
    let file_path = required_path(query)?;
    let file_url = state.storage.get_url(&file_path);

    Ok(Json(FileInfoResponse { file_path, file_url }))
}

/// All files uploaded by the caller.
pub async fn get_my_files(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<FileRecord>>, AppError> {
    let files = state.storage.list_by_user(auth.user.id).await?;
    Ok(Json(files))
}

/// Paginated view of the caller's files.
pub async fn list_my_files(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginationResult<FileRecord>>, AppError> {
    let page = PgFileRepository::new(state.pool.clone())
        .paginate(&params, Some(auth.user.id))
        .await?;
    Ok(Json(page))
}

/// Paginated view of every stored file.
pub async fn list_files(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginationResult<FileRecord>>, AppError> {
    let page = PgFileRepository::new(state.pool.clone())
        .paginate(&params, None)
        .await?;
    Ok(Json(page))
}

// A body cut off by the request size limit is reported as an oversized file
fn multipart_error(err: MultipartError, action: &str, max_file_size: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("Upload rejected by body limit: {}", err);
        return AppError::PayloadTooLarge(format!(
            "File size exceeds maximum limit of {} bytes",
            max_file_size
        ));
    }
    error!("Failed to {}: {}", action, err);
    AppError::MultipartError(format!("Failed to {}: {}", action, err.body_text()))
}

fn required_path(query: FilePathQuery) -> Result<String, AppError> {
    query
        .file_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("File path is required".into()))
}
