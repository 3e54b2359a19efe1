use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::FileRecord,
    pagination::{fetch_page, like_pattern, FilterValue, PageScope, PaginationError, PaginationParams, PaginationResult},
};

const FILE_COLUMNS: &str =
    "id, file_name, file_path, file_size, file_url, content_type, folder, uploaded_by, created_at, updated_at";

/// Values for a new `files` row.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_url: String,
    pub content_type: String,
    pub folder: String,
    pub uploaded_by: Option<Uuid>,
}

/// Metadata store for uploaded files.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert(&self, file: NewFile) -> Result<FileRecord, sqlx::Error>;

    async fn find_by_path(&self, file_path: &str) -> Result<Option<FileRecord>, sqlx::Error>;

    /// Records uploaded by a user, most recent first.
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, sqlx::Error>;

    /// Returns whether a row was removed.
    async fn delete_by_path(&self, file_path: &str) -> Result<bool, sqlx::Error>;

    async fn list_paths(&self) -> Result<Vec<String>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paginated listing, optionally restricted to one uploader.
    pub async fn paginate(
        &self,
        params: &PaginationParams,
        uploaded_by: Option<Uuid>,
    ) -> Result<PaginationResult<FileRecord>, PaginationError> {
        fetch_page(&self.pool, &Self::scope(uploaded_by), params).await
    }

    pub fn scope(uploaded_by: Option<Uuid>) -> PageScope {
        let scope = PageScope::new("files", "created_at")
            .columns(FILE_COLUMNS)
            .search(search_files);
        match uploaded_by {
            Some(user_id) => scope.filter_eq("uploaded_by", FilterValue::Uuid(user_id)),
            None => scope,
        }
    }
}

fn search_files(query: &mut QueryBuilder<'static, Postgres>, term: &str) {
    let pattern = like_pattern(term);
    query
        .push("file_name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR folder ILIKE ")
        .push_bind(pattern);
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, file: NewFile) -> Result<FileRecord, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(&format!(
            "INSERT INTO files (id, file_name, file_path, file_size, file_url, content_type, folder, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            FILE_COLUMNS
        ))
        .bind(file.id)
        .bind(file.file_name)
        .bind(file.file_path)
        .bind(file.file_size)
        .bind(file.file_url)
        .bind(file.content_type)
        .bind(file.folder)
        .bind(file.uploaded_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_by_path(&self, file_path: &str) -> Result<Option<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(&format!("SELECT {} FROM files WHERE file_path = $1", FILE_COLUMNS))
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {} FROM files WHERE uploaded_by = $1 ORDER BY created_at DESC, id DESC",
            FILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_by_path(&self, file_path: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE file_path = $1")
            .bind(file_path)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_paths(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT file_path FROM files ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
    }
}
