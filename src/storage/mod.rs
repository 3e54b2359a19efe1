// Submodules for local file system storage, S3 storage and the metadata-aware service
mod local;
mod s3;
mod service;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

pub use local::LocalStorage;
pub use s3::{object_url, S3Storage};
pub use service::{ReconcileReport, StorageService};

use crate::config::{Config, StorageType};

/// Extensions accepted by `StorageService::validate`, lowercase and without the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "pdf", "doc", "docx", "txt"];

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File size {size} exceeds maximum limit of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("File extension {0} is not allowed")]
    ExtensionNotAllowed(String),

    #[error("Invalid folder: {0}")]
    InvalidFolder(String),

    #[error("File not found: {0}")]
    NotFound(String), // Returned when no metadata row exists for a path

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error), // Wraps standard I/O errors

    #[error("Upload Error: {0}")]
    UploadError(String), // Errors during upload to storage

    #[error("Delete Error: {0}")]
    DeleteError(String), // Errors during deletion from storage

    #[error("Backend Error: {0}")]
    BackendError(String),

    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An uploaded file held in memory, as received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

// Async object storage trait, keyed by relative path (`folder/name`)
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an object, replacing anything stored under the same path.
    async fn upload(&self, file_path: &str, content: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Remove an object. Removing an absent object succeeds.
    async fn delete(&self, file_path: &str) -> Result<(), StorageError>;

    /// Whether an object is currently stored under the path.
    async fn exists(&self, file_path: &str) -> Result<bool, StorageError>;

    /// Public URL for a path. Pure, no I/O.
    fn url(&self, file_path: &str) -> String;
}

// Enum to represent storage backends
#[derive(Clone)]
pub enum StorageBackend {
    Local(LocalStorage), // Local filesystem storage
    S3(S3Storage),       // MinIO or any S3-compatible store
}

// Delegates calls to the chosen backend
#[async_trait]
impl Storage for StorageBackend {
    async fn upload(&self, file_path: &str, content: Bytes, content_type: &str) -> Result<(), StorageError> {
        match self {
            StorageBackend::Local(s) => s.upload(file_path, content, content_type).await,
            StorageBackend::S3(s) => s.upload(file_path, content, content_type).await,
        }
    }

    async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        match self {
            StorageBackend::Local(s) => s.delete(file_path).await,
            StorageBackend::S3(s) => s.delete(file_path).await,
        }
    }

    async fn exists(&self, file_path: &str) -> Result<bool, StorageError> {
        match self {
            StorageBackend::Local(s) => s.exists(file_path).await,
            StorageBackend::S3(s) => s.exists(file_path).await,
        }
    }

    fn url(&self, file_path: &str) -> String {
        match self {
            StorageBackend::Local(s) => s.url(file_path),
            StorageBackend::S3(s) => s.url(file_path),
        }
    }
}

// Initialize the storage backend based on config
pub async fn init_storage(config: &Config) -> Result<StorageBackend, StorageError> {
    match config.storage_type {
        StorageType::Minio => {
            info!("Initializing MinIO storage at {}", config.minio_endpoint);
            Ok(StorageBackend::S3(S3Storage::new(config).await?))
        }
        StorageType::Local => {
            info!("Initializing Local storage at {}", config.storage_local_path);
            Ok(StorageBackend::Local(LocalStorage::new(&config.storage_local_path).await?))
        }
    }
}
