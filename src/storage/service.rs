use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::{FileRecord, UploadResult},
    repositories::{FileRepository, NewFile},
    storage::{Storage, StorageBackend, StorageError, UploadedFile, ALLOWED_EXTENSIONS, DEFAULT_CONTENT_TYPE},
    utils::{generate_file_name, get_file_extension, normalize_folder},
};

/// Outcome of a [`StorageService::reconcile`] sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    /// Paths whose rows were dropped because the object was missing.
    pub removed: Vec<String>,
    /// Paths that could not be checked or cleaned up.
    pub failed: Vec<String>,
}

/// Bytes in a backing store plus one metadata row per file.
///
/// The two stores are not covered by a shared transaction: writes are undone
/// best-effort and divergence is repaired by [`StorageService::reconcile`].
#[derive(Clone)]
pub struct StorageService {
    backend: StorageBackend,
    files: Arc<dyn FileRepository>,
    max_file_size: u64,
}

impl StorageService {
    pub fn new(backend: StorageBackend, files: Arc<dyn FileRepository>, max_file_size: u64) -> Self {
        Self {
            backend,
            files,
            max_file_size,
        }
    }

    /// Size and extension checks. The content itself is not inspected.
    pub fn validate(&self, file: &UploadedFile) -> Result<(), StorageError> {
        if file.size() > self.max_file_size {
            return Err(StorageError::FileTooLarge {
                size: file.size(),
                max: self.max_file_size,
            });
        }

        match get_file_extension(&file.file_name) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            Some(ext) => Err(StorageError::ExtensionNotAllowed(format!(".{}", ext))),
            None => Err(StorageError::ExtensionNotAllowed("(none)".to_string())),
        }
    }

    /// Stores the bytes under `folder/<generated name>` and records the metadata row.
    pub async fn upload(
        &self,
        file: UploadedFile,
        folder: &str,
        uploaded_by: Option<Uuid>,
    ) -> Result<UploadResult, StorageError> {
        self.validate(&file)?;

        let folder = normalize_folder(folder).ok_or_else(|| StorageError::InvalidFolder(folder.to_string()))?;
        let file_name = generate_file_name(&file.file_name, Utc::now());
        let file_path = format!("{}/{}", folder, file_name);
        let content_type = file
            .content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let file_size = file.data.len() as i64;

        self.backend.upload(&file_path, file.data, &content_type).await?;

        let record = NewFile {
            id: Uuid::new_v4(),
            file_name,
            file_path: file_path.clone(),
            file_size,
            file_url: self.get_url(&file_path),
            content_type,
            folder,
            uploaded_by,
        };

        let saved = match self.files.insert(record).await {
            Ok(saved) => saved,
            Err(e) => {
                error!("Failed to save file record for {}: {}", file_path, e);
                // Compensate the write; an object left behind here is an orphan.
                if let Err(cleanup) = self.backend.delete(&file_path).await {
                    error!("Orphaned object {} after failed metadata insert: {}", file_path, cleanup);
                }
                return Err(StorageError::Database(e));
            }
        };

        info!("File uploaded: {} ({} bytes)", saved.file_path, saved.file_size);
        Ok(UploadResult::from(&saved))
    }

    /// Removes the object and then its metadata row.
    pub async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        let record = self.get_by_path(file_path).await?;

        self.backend.delete(&record.file_path).await.inspect_err(|e| {
            error!("Failed to delete object {}, metadata kept: {}", record.file_path, e);
        })?;

        match self.files.delete_by_path(&record.file_path).await {
            Ok(true) => {
                info!("File deleted: {}", record.file_path);
                Ok(())
            }
            // Row vanished between lookup and delete, e.g. a concurrent delete.
            Ok(false) => Err(StorageError::NotFound(record.file_path)),
            Err(e) => {
                error!(
                    "Object {} removed but its metadata row remains: {}",
                    record.file_path, e
                );
                Err(StorageError::Database(e))
            }
        }
    }

    /// Public URL for a path, computed from configuration only.
    pub fn get_url(&self, file_path: &str) -> String {
        self.backend.url(file_path)
    }

    pub async fn get_by_path(&self, file_path: &str) -> Result<FileRecord, StorageError> {
        self.files
            .find_by_path(file_path)
            .await?
            .ok_or_else(|| StorageError::NotFound(file_path.to_string()))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<FileRecord>, StorageError> {
        Ok(self.files.find_by_user(user_id).await?)
    }

    /// Drops metadata rows whose object no longer exists in the backing store.
    pub async fn reconcile(&self) -> Result<ReconcileReport, StorageError> {
        let paths = self.files.list_paths().await?;
        let mut report = ReconcileReport {
            scanned: paths.len(),
            ..Default::default()
        };

        for path in paths {
            match self.backend.exists(&path).await {
                Ok(true) => {}
                Ok(false) => match self.files.delete_by_path(&path).await {
                    Ok(_) => {
                        warn!("Removed metadata row for missing object {}", path);
                        report.removed.push(path);
                    }
                    Err(e) => {
                        error!("Could not remove stale metadata row {}: {}", path, e);
                        report.failed.push(path);
                    }
                },
                Err(e) => {
                    error!("Could not check object {}: {}", path, e);
                    report.failed.push(path);
                }
            }
        }

        info!(
            "Reconcile finished: {} scanned, {} removed, {} failed",
            report.scanned,
            report.removed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
