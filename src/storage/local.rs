use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use bytes::Bytes;
use super::{Storage, StorageError};
use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// Route prefix under which the base directory is served.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

// Local filesystem storage
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf, // Base directory where files will be stored
}

impl LocalStorage {
    /// Creates a new LocalStorage instance and ensures the base directory exists
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    /// Returns the full path of a file relative to the base directory
    fn get_full_path(&self, file_path: &str) -> PathBuf {
        self.base_path.join(file_path)
    }
}

// Hidden sibling the bytes are written to before being renamed into place
fn temp_path_for(full_path: &Path) -> PathBuf {
    let name = full_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    full_path.with_file_name(format!(".{}.{}.part", name, &suffix[..8]))
}

async fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.flush().await
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, file_path: &str, content: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let full_path = self.get_full_path(file_path);

        // Ensure parent directories exist
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Readers never see a partially written object under the final path
        let temp_path = temp_path_for(&full_path);
        let written = match write_file(&temp_path, &content).await {
            Ok(()) => fs::rename(&temp_path, &full_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::error!("Could not remove partial upload {:?}: {}", temp_path, cleanup);
                }
            }
            return Err(StorageError::IoError(e));
        }

        tracing::info!("Saved file at {:?}", full_path);
        Ok(())
    }

    async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        let full_path = self.get_full_path(file_path);

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("File {:?} already absent", full_path);
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteError(format!("{}: {}", file_path, e))),
        }
    }

    async fn exists(&self, file_path: &str) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.get_full_path(file_path)).await?)
    }

    fn url(&self, file_path: &str) -> String {
        format!("{}/{}", LOCAL_URL_PREFIX, file_path.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn upload_then_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload("general/a.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert!(storage.exists("general/a.txt").await.unwrap());
        assert_eq!(std::fs::read(dir.path().join("general/a.txt")).unwrap(), b"hello");

        storage.delete("general/a.txt").await.unwrap();
        assert!(!storage.exists("general/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file_behind() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        // A non-empty directory squatting on the target path makes the final rename fail
        std::fs::create_dir_all(dir.path().join("general/a.txt")).unwrap();
        std::fs::write(dir.path().join("general/a.txt/keep"), b"x").unwrap();

        let result = storage
            .upload("general/a.txt", Bytes::from_static(b"hello"), "text/plain")
            .await;

        assert!(matches!(result, Err(StorageError::IoError(_))));
        let entries: Vec<String> = std::fs::read_dir(dir.path().join("general"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn deleting_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.delete("nowhere/missing.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn url_uses_static_prefix_and_forward_slashes() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert_eq!(storage.url("general/a.txt"), "/uploads/general/a.txt");
        assert_eq!(storage.url("docs\\b.pdf"), "/uploads/docs/b.pdf");
    }
}
