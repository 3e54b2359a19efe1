mod common;

use bytes::Bytes;
use chrono::Utc;
use crud_service::{
    models::FileRecord,
    storage::{StorageError, UploadedFile},
};
use tempfile::TempDir;
use uuid::Uuid;

use common::local_service;

fn pdf(size: usize) -> UploadedFile {
    UploadedFile::new("report.pdf", Some("application/pdf".into()), Bytes::from(vec![7u8; size]))
}

fn stored_files(dir: &TempDir) -> usize {
    walk(dir.path())
}

fn walk(path: &std::path::Path) -> usize {
    std::fs::read_dir(path)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() { walk(&path) } else { 1 }
        })
        .sum()
}

#[tokio::test]
async fn upload_stores_bytes_and_metadata() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 10_485_760).await;
    let owner = Uuid::new_v4();

    let result = service.upload(pdf(512_000), "documents", Some(owner)).await.unwrap();

    assert_eq!(result.file_size, 512_000);
    assert!(result.file_path.starts_with("documents/report_"));
    assert_eq!(result.file_url, format!("/uploads/{}", result.file_path));

    // report_<YYYYMMDDHHMMSS>_<8 hex>.pdf
    let stem = result.file_name.strip_suffix(".pdf").unwrap();
    let parts: Vec<&str> = stem.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "report");
    assert_eq!(parts[1].len(), 14);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 8);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));

    let on_disk = std::fs::read(dir.path().join(&result.file_path)).unwrap();
    assert_eq!(on_disk.len(), 512_000);

    let rows = files.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].folder, "documents");
    assert_eq!(rows[0].content_type, "application/pdf");
    assert_eq!(rows[0].uploaded_by, Some(owner));
}

#[tokio::test]
async fn blank_folder_defaults_to_general() {
    let dir = TempDir::new().unwrap();
    let (service, _) = local_service(&dir, 1024).await;

    let result = service.upload(pdf(10), "", None).await.unwrap();

    assert!(result.file_path.starts_with("general/"));
}

#[tokio::test]
async fn disallowed_extension_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 1024).await;
    let exe = UploadedFile::new("setup.exe", None, Bytes::from_static(b"MZ"));

    let err = service.upload(exe, "general", None).await.unwrap_err();

    assert!(matches!(err, StorageError::ExtensionNotAllowed(ref ext) if ext == ".exe"));
    assert_eq!(stored_files(&dir), 0);
    assert!(files.rows().is_empty());
}

#[tokio::test]
async fn oversized_file_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 100).await;

    let err = service.upload(pdf(101), "general", None).await.unwrap_err();

    assert!(matches!(err, StorageError::FileTooLarge { size: 101, max: 100 }));
    assert_eq!(stored_files(&dir), 0);
    assert!(files.rows().is_empty());
}

#[tokio::test]
async fn file_at_exact_limit_is_accepted() {
    let dir = TempDir::new().unwrap();
    let (service, _) = local_service(&dir, 100).await;

    assert!(service.upload(pdf(100), "general", None).await.is_ok());
}

#[tokio::test]
async fn folder_traversal_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 1024).await;

    let err = service.upload(pdf(10), "../etc", None).await.unwrap_err();

    assert!(matches!(err, StorageError::InvalidFolder(_)));
    assert!(files.rows().is_empty());
}

#[tokio::test]
async fn failed_metadata_insert_removes_the_object() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 1024).await;
    files.fail_inserts(true);

    let err = service.upload(pdf(10), "documents", None).await.unwrap_err();

    assert!(matches!(err, StorageError::Database(_)));
    assert_eq!(stored_files(&dir), 0);
    assert!(files.rows().is_empty());
}

#[tokio::test]
async fn delete_removes_object_and_row_then_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 1024).await;
    let result = service.upload(pdf(10), "documents", None).await.unwrap();

    service.delete(&result.file_path).await.unwrap();

    assert!(!dir.path().join(&result.file_path).exists());
    assert!(files.rows().is_empty());

    let again = service.delete(&result.file_path).await.unwrap_err();
    assert!(matches!(again, StorageError::NotFound(_)));
}

#[tokio::test]
async fn list_by_user_returns_only_that_users_files() {
    let dir = TempDir::new().unwrap();
    let (service, _) = local_service(&dir, 1024).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    service.upload(pdf(1), "a", Some(alice)).await.unwrap();
    service.upload(pdf(2), "a", Some(alice)).await.unwrap();
    service.upload(pdf(3), "b", Some(bob)).await.unwrap();

    let mine = service.list_by_user(alice).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|f| f.uploaded_by == Some(alice)));
    assert!(service.list_by_user(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn url_is_computed_without_touching_storage() {
    let dir = TempDir::new().unwrap();
    let (service, _) = local_service(&dir, 1024).await;

    assert_eq!(service.get_url("missing/nothing.txt"), "/uploads/missing/nothing.txt");
}

#[tokio::test]
async fn reconcile_drops_rows_whose_objects_are_gone() {
    let dir = TempDir::new().unwrap();
    let (service, files) = local_service(&dir, 1024).await;
    let kept = service.upload(pdf(10), "documents", None).await.unwrap();

    let now = Utc::now();
    files.push(FileRecord {
        id: Uuid::new_v4(),
        file_name: "ghost.pdf".into(),
        file_path: "documents/ghost.pdf".into(),
        file_size: 10,
        file_url: "/uploads/documents/ghost.pdf".into(),
        content_type: "application/pdf".into(),
        folder: "documents".into(),
        uploaded_by: None,
        created_at: now,
        updated_at: now,
    });

    let report = service.reconcile().await.unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.removed, vec!["documents/ghost.pdf".to_string()]);
    assert!(report.failed.is_empty());
    let remaining: Vec<_> = files.rows().into_iter().map(|r| r.file_path).collect();
    assert_eq!(remaining, vec![kept.file_path]);
}
