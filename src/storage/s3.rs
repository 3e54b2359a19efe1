use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use aws_sdk_s3::{Client, primitives::ByteStream};
use bytes::Bytes;
use tracing::info;
use async_trait::async_trait;
use crate::{config::Config, storage::{Storage, StorageError}};

/// Builds `{http|https}://{endpoint}/{bucket}/{path}`.
pub fn object_url(use_ssl: bool, endpoint: &str, bucket: &str, file_path: &str) -> String {
    let protocol = if use_ssl { "https" } else { "http" };
    format!("{}://{}/{}/{}", protocol, endpoint, bucket, file_path)
}

// S3-compatible storage backend (MinIO)
#[derive(Clone)]
pub struct S3Storage {
    client: Client,   // S3 client
    bucket: String,   // Bucket name
    endpoint: String, // host[:port], without protocol
    use_ssl: bool,
}

impl S3Storage {
    /// Initialize the S3 client and ensure the bucket exists
    pub async fn new(config: &Config) -> Result<Self, StorageError> {
        let protocol = if config.minio_use_ssl { "https" } else { "http" };
        let endpoint_url = format!("{}://{}", protocol, config.minio_endpoint);

        let credentials = Credentials::new(
            config.minio_access_key.clone(),
            config.minio_secret_key.clone(),
            None,
            None,
            "static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.minio_region.clone()))
            .endpoint_url(endpoint_url)
            .credentials_provider(credentials)
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true) // Required for MinIO
                .build(),
        );

        Self::ensure_bucket_exists(&client, &config.minio_bucket).await?;

        Ok(Self {
            client,
            bucket: config.minio_bucket.clone(),
            endpoint: config.minio_endpoint.clone(),
            use_ssl: config.minio_use_ssl,
        })
    }

    /// Ensure the bucket exists, creating it when missing
    async fn ensure_bucket_exists(client: &Client, bucket: &str) -> Result<(), StorageError> {
        if client.head_bucket().bucket(bucket).send().await.is_ok() {
            info!("Bucket {} already exists", bucket);
            return Ok(());
        }

        match client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Bucket {} created successfully", bucket);
                Ok(())
            }
            Err(e) => {
                let service_error = e.as_service_error();
                if service_error.is_some_and(|se| se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists()) {
                    info!("Bucket {} already exists", bucket);
                    Ok(())
                } else {
                    tracing::error!("Bucket {} does not exist and cannot be created: {}", bucket, e);
                    Err(StorageError::BackendError(format!("cannot create bucket {}: {}", bucket, e)))
                }
            }
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(&self, file_path: &str, content: Bytes, content_type: &str) -> Result<(), StorageError> {
        let body = ByteStream::from(content);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(file_path)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::UploadError(e.to_string()))?;

        info!("S3 PUT key = {}", file_path);
        Ok(())
    }

    // DeleteObject succeeds for absent keys
    async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(file_path)
            .send()
            .await
            .map_err(|e| StorageError::DeleteError(e.to_string()))?;

        info!("File deleted successfully from s3: {}", file_path);
        Ok(())
    }

    async fn exists(&self, file_path: &str) -> Result<bool, StorageError> {
        match self.client.head_object().bucket(&self.bucket).key(file_path).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(false)
                } else {
                    Err(StorageError::BackendError(e.to_string()))
                }
            }
        }
    }

    fn url(&self, file_path: &str) -> String {
        object_url(self.use_ssl, &self.endpoint, &self.bucket, file_path)
    }
}
