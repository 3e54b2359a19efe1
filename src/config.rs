use std::{env, str::FromStr};

use dotenvy::dotenv;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Which backing store holds uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Local,
    Minio,
}

impl FromStr for StorageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "minio" | "s3" => Ok(StorageType::Minio),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    pub app_host: String,
    pub app_port: u16,
    pub database_url: String,
    #[validate(range(min = 1, max = 100))]
    pub db_max_connections: u32,

    pub storage_type: StorageType,
    pub storage_local_path: String,
    #[validate(range(min = 1, max = 104857600))] // Max 100MB
    pub max_file_size: u64,

    pub minio_endpoint: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_bucket: String,
    pub minio_use_ssl: bool,
    pub minio_region: String,

    #[validate(length(min = 16))]
    pub jwt_secret: String,
    pub jwt_expires_in: String,

    #[validate(range(min = 1))]
    pub auth_rate_limit: u32,
    #[validate(range(min = 1))]
    pub auth_rate_window_secs: u64,

    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load environment variables from `.env` file (if it exists)
        dotenv().ok();

        let storage_type = env_or("STORAGE_TYPE", "local");
        let storage_type = storage_type.parse().map_err(|_| ConfigError::Invalid {
            key: "STORAGE_TYPE",
            value: storage_type.clone(),
        })?;

        let config = Config {
            app_host: env_or("APP_HOST", "0.0.0.0"),
            app_port: parse_env("APP_PORT", 3000)?,
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            storage_type,
            storage_local_path: env_or("STORAGE_LOCAL_PATH", "uploads"),
            max_file_size: parse_env("STORAGE_MAX_FILE_SIZE", 10_485_760)?,
            minio_endpoint: env_or("MINIO_ENDPOINT", "localhost:9000"),
            minio_access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            minio_secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
            minio_bucket: env_or("MINIO_BUCKET_NAME", "uploads"),
            minio_use_ssl: parse_env("MINIO_USE_SSL", false)?,
            minio_region: env_or("MINIO_REGION", "us-east-1"),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            jwt_expires_in: env_or("JWT_EXPIRES_IN", "24h"),
            auth_rate_limit: parse_env("AUTH_RATE_LIMIT", 20)?,
            auth_rate_window_secs: parse_env("AUTH_RATE_WINDOW_SECS", 900)?,
            admin_name: env_or("ADMIN_NAME", "Admin User"),
            admin_email: env_or("ADMIN_EMAIL", "admin@example.com"),
            admin_password: env_or("ADMIN_PASSWORD", "password1"),
        };

        // Validate configuration values (e.g. file size range)
        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
