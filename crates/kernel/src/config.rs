//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Which upload relay backend to use for images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadBackend {
    /// Cloudinary signed upload API (default).
    Cloudinary,
    /// Local filesystem under `UPLOADS_DIR`, served from `FILES_URL`.
    Local,
    /// S3-compatible object storage (requires the `s3` feature).
    S3,
}

impl UploadBackend {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "cloudinary" => Ok(Self::Cloudinary),
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => bail!("UPLOAD_BACKEND must be cloudinary, local or s3 (got {other:?})"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 5000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Shared bearer secret for every admin endpoint. Required to serve.
    pub admin_token: Option<String>,

    /// Identity reported for requests carrying the admin secret.
    pub admin_email: String,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Image relay backend (default: cloudinary).
    pub upload_backend: UploadBackend,

    /// Cloudinary cloud name.
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret, used to sign uploads.
    pub cloudinary_api_secret: Option<String>,

    /// Path to uploads directory for the local backend (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving locally stored files (default: /files).
    pub files_url: String,

    /// S3 bucket for the s3 backend.
    pub s3_bucket: Option<String>,

    /// Optional key prefix inside the bucket.
    pub s3_prefix: Option<String>,

    /// Custom endpoint for S3-compatible services (MinIO etc.).
    pub s3_endpoint: Option<String>,

    /// Public base URL for objects in the bucket (CDN or bucket URL).
    pub s3_public_url: Option<String>,

    /// SMTP host for email delivery. When None, notifications are skipped.
    pub smtp_host: Option<String>,

    /// SMTP port (default: 587).
    pub smtp_port: u16,

    /// SMTP username for authentication.
    pub smtp_username: Option<String>,

    /// SMTP password for authentication.
    pub smtp_password: Option<String>,

    /// SMTP encryption mode: "starttls" (default), "tls", or "none".
    pub smtp_encryption: String,

    /// From address for outgoing email.
    pub smtp_from_email: String,

    /// Recipient of contact form notifications.
    pub contact_email_to: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|t| !t.trim().is_empty());

        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@electrolyte.com".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let upload_backend = UploadBackend::parse(
            &env::var("UPLOAD_BACKEND")
                .unwrap_or_else(|_| "cloudinary".to_string())
                .to_lowercase(),
        )?;

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let files_url = env::var("FILES_URL").unwrap_or_else(|_| "/files".to_string());

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .context("SMTP_PORT must be a valid u16")?;

        let smtp_encryption = env::var("SMTP_ENCRYPTION")
            .unwrap_or_else(|_| "starttls".to_string())
            .to_lowercase();

        let smtp_from_email =
            env::var("SMTP_FROM_EMAIL").unwrap_or_else(|_| "noreply@localhost".to_string());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            admin_token,
            admin_email,
            cors_allowed_origins,
            upload_backend,
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            cloudinary_api_key: env::var("CLOUDINARY_API_KEY").ok(),
            cloudinary_api_secret: env::var("CLOUDINARY_API_SECRET").ok(),
            uploads_dir,
            files_url,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_prefix: env::var("S3_PREFIX").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_url: env::var("S3_PUBLIC_URL").ok(),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_encryption,
            smtp_from_email,
            contact_email_to: env::var("CONTACT_EMAIL_TO").ok(),
        })
    }
}
