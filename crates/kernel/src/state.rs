//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::{Config, UploadBackend};
use crate::content::{BlogService, CertificateService, ContactNotifier, ContactService};
use crate::db;
use crate::file::{CloudinaryRelay, LocalFileStorage, StorageRelay, UploadRelay};
use crate::middleware::{CredentialVerifier, StaticTokenVerifier};
use crate::services::email::EmailService;
use crate::store::{ContentStore, PgContentStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Everything inside is
/// read-only after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Content persistence.
    store: Arc<dyn ContentStore>,

    /// Admin credential check.
    verifier: Arc<dyn CredentialVerifier>,

    blogs: BlogService,
    certificates: CertificateService,
    contacts: ContactService,
}

impl AppState {
    /// Create new application state from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let admin_token = config
            .admin_token
            .as_deref()
            .context("ADMIN_TOKEN environment variable is required")?;
        let verifier = Arc::new(StaticTokenVerifier::new(admin_token, &config.admin_email));

        let store = connect_store(config).await?;
        let relay = build_relay(config).await?;
        let notifier = build_notifier(config);

        Ok(Self::from_parts(store, verifier, relay, notifier))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        store: Arc<dyn ContentStore>,
        verifier: Arc<dyn CredentialVerifier>,
        relay: Arc<dyn UploadRelay>,
        notifier: Option<Arc<dyn ContactNotifier>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                blogs: BlogService::new(store.clone(), relay.clone()),
                certificates: CertificateService::new(store.clone(), relay),
                contacts: ContactService::new(store.clone(), notifier),
                store,
                verifier,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.inner.store
    }

    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.inner.verifier.as_ref()
    }

    pub fn blogs(&self) -> &BlogService {
        &self.inner.blogs
    }

    pub fn certificates(&self) -> &CertificateService {
        &self.inner.certificates
    }

    pub fn contacts(&self) -> &ContactService {
        &self.inner.contacts
    }
}

/// Connect to PostgreSQL and bring the schema up to date.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    let pool = db::create_pool(config)
        .await
        .context("failed to create database pool")?;

    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(Arc::new(PgContentStore::new(pool)))
}

async fn build_relay(config: &Config) -> Result<Arc<dyn UploadRelay>> {
    match config.upload_backend {
        UploadBackend::Cloudinary => {
            let cloud_name = config
                .cloudinary_cloud_name
                .as_deref()
                .context("CLOUDINARY_CLOUD_NAME is required for the cloudinary upload backend")?;
            let api_key = config
                .cloudinary_api_key
                .as_deref()
                .context("CLOUDINARY_API_KEY is required for the cloudinary upload backend")?;
            let api_secret = config
                .cloudinary_api_secret
                .as_deref()
                .context("CLOUDINARY_API_SECRET is required for the cloudinary upload backend")?;

            info!(cloud_name = %cloud_name, "uploads relayed to Cloudinary");
            Ok(Arc::new(CloudinaryRelay::new(cloud_name, api_key, api_secret)))
        }
        UploadBackend::Local => {
            info!(dir = ?config.uploads_dir, url = %config.files_url, "uploads stored on local disk");
            let storage = Arc::new(LocalFileStorage::new(&config.uploads_dir, &config.files_url));
            Ok(Arc::new(StorageRelay::new(storage)))
        }
        UploadBackend::S3 => build_s3_relay(config).await,
    }
}

#[cfg(feature = "s3")]
async fn build_s3_relay(config: &Config) -> Result<Arc<dyn UploadRelay>> {
    let bucket = config
        .s3_bucket
        .as_deref()
        .context("S3_BUCKET is required for the s3 upload backend")?;
    let public_url = config
        .s3_public_url
        .as_deref()
        .context("S3_PUBLIC_URL is required for the s3 upload backend")?;

    let storage = crate::file::S3FileStorage::new(
        config.s3_endpoint.as_deref(),
        bucket,
        config.s3_prefix.clone(),
        public_url,
    )
    .await;

    info!(bucket = %bucket, "uploads stored in S3");
    Ok(Arc::new(StorageRelay::new(Arc::new(storage))))
}

#[cfg(not(feature = "s3"))]
async fn build_s3_relay(_config: &Config) -> Result<Arc<dyn UploadRelay>> {
    anyhow::bail!("UPLOAD_BACKEND=s3 requires a build with the `s3` feature")
}

/// SMTP notifier, when both the mail server and the recipient are configured.
fn build_notifier(config: &Config) -> Option<Arc<dyn ContactNotifier>> {
    let (Some(host), Some(to)) = (&config.smtp_host, &config.contact_email_to) else {
        warn!("SMTP_HOST or CONTACT_EMAIL_TO not set; contact notifications disabled");
        return None;
    };

    match EmailService::new(
        host,
        config.smtp_port,
        config.smtp_username.as_deref(),
        config.smtp_password.as_deref(),
        &config.smtp_encryption,
        config.smtp_from_email.clone(),
        to.clone(),
    ) {
        Ok(svc) => {
            info!(host = %host, port = config.smtp_port, "SMTP email service configured");
            Some(Arc::new(svc))
        }
        Err(e) => {
            warn!(error = %e, "failed to configure SMTP; contact notifications disabled");
            None
        }
    }
}
