//! Certificate operations.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::side_effect::{Outcome, SideEffect};
use crate::error::{AppError, AppResult};
use crate::file::{IncomingFile, UploadProfile, UploadRelay};
use crate::models::{Certificate, CreateCertificate, StoredImage, UpdateCertificate};
use crate::store::ContentStore;

const NOT_FOUND: &str = "Certificate not found";

/// Raw certificate fields as submitted by the admin form.
#[derive(Debug, Clone, Default)]
pub struct CertificateSubmission {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<String>,
    pub active: Option<String>,
    pub image: Option<IncomingFile>,
}

/// Service for certificate CRUD.
#[derive(Clone)]
pub struct CertificateService {
    store: Arc<dyn ContentStore>,
    relay: Arc<dyn UploadRelay>,
}

impl CertificateService {
    pub fn new(store: Arc<dyn ContentStore>, relay: Arc<dyn UploadRelay>) -> Self {
        Self { store, relay }
    }

    /// Certificates by display order. `active` narrows to one state.
    pub async fn list(&self, active: Option<bool>) -> AppResult<Vec<Certificate>> {
        Ok(self.store.list_certificates(active).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Certificate> {
        self.store
            .find_certificate(id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))
    }

    pub async fn create(&self, submission: CertificateSubmission) -> AppResult<Certificate> {
        let Some(file) = submission.image else {
            return Err(AppError::bad_request(
                "Certificate image required (multipart/form-data name=image)",
            ));
        };
        let order = parse_order(submission.order.as_deref())?.unwrap_or(0);

        let image = self.upload(file).await?;
        let input = CreateCertificate {
            name: submission.name.unwrap_or_default(),
            description: submission.description.unwrap_or_default(),
            image: image.clone(),
            order,
            active: submission.active.as_deref().is_none_or(|a| a == "true"),
        };

        let certificate = match self.store.insert_certificate(input).await {
            Ok(certificate) => certificate,
            Err(e) => {
                self.discard(&image).await;
                return Err(e.into());
            }
        };

        info!(certificate_id = %certificate.id, "certificate created");
        Ok(certificate)
    }

    /// Apply a partial update. A new image replaces the old one, which is
    /// then purged on a best-effort basis.
    pub async fn update(
        &self,
        id: Uuid,
        submission: CertificateSubmission,
    ) -> AppResult<Outcome<Certificate>> {
        let current = self.get(id).await?;
        let order = parse_order(submission.order.as_deref())?;

        let image = match submission.image {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        let changes = UpdateCertificate {
            name: submission.name,
            description: submission.description,
            image: image.clone(),
            order,
            active: submission.active.map(|a| a == "true"),
        };

        let updated = match self.store.update_certificate(id, changes).await {
            Ok(Some(certificate)) => certificate,
            result => {
                if let Some(image) = &image {
                    self.discard(image).await;
                }
                return match result {
                    Err(e) => Err(e.into()),
                    _ => Err(AppError::NotFound(NOT_FOUND)),
                };
            }
        };

        let purge = if image.is_some() {
            SideEffect::record(
                "purge replaced certificate image",
                self.relay.destroy(&current.image.filename).await,
            )
        } else {
            SideEffect::Skipped
        };

        info!(certificate_id = %updated.id, image_purge = %purge, "certificate updated");
        Ok(Outcome::new(updated, purge))
    }

    /// Remove a certificate, then try to purge its image.
    pub async fn delete(&self, id: Uuid) -> AppResult<Outcome<Certificate>> {
        let certificate = self
            .store
            .delete_certificate(id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;

        let purge = SideEffect::record(
            "purge certificate image",
            self.relay.destroy(&certificate.image.filename).await,
        );

        info!(certificate_id = %certificate.id, image_purge = %purge, "certificate deleted");
        Ok(Outcome::new(certificate, purge))
    }

    async fn upload(&self, file: IncomingFile) -> AppResult<StoredImage> {
        Ok(self.relay.upload(&UploadProfile::CERTIFICATES, file).await?)
    }

    async fn discard(&self, image: &StoredImage) {
        SideEffect::record("discard orphaned upload", self.relay.destroy(&image.filename).await);
    }
}

/// Parse the display order. Blank counts as not supplied.
fn parse_order(value: Option<&str>) -> AppResult<Option<i32>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| AppError::bad_request("order must be an integer")),
        None => Ok(None),
    }
}
