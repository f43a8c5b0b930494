//! Cloudinary upload relay using the signed REST upload API.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::relay::{IncomingFile, RelayError, UploadProfile, UploadRelay, validate};
use crate::models::StoredImage;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary account credentials and HTTP client.
pub struct CloudinaryRelay {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryRelay {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    fn sign(&self, params: &[(&str, String)]) -> String {
        let digest = Sha256::digest(string_to_sign(params, &self.api_secret).as_bytes());
        hex::encode(digest)
    }

    async fn send(&self, action: &str, form: Form) -> anyhow::Result<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("cloudinary {action} request failed"))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.error.message)
            .unwrap_or_else(|_| "unreadable error body".to_string());
        Err(anyhow!("cloudinary {action} returned {status}: {message}"))
    }
}

impl std::fmt::Debug for CloudinaryRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryRelay")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

/// Parameters sorted by name, joined as `k=v&k=v`, then the secret appended.
fn string_to_sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{joined}{secret}")
}

fn upload_params(profile: &UploadProfile, timestamp: i64) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("allowed_formats", profile.allowed_formats.join(",")),
        ("folder", profile.folder()),
        ("timestamp", timestamp.to_string()),
    ];
    if let Some((w, h)) = profile.limit {
        params.push(("transformation", format!("c_limit,w_{w},h_{h}")));
    }
    params
}

#[async_trait]
impl UploadRelay for CloudinaryRelay {
    async fn upload(
        &self,
        profile: &UploadProfile,
        file: IncomingFile,
    ) -> Result<StoredImage, RelayError> {
        validate(profile, &file)?;

        let params = upload_params(profile, chrono::Utc::now().timestamp());
        let signature = self.sign(&params);

        let mut part = Part::bytes(file.data).file_name(file.filename);
        if let Some(mime) = file.content_type.as_deref() {
            part = part
                .mime_str(mime)
                .context("invalid content type")
                .map_err(RelayError::Backend)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let uploaded: UploadResponse = self
            .send("upload", form)
            .await
            .map_err(RelayError::Backend)?
            .json()
            .await
            .context("invalid cloudinary upload response")
            .map_err(RelayError::Backend)?;

        debug!(public_id = %uploaded.public_id, profile = profile.name, "uploaded to cloudinary");
        Ok(StoredImage {
            filename: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn destroy(&self, storage_id: &str) -> anyhow::Result<()> {
        let params = vec![
            ("public_id", storage_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ];
        let signature = self.sign(&params);

        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let destroyed: DestroyResponse = self
            .send("destroy", form)
            .await?
            .json()
            .await
            .context("invalid cloudinary destroy response")?;

        if destroyed.result != "ok" {
            anyhow::bail!("cloudinary destroy of {storage_id} returned '{}'", destroyed.result);
        }
        debug!(public_id = %storage_id, "destroyed on cloudinary");
        Ok(())
    }
}
