//! Upload relay: validates an incoming image and hands it to a storage
//! provider, which issues the public URL and the identifier used to purge it.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use image::ImageFormat;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::debug;

use super::storage::FileStorage;
use crate::models::StoredImage;

/// Maximum accepted upload size (10 MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Per-resource upload rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProfile {
    pub name: &'static str,
    pub allowed_formats: &'static [&'static str],
    /// Bounding box `(width, height)`; larger images are scaled down to fit.
    pub limit: Option<(u32, u32)>,
}

impl UploadProfile {
    pub const BLOGS: UploadProfile = UploadProfile {
        name: "blogs",
        allowed_formats: IMAGE_FORMATS,
        limit: Some((1200, 630)),
    };

    pub const CERTIFICATES: UploadProfile = UploadProfile {
        name: "certificates",
        allowed_formats: &["jpg", "jpeg", "png", "gif", "webp", "pdf"],
        limit: Some((1200, 1600)),
    };

    pub const PHOTOS: UploadProfile = UploadProfile {
        name: "photos",
        allowed_formats: IMAGE_FORMATS,
        limit: None,
    };

    pub const SPONSORS: UploadProfile = UploadProfile {
        name: "sponsors",
        allowed_formats: &["jpg", "jpeg", "png", "gif", "webp", "svg"],
        limit: Some((500, 500)),
    };

    /// Storage folder for this profile.
    pub fn folder(&self) -> String {
        format!("electrolyte/{}", self.name)
    }

    fn allows(&self, format: &str) -> bool {
        self.allowed_formats.contains(&format)
    }
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Upload relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("File format '{format}' is not allowed. Allowed formats: {}", .allowed.join(", "))]
    UnsupportedFormat {
        format: String,
        allowed: &'static [&'static str],
    },

    #[error("File too large ({size} bytes). Maximum size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("File is not a valid {format} image")]
    InvalidImage {
        format: String,
        #[source]
        source: image::ImageError,
    },

    #[error("upload backend failed: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Delegates file storage and URL issuance to a provider.
#[async_trait]
pub trait UploadRelay: Send + Sync {
    /// Store `file` under `profile`, returning its identifier and public URL.
    async fn upload(
        &self,
        profile: &UploadProfile,
        file: IncomingFile,
    ) -> Result<StoredImage, RelayError>;

    /// Remove a previously stored file by its identifier.
    async fn destroy(&self, storage_id: &str) -> anyhow::Result<()>;
}

/// Work out the file format from its content, falling back to the extension.
pub fn detect_format(file: &IncomingFile) -> String {
    if let Some(kind) = infer::get(&file.data) {
        return kind.extension().to_string();
    }
    std::path::Path::new(&file.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Check size and format against the profile. Returns the detected format.
pub fn validate(profile: &UploadProfile, file: &IncomingFile) -> Result<String, RelayError> {
    if file.data.len() > MAX_FILE_SIZE {
        return Err(RelayError::TooLarge {
            size: file.data.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let format = detect_format(file);
    if !profile.allows(&format) {
        return Err(RelayError::UnsupportedFormat {
            format,
            allowed: profile.allowed_formats,
        });
    }
    Ok(format)
}

fn raster_format(format: &str) -> Option<ImageFormat> {
    match format {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "gif" => Some(ImageFormat::Gif),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Scale an image down to fit within `max_w` x `max_h`, keeping its aspect
/// ratio. Images already inside the box are returned untouched.
///
/// Bytes that do not decode as `format` are the client's fault and come back
/// as [`RelayError::InvalidImage`].
pub fn limit_image(
    data: Vec<u8>,
    format: ImageFormat,
    max_w: u32,
    max_h: u32,
) -> Result<Vec<u8>, RelayError> {
    let img = image::load_from_memory_with_format(&data, format).map_err(|source| {
        RelayError::InvalidImage {
            format: format.extensions_str().first().copied().unwrap_or("image").to_string(),
            source,
        }
    })?;
    if img.width() <= max_w && img.height() <= max_h {
        return Ok(data);
    }

    let resized = img.resize(max_w, max_h, FilterType::Lanczos3);
    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, format)
        .context("failed to encode resized image")
        .map_err(RelayError::Backend)?;
    Ok(buf.into_inner())
}

/// Relay backed by a [`FileStorage`] (local disk or S3). The bounding-box
/// limit is applied in-process before the bytes are written.
pub struct StorageRelay {
    storage: Arc<dyn FileStorage>,
}

impl StorageRelay {
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UploadRelay for StorageRelay {
    async fn upload(
        &self,
        profile: &UploadProfile,
        file: IncomingFile,
    ) -> Result<StoredImage, RelayError> {
        let format = validate(profile, &file)?;
        let IncomingFile { filename, data, .. } = file;

        let data = match (profile.limit, raster_format(&format)) {
            (Some((max_w, max_h)), Some(image_format)) => {
                tokio::task::spawn_blocking(move || limit_image(data, image_format, max_w, max_h))
                    .await
                    .context("image processing task panicked")
                    .map_err(RelayError::Backend)??
            }
            _ => data,
        };

        let uri = self.storage.generate_uri(&profile.folder(), &filename);
        self.storage
            .write(&uri, &data)
            .await
            .map_err(RelayError::Backend)?;

        debug!(uri = %uri, profile = profile.name, size = data.len(), "upload stored");
        Ok(StoredImage {
            url: self.storage.public_url(&uri),
            filename: uri,
        })
    }

    async fn destroy(&self, storage_id: &str) -> anyhow::Result<()> {
        self.storage.delete(storage_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn incoming(filename: &str, data: Vec<u8>) -> IncomingFile {
        IncomingFile {
            filename: filename.to_string(),
            content_type: None,
            data,
        }
    }

    #[test]
    fn format_sniffed_from_content_before_extension() {
        assert_eq!(detect_format(&incoming("photo.gif", png(2, 2))), "png");
        assert_eq!(detect_format(&incoming("Logo.SVG", b"<svg/>".to_vec())), "svg");
        assert_eq!(detect_format(&incoming("noext", b"???".to_vec())), "");
    }

    #[test]
    fn profile_rules() {
        assert!(validate(&UploadProfile::BLOGS, &incoming("a.png", png(2, 2))).is_ok());
        assert!(matches!(
            validate(&UploadProfile::BLOGS, &incoming("cert.pdf", b"%PDF-1.4\n".to_vec())),
            Err(RelayError::UnsupportedFormat { .. })
        ));
        assert_eq!(
            validate(&UploadProfile::CERTIFICATES, &incoming("cert.pdf", b"%PDF-1.4\n".to_vec()))
                .unwrap(),
            "pdf"
        );
        assert!(validate(&UploadProfile::SPONSORS, &incoming("logo.svg", b"<svg/>".to_vec())).is_ok());
        assert!(validate(&UploadProfile::PHOTOS, &incoming("logo.svg", b"<svg/>".to_vec())).is_err());
    }

    #[test]
    fn oversized_upload_rejected() {
        let file = incoming("big.png", vec![0u8; MAX_FILE_SIZE + 1]);
        assert!(matches!(
            validate(&UploadProfile::PHOTOS, &file),
            Err(RelayError::TooLarge { .. })
        ));
    }

    #[test]
    fn unsupported_format_message_lists_allowed() {
        let err = RelayError::UnsupportedFormat {
            format: "exe".to_string(),
            allowed: UploadProfile::BLOGS.allowed_formats,
        };
        assert_eq!(
            err.to_string(),
            "File format 'exe' is not allowed. Allowed formats: jpg, jpeg, png, gif, webp"
        );
    }

    #[test]
    fn limit_scales_down_preserving_aspect() {
        let out = limit_image(png(2400, 630), ImageFormat::Png, 1200, 630).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (1200, 315));
    }

    #[test]
    fn limit_leaves_small_images_alone() {
        let original = png(300, 200);
        let out = limit_image(original.clone(), ImageFormat::Png, 1200, 630).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn limit_applies_to_gif() {
        let img = DynamicImage::new_rgba8(200, 100);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Gif).unwrap();

        let out = limit_image(buf.into_inner(), ImageFormat::Gif, 100, 100).unwrap();
        let resized = image::load_from_memory_with_format(&out, ImageFormat::Gif).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn folders_are_prefixed() {
        assert_eq!(UploadProfile::BLOGS.folder(), "electrolyte/blogs");
        assert_eq!(UploadProfile::SPONSORS.folder(), "electrolyte/sponsors");
    }

    #[tokio::test]
    async fn storage_relay_writes_and_destroys() {
        let dir = std::env::temp_dir().join(format!("electrolyte-relay-{}", uuid::Uuid::now_v7()));
        let storage = Arc::new(super::super::LocalFileStorage::new(&dir, "/files"));
        let relay = StorageRelay::new(storage);

        let stored = relay
            .upload(&UploadProfile::BLOGS, incoming("wide.png", png(2400, 1260)))
            .await
            .unwrap();
        assert!(stored.filename.starts_with("local://electrolyte/blogs/"));
        assert!(stored.url.starts_with("/files/electrolyte/blogs/"));

        let path = dir.join(stored.filename.strip_prefix("local://").unwrap());
        let written = image::open(&path).unwrap();
        assert_eq!(written.dimensions(), (1200, 630));

        relay.destroy(&stored.filename).await.unwrap();
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn storage_relay_rejects_undecodable_image() {
        let dir = std::env::temp_dir().join(format!("electrolyte-relay-{}", uuid::Uuid::now_v7()));
        let storage = Arc::new(super::super::LocalFileStorage::new(&dir, "/files"));
        let relay = StorageRelay::new(storage);

        let err = relay
            .upload(
                &UploadProfile::BLOGS,
                incoming("board.jpg", b"not really a jpeg".to_vec()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidImage { .. }), "{err:?}");
        assert_eq!(err.to_string(), "File is not a valid jpg image");
        assert!(!dir.exists());
    }
}
