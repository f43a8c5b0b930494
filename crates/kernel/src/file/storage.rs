//! Object storage backends for the storage-backed upload relay.
//!
//! Provides a trait and implementations for storing files locally or in S3.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::sanitize_filename;

/// File storage backend trait.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write data to storage at the given URI.
    async fn write(&self, uri: &str, data: &[u8]) -> Result<()>;

    /// Delete a file from storage.
    async fn delete(&self, uri: &str) -> Result<()>;

    /// Get the public URL for a file.
    fn public_url(&self, uri: &str) -> String;

    /// Get the storage scheme (e.g., "local", "s3").
    fn scheme(&self) -> &'static str;

    /// Generate a fresh storage URI for a file under `folder`.
    fn generate_uri(&self, folder: &str, filename: &str) -> String {
        format!(
            "{}://{}/{}_{}",
            self.scheme(),
            folder.trim_matches('/'),
            uuid::Uuid::now_v7().simple(),
            sanitize_filename(filename)
        )
    }
}

/// Local filesystem storage.
pub struct LocalFileStorage {
    /// Base path for file storage.
    base_path: PathBuf,
    /// Base URL for public file access.
    base_url: String,
}

impl LocalFileStorage {
    /// Create a new local file storage.
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    /// Parse a local:// URI to get the on-disk path.
    ///
    /// Rejects paths containing `..` components.
    fn parse_uri(&self, uri: &str) -> Result<PathBuf> {
        let path = uri
            .strip_prefix("local://")
            .context("invalid local URI, must start with local://")?;
        for component in std::path::Path::new(path).components() {
            if matches!(component, std::path::Component::ParentDir) {
                anyhow::bail!("directory traversal not allowed in storage URI");
            }
        }
        Ok(self.base_path.join(path))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write(&self, uri: &str, data: &[u8]) -> Result<()> {
        let path = self.parse_uri(uri)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create directories")?;
        }

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create file")?;
        file.write_all(data).await.context("failed to write file")?;
        file.flush().await.context("failed to flush file")?;

        debug!(uri = %uri, path = ?path, size = data.len(), "file written");
        Ok(())
    }

    async fn delete(&self, uri: &str) -> Result<()> {
        let path = self.parse_uri(uri)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path)
                .await
                .context("failed to delete file")?;
            debug!(uri = %uri, "file deleted");
        } else {
            warn!(uri = %uri, "file not found for deletion");
        }

        Ok(())
    }

    fn public_url(&self, uri: &str) -> String {
        let path = uri.strip_prefix("local://").unwrap_or(uri);
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFileStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// S3-compatible object storage.
#[cfg(feature = "s3")]
pub struct S3FileStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Optional prefix for all keys.
    prefix: Option<String>,
    /// Base URL for public access (e.g., CloudFront distribution).
    base_url: String,
}

#[cfg(feature = "s3")]
impl S3FileStorage {
    /// Create a new S3 file storage.
    ///
    /// Uses the default AWS credential chain. `endpoint_url` selects an
    /// S3-compatible service such as MinIO.
    pub async fn new(
        endpoint_url: Option<&str>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let mut loader = aws_config::from_env();
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.into(),
            prefix,
            base_url: base_url.into(),
        }
    }

    /// Parse an s3:// URI to get the S3 key.
    fn parse_uri(&self, uri: &str) -> Result<String> {
        let path = uri
            .strip_prefix("s3://")
            .context("invalid S3 URI, must start with s3://")?;

        match &self.prefix {
            Some(prefix) => Ok(format!("{}/{}", prefix.trim_end_matches('/'), path)),
            None => Ok(path.to_string()),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl FileStorage for S3FileStorage {
    async fn write(&self, uri: &str, data: &[u8]) -> Result<()> {
        let key = self.parse_uri(uri)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .context("failed to upload to S3")?;

        debug!(uri = %uri, key = %key, size = data.len(), "file written to S3");
        Ok(())
    }

    async fn delete(&self, uri: &str) -> Result<()> {
        let key = self.parse_uri(uri)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .context("failed to delete from S3")?;

        debug!(uri = %uri, "file deleted from S3");
        Ok(())
    }

    fn public_url(&self, uri: &str) -> String {
        let path = uri.strip_prefix("s3://").unwrap_or(uri);
        match &self.prefix {
            Some(prefix) => format!(
                "{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                prefix.trim_end_matches('/'),
                path
            ),
            None => format!("{}/{}", self.base_url.trim_end_matches('/'), path),
        }
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

#[cfg(feature = "s3")]
impl std::fmt::Debug for S3FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FileStorage")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_uri_lives_under_folder() {
        let storage = LocalFileStorage::new("/tmp/uploads", "/files");
        let uri = storage.generate_uri("electrolyte/blogs", "Board Photo.JPG");

        assert!(uri.starts_with("local://electrolyte/blogs/"));
        assert!(uri.ends_with("_Board_Photo.JPG"));
    }

    #[test]
    fn generated_uris_are_distinct_within_a_millisecond() {
        let storage = LocalFileStorage::new("/tmp/uploads", "/files");
        let uris: std::collections::HashSet<String> = (0..1000)
            .map(|_| storage.generate_uri("electrolyte/blogs", "photo.png"))
            .collect();

        assert_eq!(uris.len(), 1000);
    }

    #[test]
    fn public_url_joins_base() {
        let storage = LocalFileStorage::new("/tmp/uploads", "https://example.com/files/");
        let url = storage.public_url("local://electrolyte/blogs/abc_test.jpg");

        assert_eq!(url, "https://example.com/files/electrolyte/blogs/abc_test.jpg");
    }

    #[test]
    fn parse_uri_rejects_traversal() {
        let storage = LocalFileStorage::new("/tmp/uploads", "/files");
        assert!(storage.parse_uri("local://../etc/passwd").is_err());
        assert!(storage.parse_uri("s3://bucket/key").is_err());
        assert_eq!(
            storage.parse_uri("local://electrolyte/a.png").unwrap(),
            PathBuf::from("/tmp/uploads/electrolyte/a.png")
        );
    }

    #[tokio::test]
    async fn write_then_delete_round_trip_on_disk() {
        let dir = std::env::temp_dir().join(format!("electrolyte-{}", uuid::Uuid::now_v7()));
        let storage = LocalFileStorage::new(&dir, "/files");
        let uri = storage.generate_uri("electrolyte/photos", "a.png");

        storage.write(&uri, b"png-bytes").await.unwrap();
        let on_disk = storage.parse_uri(&uri).unwrap();
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"png-bytes");

        storage.delete(&uri).await.unwrap();
        assert!(!on_disk.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
