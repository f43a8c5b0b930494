//! Image uploads.
//!
//! Uploaded files are validated against an [`UploadProfile`] and relayed to
//! Cloudinary or to object storage (local disk, S3).

pub mod cloudinary;
pub mod relay;
pub mod storage;

use std::path::Path;

pub use cloudinary::CloudinaryRelay;
pub use relay::{
    IncomingFile, MAX_FILE_SIZE, RelayError, StorageRelay, UploadProfile, UploadRelay,
};
pub use storage::{FileStorage, LocalFileStorage};

#[cfg(feature = "s3")]
pub use storage::S3FileStorage;

/// Sanitize a filename for storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Take only the final path component
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(200)
        .collect()
}
