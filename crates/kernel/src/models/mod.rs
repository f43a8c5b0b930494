//! Content records and their create/update inputs.

pub mod blog;
pub mod certificate;
pub mod contact;

pub use blog::{BlogFilter, BlogPost, BlogStatus, CreateBlogPost, UpdateBlogPost, parse_tags};
pub use certificate::{Certificate, CreateCertificate, UpdateCertificate};
pub use contact::{ContactSubmission, CreateContact};

use serde::{Deserialize, Serialize};

/// Reference to an image held by the upload relay.
///
/// `filename` is the storage-side identifier used to purge the image later;
/// `url` is the public address handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}
