//! Content persistence.
//!
//! [`ContentStore`] is the single owner of blog posts, certificates, and
//! contact submissions. The PostgreSQL backend serves production; the
//! in-memory backend serves tests and local experiments.

pub mod memory;
pub mod postgres;

pub use memory::MemoryContentStore;
pub use postgres::PgContentStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    BlogFilter, BlogPost, Certificate, ContactSubmission, CreateBlogPost, CreateCertificate,
    CreateContact, UpdateBlogPost, UpdateCertificate,
};

/// Errors raised by a content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another post already owns this slug (unique index violation).
    #[error("slug {0:?} is already taken")]
    SlugConflict(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Persistence operations for all content records.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Slug uniqueness is enforced by the store itself: inserting or updating a
/// post onto a taken slug fails with [`StoreError::SlugConflict`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List posts passing `filter`, newest first.
    async fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<BlogPost>, StoreError>;

    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError>;

    async fn find_blog_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError>;

    async fn insert_blog(&self, input: CreateBlogPost) -> Result<BlogPost, StoreError>;

    /// Apply a partial update. Returns `None` if the post does not exist.
    async fn update_blog(
        &self,
        id: Uuid,
        changes: UpdateBlogPost,
    ) -> Result<Option<BlogPost>, StoreError>;

    /// Remove a post, returning the removed record.
    async fn delete_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError>;

    /// List certificates by display order, optionally filtered by active flag.
    async fn list_certificates(&self, active: Option<bool>)
    -> Result<Vec<Certificate>, StoreError>;

    async fn find_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError>;

    async fn insert_certificate(&self, input: CreateCertificate)
    -> Result<Certificate, StoreError>;

    async fn update_certificate(
        &self,
        id: Uuid,
        changes: UpdateCertificate,
    ) -> Result<Option<Certificate>, StoreError>;

    async fn delete_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError>;

    async fn insert_contact(&self, input: CreateContact) -> Result<ContactSubmission, StoreError>;

    /// All submissions, newest first.
    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError>;

    /// Whether the backing store is reachable.
    async fn healthy(&self) -> bool;
}
