//! Blog post operations.
//!
//! Wraps the content store with slug allocation, featured-image relay, and
//! best-effort image purging.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use super::side_effect::{Outcome, SideEffect};
use super::slug::{allocate_in, slugify};
use crate::error::{AppError, AppResult};
use crate::file::{IncomingFile, UploadProfile, UploadRelay};
use crate::models::blog::InvalidStatus;
use crate::models::{
    BlogFilter, BlogPost, BlogStatus, CreateBlogPost, StoredImage, UpdateBlogPost, parse_tags,
};
use crate::store::{ContentStore, StoreError};

/// Attempts at inserting a post before a persistent slug conflict is an error.
const MAX_SLUG_ATTEMPTS: usize = 5;

const NOT_FOUND: &str = "Not found";

/// Raw blog fields as submitted by the admin form.
///
/// `None` means the field was not supplied at all. `tags` holds every
/// submitted `tags` value before comma splitting.
#[derive(Debug, Clone, Default)]
pub struct BlogSubmission {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub featured_image: Option<IncomingFile>,
}

/// Service for blog post CRUD.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn ContentStore>,
    relay: Arc<dyn UploadRelay>,
}

impl BlogService {
    pub fn new(store: Arc<dyn ContentStore>, relay: Arc<dyn UploadRelay>) -> Self {
        Self { store, relay }
    }

    /// Published posts, newest first, optionally narrowed by category and tag.
    pub async fn list_published(
        &self,
        category: Option<String>,
        tag: Option<String>,
    ) -> AppResult<Vec<BlogPost>> {
        let filter = BlogFilter {
            status: Some(BlogStatus::Published),
            category,
            tag,
        };
        Ok(self.store.list_blogs(&filter).await?)
    }

    /// All posts for the admin panel, newest first.
    pub async fn list_all(&self, status: Option<BlogStatus>) -> AppResult<Vec<BlogPost>> {
        let filter = BlogFilter {
            status,
            ..BlogFilter::default()
        };
        Ok(self.store.list_blogs(&filter).await?)
    }

    /// A published post by slug. Drafts are reported as missing.
    pub async fn get_published(&self, slug: &str) -> AppResult<BlogPost> {
        self.store
            .find_blog_by_slug(slug)
            .await?
            .filter(BlogPost::is_published)
            .ok_or(AppError::NotFound(NOT_FOUND))
    }

    pub async fn create(&self, submission: BlogSubmission) -> AppResult<BlogPost> {
        let title = required_title(submission.title.as_deref())?;

        // A supplied slug that normalizes to nothing falls back to the title.
        let desired = submission
            .slug
            .as_deref()
            .filter(|s| !slugify(s).is_empty())
            .unwrap_or(title.as_str())
            .to_string();

        let featured_image = self.upload(submission.featured_image).await?;

        let mut input = CreateBlogPost {
            title,
            slug: String::new(),
            excerpt: submission.excerpt.unwrap_or_default(),
            content: submission.content.unwrap_or_default(),
            featured_image: featured_image.clone(),
            source: submission.source,
            status: submission
                .status
                .as_deref()
                .map(BlogStatus::from_submitted)
                .unwrap_or_default(),
            category: submission.category,
            tags: submission.tags.as_deref().map(parse_tags).unwrap_or_default(),
            meta_title: submission.meta_title,
            meta_description: submission.meta_description,
            meta_keywords: submission.meta_keywords,
            og_title: submission.og_title,
            og_description: submission.og_description,
            og_image: submission.og_image,
        };

        let result = self.insert_with_fresh_slug(&mut input, &desired).await;
        if result.is_err() {
            self.discard(featured_image.as_ref()).await;
        }
        let post = result?;

        info!(blog_id = %post.id, slug = %post.slug, status = %post.status, "blog post created");
        Ok(post)
    }

    async fn insert_with_fresh_slug(
        &self,
        input: &mut CreateBlogPost,
        desired: &str,
    ) -> AppResult<BlogPost> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            input.slug = allocate_in(self.store.as_ref(), desired).await?;
            match self.store.insert_blog(input.clone()).await {
                Ok(post) => return Ok(post),
                Err(StoreError::SlugConflict(slug)) => {
                    warn!(slug = %slug, attempt, "slug taken concurrently, reallocating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(anyhow!("no free slug for {desired:?} after {MAX_SLUG_ATTEMPTS} attempts").into())
    }

    /// Apply a partial update. Only supplied fields change.
    pub async fn update(&self, id: Uuid, submission: BlogSubmission) -> AppResult<BlogPost> {
        let current = self
            .store
            .find_blog(id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;

        let title = match submission.title.as_deref() {
            Some(t) => Some(required_title(Some(t))?),
            None => None,
        };

        // Re-resolve the slug only when its normalized form actually changes.
        let new_slug = submission
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty() && *s != current.slug);

        // The superseded image is left in place on the relay.
        let featured_image = self.upload(submission.featured_image).await?;

        let mut changes = UpdateBlogPost {
            title,
            slug: None,
            excerpt: submission.excerpt,
            content: submission.content,
            featured_image: featured_image.clone(),
            source: submission.source,
            status: submission.status.as_deref().map(BlogStatus::from_submitted),
            category: submission.category,
            tags: submission.tags.as_deref().map(parse_tags),
            meta_title: submission.meta_title,
            meta_description: submission.meta_description,
            meta_keywords: submission.meta_keywords,
            og_title: submission.og_title,
            og_description: submission.og_description,
            og_image: submission.og_image,
        };

        let result = self.update_with_slug(id, &mut changes, new_slug.as_deref()).await;
        if result.is_err() {
            self.discard(featured_image.as_ref()).await;
        }
        let post = result?;

        info!(blog_id = %post.id, slug = %post.slug, "blog post updated");
        Ok(post)
    }

    async fn update_with_slug(
        &self,
        id: Uuid,
        changes: &mut UpdateBlogPost,
        new_slug: Option<&str>,
    ) -> AppResult<BlogPost> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            if let Some(desired) = new_slug {
                changes.slug = Some(allocate_in(self.store.as_ref(), desired).await?);
            }
            match self.store.update_blog(id, changes.clone()).await {
                Ok(Some(post)) => return Ok(post),
                Ok(None) => return Err(AppError::NotFound(NOT_FOUND)),
                Err(StoreError::SlugConflict(slug)) if new_slug.is_some() => {
                    warn!(slug = %slug, attempt, "slug taken concurrently, reallocating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(anyhow!("no free slug for post {id} after {MAX_SLUG_ATTEMPTS} attempts").into())
    }

    /// Set the publication status. Only `draft` and `published` are accepted.
    pub async fn update_status(&self, id: Uuid, status: &str) -> AppResult<BlogPost> {
        let status: BlogStatus = status
            .parse()
            .map_err(|e: InvalidStatus| AppError::bad_request(e.to_string()))?;

        let post = self
            .store
            .update_blog(id, UpdateBlogPost::status(status))
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;

        info!(blog_id = %post.id, status = %post.status, "blog status changed");
        Ok(post)
    }

    /// Remove a post, then try to purge its featured image.
    pub async fn delete(&self, id: Uuid) -> AppResult<Outcome<BlogPost>> {
        let post = self
            .store
            .delete_blog(id)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;

        let purge = match &post.featured_image {
            Some(image) => SideEffect::record(
                "purge blog image",
                self.relay.destroy(&image.filename).await,
            ),
            None => SideEffect::Skipped,
        };

        info!(blog_id = %post.id, image_purge = %purge, "blog post deleted");
        Ok(Outcome::new(post, purge))
    }

    async fn upload(&self, file: Option<IncomingFile>) -> AppResult<Option<StoredImage>> {
        match file {
            Some(file) => Ok(Some(self.relay.upload(&UploadProfile::BLOGS, file).await?)),
            None => Ok(None),
        }
    }

    /// Drop an image uploaded for a write that did not go through.
    async fn discard(&self, image: Option<&StoredImage>) {
        if let Some(image) = image {
            SideEffect::record("discard orphaned upload", self.relay.destroy(&image.filename).await);
        }
    }
}

fn required_title(title: Option<&str>) -> AppResult<String> {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(AppError::bad_request("Title is required")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::file::RelayError;
    use crate::models::{
        Certificate, ContactSubmission, CreateCertificate, CreateContact, UpdateCertificate,
    };
    use crate::store::MemoryContentStore;

    struct NoRelay;

    #[async_trait]
    impl UploadRelay for NoRelay {
        async fn upload(
            &self,
            _profile: &UploadProfile,
            _file: IncomingFile,
        ) -> Result<StoredImage, RelayError> {
            Err(RelayError::Backend(anyhow!("no uploads in this test")))
        }

        async fn destroy(&self, _storage_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Reports every slug as free for the first `blind_probes` lookups, the
    /// way a concurrent writer can slip in between the probe and the insert.
    struct RacyStore {
        inner: MemoryContentStore,
        blind_probes: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for RacyStore {
        async fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<BlogPost>, StoreError> {
            self.inner.list_blogs(filter).await
        }
        async fn find_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
            self.inner.find_blog(id).await
        }
        async fn find_blog_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
            self.inner.find_blog_by_slug(slug).await
        }
        async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
            let blind = self
                .blind_probes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if blind {
                Ok(false)
            } else {
                self.inner.slug_exists(slug).await
            }
        }
        async fn insert_blog(&self, input: CreateBlogPost) -> Result<BlogPost, StoreError> {
            self.inner.insert_blog(input).await
        }
        async fn update_blog(
            &self,
            id: Uuid,
            changes: UpdateBlogPost,
        ) -> Result<Option<BlogPost>, StoreError> {
            self.inner.update_blog(id, changes).await
        }
        async fn delete_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
            self.inner.delete_blog(id).await
        }
        async fn list_certificates(
            &self,
            active: Option<bool>,
        ) -> Result<Vec<Certificate>, StoreError> {
            self.inner.list_certificates(active).await
        }
        async fn find_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
            self.inner.find_certificate(id).await
        }
        async fn insert_certificate(
            &self,
            input: CreateCertificate,
        ) -> Result<Certificate, StoreError> {
            self.inner.insert_certificate(input).await
        }
        async fn update_certificate(
            &self,
            id: Uuid,
            changes: UpdateCertificate,
        ) -> Result<Option<Certificate>, StoreError> {
            self.inner.update_certificate(id, changes).await
        }
        async fn delete_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
            self.inner.delete_certificate(id).await
        }
        async fn insert_contact(
            &self,
            input: CreateContact,
        ) -> Result<ContactSubmission, StoreError> {
            self.inner.insert_contact(input).await
        }
        async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError> {
            self.inner.list_contacts().await
        }
        async fn healthy(&self) -> bool {
            true
        }
    }

    fn service() -> (BlogService, Arc<RacyStore>) {
        let store = Arc::new(RacyStore {
            inner: MemoryContentStore::new(),
            blind_probes: AtomicUsize::new(0),
        });
        (BlogService::new(store.clone(), Arc::new(NoRelay)), store)
    }

    fn titled(title: &str) -> BlogSubmission {
        BlogSubmission {
            title: Some(title.to_string()),
            ..BlogSubmission::default()
        }
    }

    #[tokio::test]
    async fn store_conflict_triggers_reallocation() {
        let (blogs, store) = service();
        blogs.create(titled("Reflow Profiles")).await.unwrap();

        // The next probe misses the existing post, so the insert conflicts.
        store.blind_probes.store(1, Ordering::SeqCst);
        let second = blogs.create(titled("Reflow Profiles")).await.unwrap();
        assert_eq!(second.slug, "reflow-profiles-1");
    }

    #[tokio::test]
    async fn persistent_conflict_surfaces_as_server_error() {
        let (blogs, store) = service();
        blogs.create(titled("Conformal Coating")).await.unwrap();

        store.blind_probes.store(usize::MAX, Ordering::SeqCst);
        let err = blogs.create(titled("Conformal Coating")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn blank_title_rejected_on_create_and_update() {
        let (blogs, _) = service();
        let err = blogs.create(titled("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let post = blogs.create(titled("Via Repair")).await.unwrap();
        let err = blogs.update(post.id, titled("")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unchanged_slug_is_not_reallocated() {
        let (blogs, _) = service();
        let post = blogs.create(titled("Via Repair")).await.unwrap();

        let update = BlogSubmission {
            slug: Some("Via Repair".to_string()),
            excerpt: Some("Drilled and plated".to_string()),
            ..BlogSubmission::default()
        };
        let updated = blogs.update(post.id, update).await.unwrap();
        assert_eq!(updated.slug, "via-repair");
        assert_eq!(updated.excerpt, "Drilled and plated");
        assert_eq!(updated.title, "Via Repair");
    }
}
