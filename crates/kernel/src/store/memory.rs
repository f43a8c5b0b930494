//! In-memory [`ContentStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{ContentStore, StoreError};
use crate::models::{
    BlogFilter, BlogPost, Certificate, ContactSubmission, CreateBlogPost, CreateCertificate,
    CreateContact, UpdateBlogPost, UpdateCertificate,
};

#[derive(Debug, Default)]
struct Tables {
    blogs: HashMap<Uuid, BlogPost>,
    certificates: HashMap<Uuid, Certificate>,
    contacts: Vec<ContactSubmission>,
}

impl Tables {
    fn slug_owner(&self, slug: &str) -> Option<Uuid> {
        self.blogs
            .values()
            .find(|b| b.slug == slug)
            .map(|b| b.id)
    }
}

/// In-memory [`ContentStore`] guarded by a single lock.
///
/// The slug check and the write happen under the same write guard, so the
/// unique-slug rule holds exactly as it does for the database index.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    tables: RwLock<Tables>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<BlogPost>, StoreError> {
        let mut blogs: Vec<BlogPost> = self
            .tables
            .read()
            .blogs
            .values()
            .filter(|b| b.matches(filter))
            .cloned()
            .collect();
        newest_first(&mut blogs, |b| (b.created_at, b.id));
        Ok(blogs)
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        Ok(self.tables.read().blogs.get(&id).cloned())
    }

    async fn find_blog_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        Ok(self
            .tables
            .read()
            .blogs
            .values()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.tables.read().slug_owner(slug).is_some())
    }

    async fn insert_blog(&self, input: CreateBlogPost) -> Result<BlogPost, StoreError> {
        let mut tables = self.tables.write();
        if tables.slug_owner(&input.slug).is_some() {
            return Err(StoreError::SlugConflict(input.slug));
        }
        let blog = BlogPost::from_input(input);
        tables.blogs.insert(blog.id, blog.clone());
        Ok(blog)
    }

    async fn update_blog(
        &self,
        id: Uuid,
        changes: UpdateBlogPost,
    ) -> Result<Option<BlogPost>, StoreError> {
        let mut tables = self.tables.write();
        if let Some(slug) = &changes.slug {
            if tables.slug_owner(slug).is_some_and(|owner| owner != id) {
                return Err(StoreError::SlugConflict(slug.clone()));
            }
        }
        let Some(blog) = tables.blogs.get_mut(&id) else {
            return Ok(None);
        };
        blog.apply(changes);
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        Ok(self.tables.write().blogs.remove(&id))
    }

    async fn list_certificates(
        &self,
        active: Option<bool>,
    ) -> Result<Vec<Certificate>, StoreError> {
        let mut certs: Vec<Certificate> = self
            .tables
            .read()
            .certificates
            .values()
            .filter(|c| active.is_none_or(|a| c.active == a))
            .cloned()
            .collect();
        certs.sort_by(Certificate::display_cmp);
        Ok(certs)
    }

    async fn find_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        Ok(self.tables.read().certificates.get(&id).cloned())
    }

    async fn insert_certificate(
        &self,
        input: CreateCertificate,
    ) -> Result<Certificate, StoreError> {
        let cert = Certificate::from_input(input);
        self.tables
            .write()
            .certificates
            .insert(cert.id, cert.clone());
        Ok(cert)
    }

    async fn update_certificate(
        &self,
        id: Uuid,
        changes: UpdateCertificate,
    ) -> Result<Option<Certificate>, StoreError> {
        let mut tables = self.tables.write();
        let Some(cert) = tables.certificates.get_mut(&id) else {
            return Ok(None);
        };
        cert.apply(changes);
        Ok(Some(cert.clone()))
    }

    async fn delete_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        Ok(self.tables.write().certificates.remove(&id))
    }

    async fn insert_contact(&self, input: CreateContact) -> Result<ContactSubmission, StoreError> {
        let contact = ContactSubmission::from_input(input);
        self.tables.write().contacts.push(contact.clone());
        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        let mut contacts = self.tables.read().contacts.clone();
        newest_first(&mut contacts, |c| (c.created_at, c.id));
        Ok(contacts)
    }

    async fn healthy(&self) -> bool {
        true
    }
}
