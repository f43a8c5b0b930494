//! PostgreSQL [`ContentStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ContentStore, StoreError};
use crate::models::{
    BlogFilter, BlogPost, Certificate, ContactSubmission, CreateBlogPost, CreateCertificate,
    CreateContact, StoredImage, UpdateBlogPost, UpdateCertificate,
};

const BLOG_COLUMNS: &str = "id, title, slug, excerpt, content, featured_image_filename, \
    featured_image_url, source, status, category, tags, meta_title, meta_description, \
    meta_keywords, og_title, og_description, og_image, created_at, updated_at";

const CERTIFICATE_COLUMNS: &str =
    "id, name, description, image_filename, image_url, display_order, active, created_at, updated_at";

const CONTACT_COLUMNS: &str =
    "id, first_name, last_name, email, phone, company, subject, message, created_at";

/// Database row for blog_post.
#[derive(sqlx::FromRow)]
struct BlogRow {
    id: Uuid,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    featured_image_filename: Option<String>,
    featured_image_url: Option<String>,
    source: Option<String>,
    status: String,
    category: Option<String>,
    tags: Vec<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    og_title: Option<String>,
    og_description: Option<String>,
    og_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogRow> for BlogPost {
    fn from(row: BlogRow) -> Self {
        let featured_image = match (row.featured_image_filename, row.featured_image_url) {
            (Some(filename), Some(url)) => Some(StoredImage { filename, url }),
            _ => None,
        };
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            featured_image,
            source: row.source,
            // The CHECK constraint keeps this to draft/published.
            status: row.status.parse().unwrap_or_default(),
            category: row.category,
            tags: row.tags,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            meta_keywords: row.meta_keywords,
            og_title: row.og_title,
            og_description: row.og_description,
            og_image: row.og_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for certificate.
#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: Uuid,
    name: String,
    description: String,
    image_filename: String,
    image_url: String,
    display_order: i32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CertificateRow> for Certificate {
    fn from(row: CertificateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: StoredImage {
                filename: row.image_filename,
                url: row.image_url,
            },
            order: row.display_order,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for contact_submission.
#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    subject: Option<String>,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactSubmission {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            subject: row.subject,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

/// Map a write error, turning a unique-index violation into a slug conflict.
fn classify_slug_error(err: sqlx::Error, slug: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::SlugConflict(slug.to_string());
        }
    }
    StoreError::Database(err)
}

/// PostgreSQL-backed content store.
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_blog(&self, blog: &BlogPost) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE blog_post SET
                title = $1, slug = $2, excerpt = $3, content = $4,
                featured_image_filename = $5, featured_image_url = $6, source = $7,
                status = $8, category = $9, tags = $10, meta_title = $11,
                meta_description = $12, meta_keywords = $13, og_title = $14,
                og_description = $15, og_image = $16, updated_at = $17
            WHERE id = $18
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.slug)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(blog.featured_image.as_ref().map(|i| i.filename.as_str()))
        .bind(blog.featured_image.as_ref().map(|i| i.url.as_str()))
        .bind(&blog.source)
        .bind(blog.status.as_str())
        .bind(&blog.category)
        .bind(&blog.tags)
        .bind(&blog.meta_title)
        .bind(&blog.meta_description)
        .bind(&blog.meta_keywords)
        .bind(&blog.og_title)
        .bind(&blog.og_description)
        .bind(&blog.og_image)
        .bind(blog.updated_at)
        .bind(blog.id)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_slug_error(e, &blog.slug))?;

        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<BlogPost>, StoreError> {
        let mut query = format!("SELECT {BLOG_COLUMNS} FROM blog_post WHERE 1=1");
        let mut param_idx = 1;

        if filter.status.is_some() {
            query.push_str(&format!(" AND status = ${param_idx}"));
            param_idx += 1;
        }
        if filter.category.is_some() {
            query.push_str(&format!(" AND category = ${param_idx}"));
            param_idx += 1;
        }
        if filter.tag.is_some() {
            query.push_str(&format!(" AND ${param_idx} = ANY(tags)"));
        }
        query.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query_builder = sqlx::query_as::<_, BlogRow>(&query);
        if let Some(status) = filter.status {
            query_builder = query_builder.bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            query_builder = query_builder.bind(category);
        }
        if let Some(tag) = &filter.tag {
            query_builder = query_builder.bind(tag);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_post WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BlogPost::from))
    }

    async fn find_blog_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, StoreError> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_post WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BlogPost::from))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM blog_post WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn insert_blog(&self, input: CreateBlogPost) -> Result<BlogPost, StoreError> {
        let blog = BlogPost::from_input(input);

        sqlx::query(&format!(
            "INSERT INTO blog_post ({BLOG_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
        ))
        .bind(blog.id)
        .bind(&blog.title)
        .bind(&blog.slug)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(blog.featured_image.as_ref().map(|i| i.filename.as_str()))
        .bind(blog.featured_image.as_ref().map(|i| i.url.as_str()))
        .bind(&blog.source)
        .bind(blog.status.as_str())
        .bind(&blog.category)
        .bind(&blog.tags)
        .bind(&blog.meta_title)
        .bind(&blog.meta_description)
        .bind(&blog.meta_keywords)
        .bind(&blog.og_title)
        .bind(&blog.og_description)
        .bind(&blog.og_image)
        .bind(blog.created_at)
        .bind(blog.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_slug_error(e, &blog.slug))?;

        Ok(blog)
    }

    async fn update_blog(
        &self,
        id: Uuid,
        changes: UpdateBlogPost,
    ) -> Result<Option<BlogPost>, StoreError> {
        let Some(mut blog) = self.find_blog(id).await? else {
            return Ok(None);
        };
        blog.apply(changes);
        self.write_blog(&blog).await?;
        Ok(Some(blog))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<BlogPost>, StoreError> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            "DELETE FROM blog_post WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BlogPost::from))
    }

    async fn list_certificates(
        &self,
        active: Option<bool>,
    ) -> Result<Vec<Certificate>, StoreError> {
        let rows = match active {
            Some(active) => {
                sqlx::query_as::<_, CertificateRow>(&format!(
                    "SELECT {CERTIFICATE_COLUMNS} FROM certificate WHERE active = $1 \
                     ORDER BY display_order ASC, created_at DESC, id DESC"
                ))
                .bind(active)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CertificateRow>(&format!(
                    "SELECT {CERTIFICATE_COLUMNS} FROM certificate \
                     ORDER BY display_order ASC, created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Certificate::from).collect())
    }

    async fn find_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificate WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Certificate::from))
    }

    async fn insert_certificate(
        &self,
        input: CreateCertificate,
    ) -> Result<Certificate, StoreError> {
        let cert = Certificate::from_input(input);

        sqlx::query(&format!(
            "INSERT INTO certificate ({CERTIFICATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(cert.id)
        .bind(&cert.name)
        .bind(&cert.description)
        .bind(&cert.image.filename)
        .bind(&cert.image.url)
        .bind(cert.order)
        .bind(cert.active)
        .bind(cert.created_at)
        .bind(cert.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(cert)
    }

    async fn update_certificate(
        &self,
        id: Uuid,
        changes: UpdateCertificate,
    ) -> Result<Option<Certificate>, StoreError> {
        let Some(mut cert) = self.find_certificate(id).await? else {
            return Ok(None);
        };
        cert.apply(changes);

        sqlx::query(
            r#"
            UPDATE certificate SET
                name = $1, description = $2, image_filename = $3, image_url = $4,
                display_order = $5, active = $6, updated_at = $7
            WHERE id = $8
            "#,
        )
        .bind(&cert.name)
        .bind(&cert.description)
        .bind(&cert.image.filename)
        .bind(&cert.image.url)
        .bind(cert.order)
        .bind(cert.active)
        .bind(cert.updated_at)
        .bind(cert.id)
        .execute(&self.pool)
        .await?;

        Ok(Some(cert))
    }

    async fn delete_certificate(&self, id: Uuid) -> Result<Option<Certificate>, StoreError> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "DELETE FROM certificate WHERE id = $1 RETURNING {CERTIFICATE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Certificate::from))
    }

    async fn insert_contact(&self, input: CreateContact) -> Result<ContactSubmission, StoreError> {
        let contact = ContactSubmission::from_input(input);

        sqlx::query(&format!(
            "INSERT INTO contact_submission ({CONTACT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(contact.id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.subject)
        .bind(&contact.message)
        .bind(contact.created_at)
        .execute(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactSubmission>, StoreError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_submission ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ContactSubmission::from).collect())
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}
