//! Blog post model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoredImage;

/// Publication status of a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

impl BlogStatus {
    /// Status for a value submitted through the create/update forms.
    ///
    /// Only the exact string `"published"` publishes; anything else is a draft.
    pub fn from_submitted(value: &str) -> Self {
        if value == "published" {
            Self::Published
        } else {
            Self::Draft
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is neither `draft` nor `published`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be 'draft' or 'published'")]
pub struct InvalidStatus;

impl FromStr for BlogStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(InvalidStatus),
        }
    }
}

/// Blog post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image: Option<StoredImage>,
    pub source: Option<String>,
    pub status: BlogStatus,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == BlogStatus::Published
    }

    /// Build a new record from create input, stamping id and timestamps.
    pub fn from_input(input: CreateBlogPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            slug: input.slug,
            excerpt: input.excerpt,
            content: input.content,
            featured_image: input.featured_image,
            source: input.source,
            status: input.status,
            category: input.category,
            tags: input.tags,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            meta_keywords: input.meta_keywords,
            og_title: input.og_title,
            og_description: input.og_description,
            og_image: input.og_image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update into this record.
    pub fn apply(&mut self, changes: UpdateBlogPost) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.title, changes.title);
        set(&mut self.slug, changes.slug);
        set(&mut self.excerpt, changes.excerpt);
        set(&mut self.content, changes.content);
        set_opt(&mut self.featured_image, changes.featured_image);
        set_opt(&mut self.source, changes.source);
        set(&mut self.status, changes.status);
        set_opt(&mut self.category, changes.category);
        set(&mut self.tags, changes.tags);
        set_opt(&mut self.meta_title, changes.meta_title);
        set_opt(&mut self.meta_description, changes.meta_description);
        set_opt(&mut self.meta_keywords, changes.meta_keywords);
        set_opt(&mut self.og_title, changes.og_title);
        set_opt(&mut self.og_description, changes.og_description);
        set_opt(&mut self.og_image, changes.og_image);
        self.updated_at = Utc::now();
    }

    /// Whether this post passes a list filter.
    pub fn matches(&self, filter: &BlogFilter) -> bool {
        filter.status.is_none_or(|s| s == self.status)
            && filter
                .category
                .as_deref()
                .is_none_or(|c| self.category.as_deref() == Some(c))
            && filter
                .tag
                .as_deref()
                .is_none_or(|t| self.tags.iter().any(|tag| tag == t))
    }
}

/// Input for creating a blog post. The slug is already allocated.
#[derive(Debug, Clone, Default)]
pub struct CreateBlogPost {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image: Option<StoredImage>,
    pub source: Option<String>,
    pub status: BlogStatus,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
}

/// Partial update for a blog post. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateBlogPost {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<StoredImage>,
    pub source: Option<String>,
    pub status: Option<BlogStatus>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
}

impl UpdateBlogPost {
    /// Status-only update used by the publish toggle.
    pub fn status(status: BlogStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Filters for listing blog posts. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub status: Option<BlogStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

/// Split free-text tag input into a clean tag list.
///
/// Every value is split on commas; entries are trimmed and empties dropped.
pub fn parse_tags<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
