//! Certificate model.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoredImage;

/// Certificate record shown on the certifications page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: StoredImage,
    /// Display position; lower values sort first.
    pub order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    pub fn from_input(input: CreateCertificate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            image: input.image,
            order: input.order,
            active: input.active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: UpdateCertificate) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(image) = changes.image {
            self.image = image;
        }
        if let Some(order) = changes.order {
            self.order = order;
        }
        if let Some(active) = changes.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }

    /// Listing order: `order` ascending, then newest first.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone)]
pub struct CreateCertificate {
    pub name: String,
    pub description: String,
    pub image: StoredImage,
    pub order: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCertificate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<StoredImage>,
    pub order: Option<i32>,
    pub active: Option<bool>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cert(name: &str, order: i32) -> Certificate {
        Certificate::from_input(CreateCertificate {
            name: name.to_string(),
            description: String::new(),
            image: StoredImage {
                filename: format!("electrolyte/certificates/{name}"),
                url: format!("https://cdn.example.com/{name}.png"),
            },
            order,
            active: true,
        })
    }

    #[test]
    fn sorts_by_order_then_newest() {
        let first = cert("iso-9001", 0);
        let second = cert("ipc-a-610", 0);
        let last = cert("j-std-001", 5);

        let mut certs = vec![last.clone(), first.clone(), second.clone()];
        certs.sort_by(Certificate::display_cmp);

        // Same order: the later-created one comes first.
        assert_eq!(certs[0].name, "ipc-a-610");
        assert_eq!(certs[1].name, "iso-9001");
        assert_eq!(certs[2].name, "j-std-001");
    }

    #[test]
    fn apply_replaces_only_given_fields() {
        let mut c = cert("iso-9001", 2);
        c.apply(UpdateCertificate {
            active: Some(false),
            ..UpdateCertificate::default()
        });
        assert!(!c.active);
        assert_eq!(c.order, 2);
        assert_eq!(c.name, "iso-9001");
    }
}
