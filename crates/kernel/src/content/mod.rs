//! Content operations.
//!
//! This module provides:
//! - Slug derivation and allocation for blog posts
//! - BlogService, CertificateService, ContactService over the content store
//! - SideEffect/Outcome for best-effort secondary actions
//! - Sample data for `seed-blogs`

pub mod blog_service;
pub mod certificate_service;
pub mod contact_service;
pub mod seed;
pub mod side_effect;
pub mod slug;

pub use blog_service::{BlogService, BlogSubmission};
pub use certificate_service::{CertificateService, CertificateSubmission};
pub use contact_service::{ContactForm, ContactNotifier, ContactService};
pub use side_effect::{Outcome, SideEffect};
