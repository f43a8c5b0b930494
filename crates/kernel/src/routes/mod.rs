//! HTTP route handlers.

pub mod blogs;
pub mod certificates;
pub mod contact;
pub mod health;
pub mod multipart;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use uuid::Uuid;

use crate::file::MAX_FILE_SIZE;
use crate::state::AppState;

/// Room for form fields and multipart framing around a maximum-size file.
const BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

/// Build the application router: resource routes under `/api`, health at the root.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(blogs::router())
        .merge(certificates::router())
        .merge(contact::router());

    Router::new()
        .nest("/api", api)
        .merge(health::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Parse a record identifier. Malformed ids are indistinguishable from unknown ones.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// Treat an empty query parameter as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
