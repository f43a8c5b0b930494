//! Blog API routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::multipart::FormData;
use super::{non_empty, parse_id};
use crate::content::BlogSubmission;
use crate::error::{AppError, AppResult};
use crate::middleware::AdminIdentity;
use crate::models::{BlogPost, BlogStatus};
use crate::state::AppState;

const NOT_FOUND: &str = "Not found";

/// Create the blog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_published).post(create_blog))
        // Static segment, matched ahead of the slug lookup below.
        .route("/blogs/admin", get(list_all))
        // GET takes a slug here; the write methods take a post id.
        .route(
            "/blogs/{id}",
            get(get_by_slug).put(update_blog).delete(delete_blog),
        )
        .route("/blogs/{id}/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
struct PublicListQuery {
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
}

fn blog_id(raw: &str) -> AppResult<Uuid> {
    parse_id(raw).ok_or(AppError::NotFound(NOT_FOUND))
}

fn submission_from(mut form: FormData) -> BlogSubmission {
    BlogSubmission {
        featured_image: form.take_file("featuredImage"),
        title: form.text("title"),
        slug: form.text("slug"),
        excerpt: form.text("excerpt"),
        content: form.text("content"),
        source: form.text("source"),
        status: form.text("status"),
        category: form.text("category"),
        tags: form.texts("tags"),
        meta_title: form.text("metaTitle"),
        meta_description: form.text("metaDescription"),
        meta_keywords: form.text("metaKeywords"),
        og_title: form.text("ogTitle"),
        og_description: form.text("ogDescription"),
        og_image: form.text("ogImage"),
    }
}

/// GET /api/blogs?category=&tag=
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<PublicListQuery>,
) -> AppResult<Json<Vec<BlogPost>>> {
    let blogs = state
        .blogs()
        .list_published(non_empty(query.category), non_empty(query.tag))
        .await?;
    Ok(Json(blogs))
}

/// GET /api/blogs/admin?status=
async fn list_all(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<Vec<BlogPost>>> {
    let status = match non_empty(query.status) {
        Some(s) => Some(
            s.parse::<BlogStatus>()
                .map_err(|e| AppError::bad_request(e.to_string()))?,
        ),
        None => None,
    };
    Ok(Json(state.blogs().list_all(status).await?))
}

/// GET /api/blogs/{slug}
async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(state.blogs().get_published(&slug).await?))
}

/// POST /api/blogs (multipart, optional `featuredImage` file)
async fn create_blog(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<BlogPost>> {
    let form = FormData::read(multipart).await?;
    let post = state.blogs().create(submission_from(form)).await?;
    Ok(Json(post))
}

/// PUT /api/blogs/{id} (multipart, partial)
async fn update_blog(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<BlogPost>> {
    let id = blog_id(&id)?;
    let form = FormData::read(multipart).await?;
    let post = state.blogs().update(id, submission_from(form)).await?;
    Ok(Json(post))
}

/// PATCH /api/blogs/{id}/status
async fn update_status(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> AppResult<Json<BlogPost>> {
    let id = blog_id(&id)?;
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let status = body.status.unwrap_or_default();
    Ok(Json(state.blogs().update_status(id, &status).await?))
}

/// DELETE /api/blogs/{id}
async fn delete_blog(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = blog_id(&id)?;
    state.blogs().delete(id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}
