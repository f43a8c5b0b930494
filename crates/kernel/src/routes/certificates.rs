//! Certificate API routes.

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::multipart::FormData;
use super::{non_empty, parse_id};
use crate::content::CertificateSubmission;
use crate::error::{AppError, AppResult};
use crate::middleware::AdminIdentity;
use crate::models::Certificate;
use crate::state::AppState;

const NOT_FOUND: &str = "Certificate not found";

/// Create the certificate router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(list_certificates).post(create_certificate))
        .route(
            "/certificates/{id}",
            get(get_certificate)
                .put(update_certificate)
                .delete(delete_certificate),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    active: Option<String>,
}

fn certificate_id(raw: &str) -> AppResult<Uuid> {
    parse_id(raw).ok_or(AppError::NotFound(NOT_FOUND))
}

fn submission_from(mut form: FormData) -> CertificateSubmission {
    CertificateSubmission {
        image: form.take_file("image"),
        name: form.text("name"),
        description: form.text("description"),
        order: form.text("order"),
        active: form.text("active"),
    }
}

/// GET /api/certificates?active=true|false
async fn list_certificates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Certificate>>> {
    let active = non_empty(query.active).map(|a| a == "true");
    Ok(Json(state.certificates().list(active).await?))
}

/// GET /api/certificates/{id}
async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Certificate>> {
    let id = certificate_id(&id)?;
    Ok(Json(state.certificates().get(id).await?))
}

/// POST /api/certificates (multipart, required `image` file)
async fn create_certificate(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<Certificate>> {
    let form = FormData::read(multipart).await?;
    let certificate = state.certificates().create(submission_from(form)).await?;
    Ok(Json(certificate))
}

/// PUT /api/certificates/{id} (multipart, partial)
async fn update_certificate(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<Certificate>> {
    let id = certificate_id(&id)?;
    let form = FormData::read(multipart).await?;
    let outcome = state.certificates().update(id, submission_from(form)).await?;
    Ok(Json(outcome.value))
}

/// DELETE /api/certificates/{id}
async fn delete_certificate(
    _admin: AdminIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = certificate_id(&id)?;
    state.certificates().delete(id).await?;
    Ok(Json(json!({ "message": "Certificate deleted successfully" })))
}
