//! Contact form routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::content::{ContactForm, SideEffect};
use crate::error::{AppError, AppResult};
use crate::middleware::AdminIdentity;
use crate::models::ContactSubmission;
use crate::state::AppState;

const SUBMITTED: &str = "Contact form submitted successfully";
const SAVED_WITHOUT_EMAIL: &str =
    "Form saved but email notification failed. We'll still get back to you!";

/// Create the contact router.
pub fn router() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact).get(list_contacts))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContactRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    subject: Option<String>,
    message: Option<String>,
}

impl From<ContactRequest> for ContactForm {
    fn from(req: ContactRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            company: req.company,
            subject: req.subject,
            message: req.message,
        }
    }
}

/// POST /api/contact
///
/// The submission is stored first. A failed or unconfigured notification
/// email still answers 200, with an advisory message.
async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let outcome = state.contacts().submit(request.into()).await?;

    let message = match outcome.side_effect {
        SideEffect::Completed => SUBMITTED,
        SideEffect::Skipped | SideEffect::Failed(_) => SAVED_WITHOUT_EMAIL,
    };
    Ok(Json(json!({ "message": message })))
}

/// GET /api/contact
async fn list_contacts(
    _admin: AdminIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ContactSubmission>>> {
    Ok(Json(state.contacts().list().await?))
}
