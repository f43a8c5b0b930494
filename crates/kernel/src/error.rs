//! Application error types.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::file::RelayError;
use crate::middleware::AuthError;
use crate::store::StoreError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("store error")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::UnsupportedFormat { .. } => Self::BadRequest(err.to_string()),
            RelayError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            RelayError::InvalidImage { .. } => Self::BadRequest(err.to_string()),
            RelayError::Backend(e) => Self::Internal(e.context("upload relay failed")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Server-side failures are logged in full and reported vaguely.
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal server error");
                "Server error".to_string()
            }
            AppError::Store(e) => {
                tracing::error!(error = ?e, "store error");
                "Server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({ "message": message }));
        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("Not found"), StatusCode::NOT_FOUND),
            (AppError::bad_request("Title is required"), StatusCode::BAD_REQUEST),
            (
                AppError::Unauthorized(AuthError::MissingCredential),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Store(StoreError::SlugConflict("x".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn unauthorized_carries_challenge_header() {
        let response = AppError::Unauthorized(AuthError::InvalidCredential).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn relay_errors_map_to_client_errors() {
        let unsupported: AppError = RelayError::UnsupportedFormat {
            format: "exe".to_string(),
            allowed: &["png"],
        }
        .into();
        assert!(matches!(unsupported, AppError::BadRequest(_)));

        let undecodable: AppError = RelayError::InvalidImage {
            format: "jpg".to_string(),
            source: image::ImageError::IoError(std::io::ErrorKind::UnexpectedEof.into()),
        }
        .into();
        assert_eq!(undecodable.into_response().status(), StatusCode::BAD_REQUEST);

        let too_large: AppError = RelayError::TooLarge { size: 11, max: 10 }.into();
        assert!(matches!(too_large, AppError::PayloadTooLarge(_)));
    }
}
