//! Admin bearer authentication.
//!
//! Admin endpoints take an [`AdminIdentity`] argument. Extracting it reads
//! `Authorization: Bearer <token>` and hands the token to the configured
//! [`CredentialVerifier`]; any failure rejects the request with 401 before
//! the handler (or its body extractors) runs.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingCredential,

    #[error("Invalid token")]
    InvalidCredential,
}

/// The identity a verified credential maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
}

/// Verifies a presented bearer credential.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<AdminIdentity, AuthError>;
}

/// Verifier for a single shared admin secret.
pub struct StaticTokenVerifier {
    secret: String,
    identity: AdminIdentity,
}

impl StaticTokenVerifier {
    pub fn new(secret: impl Into<String>, admin_email: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            identity: AdminIdentity {
                email: admin_email.into(),
            },
        }
    }
}

impl std::fmt::Debug for StaticTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenVerifier")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialVerifier for StaticTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<AdminIdentity, AuthError> {
        if bool::from(credential.as_bytes().ct_eq(self.secret.as_bytes())) {
            Ok(self.identity.clone())
        } else {
            Err(AuthError::InvalidCredential)
        }
    }
}

/// Pull the bearer token out of the request headers.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        match state.verifier().verify(token).await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                debug!(path = %parts.uri.path(), "rejected admin credential");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/blogs/admin");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn static_verifier_accepts_exact_secret() {
        let verifier = StaticTokenVerifier::new("s3cret", "ops@example.com");
        let identity = verifier.verify("s3cret").await.unwrap();
        assert_eq!(identity.email, "ops@example.com");
    }

    #[tokio::test]
    async fn static_verifier_rejects_near_misses() {
        let verifier = StaticTokenVerifier::new("s3cret", "ops@example.com");
        for candidate in ["s3cre", "s3cret ", "S3CRET", ""] {
            assert_eq!(
                verifier.verify(candidate).await,
                Err(AuthError::InvalidCredential)
            );
        }
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Ok("abc"));
        assert_eq!(
            bearer_token(&parts_with(None)),
            Err(AuthError::MissingCredential)
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Basic abc"))),
            Err(AuthError::MissingCredential)
        );
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer   "))),
            Err(AuthError::MissingCredential)
        );
    }

    #[test]
    fn debug_output_hides_secret() {
        let verifier = StaticTokenVerifier::new("s3cret", "ops@example.com");
        assert!(!format!("{verifier:?}").contains("s3cret"));
    }
}
