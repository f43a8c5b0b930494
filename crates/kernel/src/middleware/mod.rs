//! HTTP request guards.

pub mod admin_auth;

pub use admin_auth::{AdminIdentity, AuthError, CredentialVerifier, StaticTokenVerifier};
