//! Outbound integrations.

pub mod email;
