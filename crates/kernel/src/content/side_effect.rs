//! Best-effort secondary actions and their reported outcome.

use std::fmt;

use tracing::warn;

/// What happened to a secondary action (image purge, notification email).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Completed,
    /// Nothing to do, or no backend configured for it.
    Skipped,
    Failed(String),
}

impl SideEffect {
    /// Record the result of `action`, logging failures at warn.
    pub fn record(action: &str, result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) => {
                warn!(action, error = %format!("{e:#}"), "side effect failed");
                Self::Failed(format!("{e:#}"))
            }
        }
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A primary result carried alongside its side-effect outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub side_effect: SideEffect,
}

impl<T> Outcome<T> {
    pub fn new(value: T, side_effect: SideEffect) -> Self {
        Self { value, side_effect }
    }
}
