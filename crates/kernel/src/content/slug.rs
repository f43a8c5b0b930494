//! Blog slug derivation and collision-free allocation.

use crate::store::{ContentStore, StoreError};

/// Base used when a title normalizes to nothing.
pub const FALLBACK_SLUG: &str = "post";

/// Maximum slug length before the collision suffix.
const MAX_SLUG_LEN: usize = 128;

/// Convert text into a URL-safe slug.
///
/// Lowercases, replaces every run of non-alphanumeric characters with a
/// single hyphen, and trims leading/trailing hyphens. Output only contains
/// `[a-z0-9-]`.
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_hyphen = true; // skips leading hyphens
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_was_hyphen = false;
        } else if !prev_was_hyphen {
            result.push('-');
            prev_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.len() > MAX_SLUG_LEN {
        // Pure ASCII, so byte slicing is safe. Break on a word boundary.
        let truncated = &result[..MAX_SLUG_LEN];
        return match truncated.rfind('-') {
            Some(last_hyphen) => truncated[..last_hyphen].to_string(),
            None => truncated.to_string(),
        };
    }

    result
}

/// Normalized base for `desired`, never empty.
pub fn base_slug(desired: &str) -> String {
    let base = slugify(desired);
    if base.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        base
    }
}

/// First unused slug among `base`, `base-1`, `base-2`, ...
///
/// `exists` is asked about each candidate in turn; there is no upper bound on
/// the number of probes.
pub async fn allocate<F, Fut, E>(desired: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let base = base_slug(desired);
    let mut candidate = base.clone();
    let mut n: u64 = 0;
    while exists(candidate.clone()).await? {
        n += 1;
        candidate = format!("{base}-{n}");
    }
    Ok(candidate)
}

/// [`allocate`] against the posts currently held by `store`.
pub async fn allocate_in(store: &dyn ContentStore, desired: &str) -> Result<String, StoreError> {
    allocate(desired, |candidate| async move { store.slug_exists(&candidate).await }).await
}
