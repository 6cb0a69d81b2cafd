//! URL slugs for posts.
//!
//! [`generate_slug`] normalizes a title into `[a-z0-9-]` text and
//! [`ensure_unique`] appends `-1`, `-2`, ... until the caller's existence
//! probe reports a free candidate. The probe is best effort: the unique
//! index on `posts.slug` is what actually prevents duplicates.

use regex::Regex;
use sea_orm::DbErr;
use std::{future::Future, sync::LazyLock};

/// Highest numeric suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 1000;

/// Slugs are stored in a 255 character column; leave room for a suffix.
const MAX_BASE_LENGTH: usize = 240;

static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

#[derive(Debug, thiserror::Error)]
pub enum SlugError {
    #[error("Slug '{0}' must contain only lowercase letters, digits and single hyphens")]
    ValidationFailed(String),
    #[error("No free slug found for '{0}'")]
    Exhausted(String),
    #[error("Slug lookup failed")]
    Lookup(#[from] DbErr),
}

fn substitute(c: char) -> Option<&'static str> {
    let replacement = match c {
        'á' => "a",
        'é' => "e",
        'í' => "i",
        'ó' => "o",
        'ú' | 'ü' => "u",
        'ñ' => "n",
        '&' => "and",
        _ => return None,
    };
    Some(replacement)
}

/// Normalize free text into a URL-safe slug.
///
/// Returns an empty string when nothing usable remains (for example a title
/// made only of punctuation); callers must treat that as invalid input.
#[must_use]
pub fn generate_slug(title: &str) -> String {
    let mut kept = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if let Some(replacement) = substitute(c) {
            kept.push_str(replacement);
        } else if c.is_alphanumeric() || c == ' ' {
            kept.push(c);
        }
    }

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c == ' ' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    if slug.len() > MAX_BASE_LENGTH {
        slug.truncate(MAX_BASE_LENGTH);
    }
    slug.trim_matches('-').to_string()
}

/// Check a caller-supplied slug against `^[a-z0-9]+(-[a-z0-9]+)*$`.
///
/// # Errors
///
/// Returns [`SlugError::ValidationFailed`] when the shape does not match.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.len() <= MAX_BASE_LENGTH && SLUG_SHAPE.is_match(slug) {
        Ok(())
    } else {
        Err(SlugError::ValidationFailed(slug.to_string()))
    }
}

/// Find the first candidate among `base`, `base-1`, ..., `base-1000` that
/// `exists` reports as free.
///
/// # Errors
///
/// Propagates lookup failures and returns [`SlugError::Exhausted`] once every
/// suffix is taken.
pub async fn ensure_unique<F, Fut>(base: &str, mut exists: F) -> Result<String, SlugError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, DbErr>>,
{
    if !exists(base.to_string()).await? {
        return Ok(base.to_string());
    }

    for suffix in 1..=MAX_SUFFIX {
        let candidate = format!("{base}-{suffix}");
        if !exists(candidate.clone()).await? {
            tracing::debug!(base, candidate = %candidate, "Slug taken, using suffixed candidate");
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted(base.to_string()))
}
