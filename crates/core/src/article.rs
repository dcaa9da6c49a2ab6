//! Article numbering and content validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum length of an article number after normalization.
pub const MAX_NUMBER_LEN: usize = 50;

/// Maximum article content size in bytes (1 MiB).
pub const MAX_CONTENT_BYTES: usize = 1024 * 1024;

/// Leading "Article", "Art." or "Art" label, case-insensitive.
static ARTICLE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(article|art\.?)\s+").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize an article number as typed by a curator.
///
/// Strips a leading `Article` / `Art.` label and collapses whitespace, so
/// `"Art.  12 bis"` becomes `"12 bis"`. Returns a validation error if
/// nothing is left or the result is too long.
pub fn normalize_number(raw: &str) -> Result<String, CoreError> {
    let without_prefix = ARTICLE_PREFIX_RE.replace(raw, "");
    let normalized = WHITESPACE_RE
        .replace_all(without_prefix.trim(), " ")
        .into_owned();

    if normalized.is_empty() {
        return Err(CoreError::Validation(
            "Article number must not be empty".into(),
        ));
    }
    if normalized.chars().count() > MAX_NUMBER_LEN {
        return Err(CoreError::Validation(format!(
            "Article number must be at most {MAX_NUMBER_LEN} characters"
        )));
    }
    Ok(normalized)
}

/// Validate article content (non-blank, bounded size).
pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation(
            "Article content must not be empty".into(),
        ));
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(CoreError::Validation(format!(
            "Article content must be at most {MAX_CONTENT_BYTES} bytes"
        )));
    }
    Ok(())
}
