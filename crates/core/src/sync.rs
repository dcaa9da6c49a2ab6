//! Offline sync feed cursors.
//!
//! The mobile app keeps the `next_since` value of its last pull and sends it
//! back as `since`. Rows with `updated_at > since` are returned; a full page
//! means more rows may be waiting.

use crate::types::Timestamp;

/// Default number of rows per entity kind in one sync page.
pub const DEFAULT_SYNC_LIMIT: i64 = 500;

/// Maximum number of rows per entity kind in one sync page.
pub const MAX_SYNC_LIMIT: i64 = 2000;

/// Compute the cursor for the next pull.
///
/// Returns the greatest `updated_at` among the returned rows, or the
/// incoming `since` when nothing changed.
pub fn next_cursor<I>(since: Option<Timestamp>, seen: I) -> Option<Timestamp>
where
    I: IntoIterator<Item = Timestamp>,
{
    seen.into_iter().fold(since, |acc, ts| match acc {
        Some(current) if current >= ts => Some(current),
        _ => Some(ts),
    })
}

/// Cursor for a page in which some entity lists may have been truncated.
///
/// `full_page_ends` holds the last `updated_at` of every list that filled its
/// page. The cursor never passes any of them; rows of other lists beyond it
/// are sent again on the next pull.
pub fn page_cursor<I, J>(since: Option<Timestamp>, seen: I, full_page_ends: J) -> Option<Timestamp>
where
    I: IntoIterator<Item = Timestamp>,
    J: IntoIterator<Item = Timestamp>,
{
    let cursor = next_cursor(since, seen);
    match full_page_ends.into_iter().min() {
        Some(cap) => cursor.map(|c| c.min(cap)),
        None => cursor,
    }
}

/// Whether any entity list filled its page, meaning the client must pull again.
pub fn has_more(page_sizes: &[usize], limit: i64) -> bool {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    page_sizes.iter().any(|&n| n >= limit)
}
