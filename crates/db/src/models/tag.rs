//! Tag and taggable models and DTOs.

use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub usage_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Lightweight tag info returned when listing tags for an entity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagInfo {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

/// DTO for applying or replacing the tags of an entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyTagsRequest {
    /// Tag names. New tags are created on first use.
    pub tag_names: Vec<String>,
}

/// DTO for renaming a tag.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTag {
    pub name: String,
}

/// Query parameters for `GET /api/v1/tags`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /api/v1/tags/suggest`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagSuggestParams {
    pub prefix: String,
    pub limit: Option<i64>,
}
