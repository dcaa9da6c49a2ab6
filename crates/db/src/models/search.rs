//! Search request parameters and result rows.

use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Query parameters for `GET /api/v1/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub document_id: Option<DbId>,
    /// Search the versions in force at this instant instead of current ones.
    pub at: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A ranked full-text hit.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchResultRow {
    pub article_id: DbId,
    pub version_id: DbId,
    pub document_id: DbId,
    pub document_title: String,
    pub article_number: String,
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
    pub rank: f32,
    pub headline: String,
}

/// Query parameters for `GET /api/v1/search/suggest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeaheadParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// A typeahead suggestion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TypeaheadResult {
    pub article_id: DbId,
    pub document_id: DbId,
    pub document_title: String,
    pub article_number: String,
    pub rank: f32,
}

/// Query parameters for `GET /api/v1/search/semantic`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticSearchParams {
    pub q: Option<String>,
    pub document_id: Option<DbId>,
    pub limit: Option<i64>,
}

/// A nearest-neighbour hit ranked by cosine similarity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SemanticResultRow {
    pub article_id: DbId,
    pub version_id: DbId,
    pub document_id: DbId,
    pub document_title: String,
    pub article_number: String,
    pub content: String,
    pub similarity: f64,
}

/// Query parameters for `POST /api/v1/admin/search/reindex`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReindexParams {
    pub article_id: Option<DbId>,
}

/// Result of a manual reindex.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexResult {
    pub versions_reindexed: u64,
}
