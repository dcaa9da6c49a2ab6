//! Article version model and DTOs.
//!
//! Versions carry a half-open validity interval `[valid_from, valid_until)`.
//! The `embedding` vector and `search_vector` columns are never selected
//! into this struct.

use mibeko_core::types::{DbId, Timestamp};
use mibeko_core::versioning::{EditMode, ValidityPeriod, Versioned};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `article_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleVersion {
    pub id: DbId,
    pub article_id: DbId,
    pub content: String,
    pub content_hash: String,
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
    pub amending_document_id: Option<DbId>,
    pub embedding_model: Option<String>,
    pub embedded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ArticleVersion {
    pub fn is_current(&self) -> bool {
        self.valid_until.is_none()
    }
}

impl Versioned for ArticleVersion {
    fn validity(&self) -> ValidityPeriod {
        ValidityPeriod {
            valid_from: self.valid_from,
            valid_until: self.valid_until,
        }
    }
}

/// Values for inserting a version row.
#[derive(Debug, Clone)]
pub struct NewArticleVersion<'a> {
    pub content: &'a str,
    pub valid_from: Timestamp,
    pub amending_document_id: Option<DbId>,
}

/// DTO for `PUT /articles/{id}/content`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveContentRequest {
    pub content: String,
    #[serde(default)]
    pub mode: EditMode,
    /// Effective instant of a new version. Defaults to now. Ignored in place.
    pub valid_from: Option<Timestamp>,
    pub amending_document_id: Option<DbId>,
}

/// DTO for `POST /articles/{id}/repeal`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepealRequest {
    /// Instant at which the article stops being in force. Defaults to now.
    pub at: Option<Timestamp>,
}

/// Query parameters for `GET /articles/{id}/versions/active`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveVersionParams {
    pub at: Option<Timestamp>,
}

/// Text needed to embed one version.
#[derive(Debug, Clone, FromRow)]
pub struct VersionEmbeddingSource {
    pub version_id: DbId,
    pub content: String,
    pub content_hash: String,
    pub article_number: String,
    pub document_title: String,
}

/// Result of a content save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub version: ArticleVersion,
    /// `false` when an in-place save found identical content.
    pub changed: bool,
}
