//! Document model and DTOs.

use chrono::NaiveDate;
use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::double_option;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub document_type: String,
    pub reference_number: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub source_url: Option<String>,
    pub status: String,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a document. `slug` is generated from `title` when absent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocument {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    pub slug: Option<String>,
    pub document_type: String,
    #[validate(length(max = 200))]
    pub reference_number: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[validate(url)]
    pub source_url: Option<String>,
    /// Defaults to `draft`.
    pub status: Option<String>,
}

/// DTO for updating a document. Only non-`None` fields are applied.
///
/// The nullable fields distinguish an absent key from an explicit `null`,
/// which clears the column.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDocument {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub document_type: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default, deserialize_with = "double_option")]
    pub reference_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub publication_date: Option<Option<NaiveDate>>,
    #[validate(url)]
    #[serde(default, deserialize_with = "double_option")]
    pub source_url: Option<Option<String>>,
    pub status: Option<String>,
}

/// Query parameters for `GET /api/v1/documents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentListParams {
    pub status: Option<String>,
    pub document_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
