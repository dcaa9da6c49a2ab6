//! Article model and DTOs.

use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::article_version::ArticleVersion;
use super::double_option;
use super::tag::TagInfo;

/// A row from the `articles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: DbId,
    pub document_id: DbId,
    pub structure_node_id: Option<DbId>,
    pub number: String,
    pub sort_order: i32,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an article together with its first version.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateArticle {
    #[validate(length(min = 1, max = 100))]
    pub number: String,
    pub structure_node_id: Option<DbId>,
    pub sort_order: Option<i32>,
    #[validate(length(min = 1))]
    pub content: String,
    /// Start of the first version's validity. Defaults to now.
    pub valid_from: Option<Timestamp>,
    pub amending_document_id: Option<DbId>,
}

/// DTO for updating article metadata. Content changes go through
/// `PUT /articles/{id}/content`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArticle {
    pub number: Option<String>,
    /// `null` detaches the article from its node.
    #[serde(default, deserialize_with = "double_option")]
    pub structure_node_id: Option<Option<DbId>>,
    pub sort_order: Option<i32>,
}

/// Article with its current version and tags, as returned by `GET /articles/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub current_version: Option<ArticleVersion>,
    pub tags: Vec<TagInfo>,
}
