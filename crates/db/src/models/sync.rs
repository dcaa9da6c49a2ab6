//! Offline sync feed DTOs.

use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

use super::article::Article;
use super::article_version::ArticleVersion;
use super::document::Document;
use super::structure_node::StructureNode;

/// Query parameters for `GET /api/v1/sync/changes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncParams {
    pub since: Option<Timestamp>,
    pub limit: Option<i64>,
}

/// Ids of rows soft-deleted after the cursor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncTombstones {
    pub documents: Vec<DbId>,
    pub articles: Vec<DbId>,
}

/// One page of the sync feed.
#[derive(Debug, Clone, Serialize)]
pub struct SyncChanges {
    pub documents: Vec<Document>,
    pub structure_nodes: Vec<StructureNode>,
    pub articles: Vec<Article>,
    pub versions: Vec<ArticleVersion>,
    pub deleted: SyncTombstones,
    pub server_time: Timestamp,
    pub next_since: Option<Timestamp>,
    pub has_more: bool,
}
