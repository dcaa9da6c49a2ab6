//! Structure node model and DTOs.

use std::collections::BTreeMap;

use mibeko_core::structure::{SyncNode, TreeItem};
use mibeko_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::double_option;

/// A row from the `structure_nodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StructureNode {
    pub id: DbId,
    pub document_id: DbId,
    pub parent_id: Option<DbId>,
    pub node_type: String,
    pub number: Option<String>,
    pub title: Option<String>,
    pub sort_order: i32,
    pub path: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TreeItem for StructureNode {
    fn id(&self) -> DbId {
        self.id
    }

    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

/// DTO for creating a single node.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStructureNode {
    pub parent_id: Option<DbId>,
    pub node_type: String,
    pub number: Option<String>,
    pub title: Option<String>,
    /// Defaults to after the last sibling.
    pub sort_order: Option<i32>,
}

/// DTO for updating a node's labels. Moving is a separate operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStructureNode {
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

/// DTO for `POST /nodes/{id}/move`. `parent_id: null` moves to the root.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveStructureNode {
    pub parent_id: Option<DbId>,
    pub sort_order: Option<i32>,
}

/// Where an article sits after a whole-structure sync.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticlePlacement {
    pub article_id: DbId,
    /// Key of the node in the same request, or `None` to detach.
    pub node_key: Option<String>,
    pub sort_order: Option<i32>,
}

/// DTO for `PUT /documents/{id}/structure`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncStructureRequest {
    pub nodes: Vec<SyncNode>,
    #[serde(default)]
    pub articles: Vec<ArticlePlacement>,
}

/// Result of a whole-structure sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStructureResult {
    /// Client key -> newly assigned node id.
    pub key_map: BTreeMap<String, DbId>,
    pub nodes: Vec<StructureNode>,
}
