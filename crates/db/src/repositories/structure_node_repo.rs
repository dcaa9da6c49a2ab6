//! Repository for the `structure_nodes` table.
//!
//! Nodes carry a materialized `path` of dot-joined ids. The path of a new
//! node depends on its own id, so inserts run in a transaction: insert,
//! then set the path.

use std::collections::{BTreeMap, HashMap, HashSet};

use mibeko_core::error::CoreError;
use mibeko_core::structure::{self, NodeType, MAX_DEPTH};
use mibeko_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::RepoResult;
use crate::models::structure_node::{
    CreateStructureNode, MoveStructureNode, StructureNode, SyncStructureRequest,
    SyncStructureResult, UpdateStructureNode,
};
use crate::repositories::DocumentRepo;

/// Column list shared across queries.
const COLUMNS: &str =
    "id, document_id, parent_id, node_type, number, title, sort_order, path, created_at, updated_at";

/// Predicate on `structure_nodes`: the owning document is not soft-deleted.
const IN_LIVE_DOCUMENT: &str = "EXISTS (SELECT 1 FROM documents d \
     WHERE d.id = structure_nodes.document_id AND d.deleted_at IS NULL)";

/// Provides tree operations for document structure nodes.
pub struct StructureNodeRepo;

impl StructureNodeRepo {
    /// Create a node under `input.parent_id` (or at the root).
    ///
    /// The parent must belong to `document_id`. Without an explicit
    /// `sort_order` the node is placed after its last sibling.
    pub async fn create(
        pool: &PgPool,
        document_id: DbId,
        node_type: NodeType,
        input: &CreateStructureNode,
    ) -> RepoResult<StructureNode> {
        let mut tx = pool.begin().await?;

        if !DocumentRepo::lock(&mut *tx, document_id).await? {
            return Err(CoreError::NotFound {
                entity: "Document",
                id: document_id,
            }
            .into());
        }

        let parent_path = match input.parent_id {
            Some(parent_id) => {
                let parent = Self::find_in_document(&mut *tx, document_id, parent_id).await?;
                if structure::depth(&parent.path) + 1 > MAX_DEPTH {
                    return Err(CoreError::Validation(format!(
                        "Structure nesting is limited to {MAX_DEPTH} levels"
                    ))
                    .into());
                }
                Some(parent.path)
            }
            None => None,
        };

        let node = Self::insert(
            &mut *tx,
            document_id,
            input.parent_id,
            parent_path.as_deref(),
            node_type,
            input.number.as_deref(),
            input.title.as_deref(),
            input.sort_order,
        )
        .await?;

        tx.commit().await?;
        Ok(node)
    }

    /// Find a node of a live document by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StructureNode>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM structure_nodes WHERE id = $1 AND {IN_LIVE_DOCUMENT}");
        sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every node of a document, parents before children.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<StructureNode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM structure_nodes
             WHERE document_id = $1
             ORDER BY array_length(string_to_array(path, '.'), 1), sort_order, id"
        );
        sqlx::query_as::<_, StructureNode>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Update a node's labels and sibling position.
    ///
    /// Returns `None` if the node does not exist or its document is deleted.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        node_type: Option<NodeType>,
        input: &UpdateStructureNode,
    ) -> Result<Option<StructureNode>, sqlx::Error> {
        let query = format!(
            "UPDATE structure_nodes SET
                node_type = COALESCE($2, node_type),
                number = CASE WHEN $3 THEN $4 ELSE number END,
                title = CASE WHEN $5 THEN $6 ELSE title END,
                sort_order = COALESCE($7, sort_order)
             WHERE id = $1 AND {IN_LIVE_DOCUMENT}
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .bind(node_type.map(|t| t.as_str()))
            .bind(input.number.is_some())
            .bind(input.number.clone().flatten())
            .bind(input.title.is_some())
            .bind(input.title.clone().flatten())
            .bind(input.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Move a node (and its subtree) under a new parent, or to the root.
    ///
    /// Rewrites the paths of the whole subtree in one statement. Moving a
    /// node under itself or one of its descendants is rejected.
    pub async fn move_node(
        pool: &PgPool,
        id: DbId,
        input: &MoveStructureNode,
    ) -> RepoResult<StructureNode> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM structure_nodes WHERE id = $1 AND {IN_LIVE_DOCUMENT} FOR UPDATE"
        );
        let node = sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "StructureNode",
                id,
            })?;

        let parent_path = match input.parent_id {
            Some(parent_id) => {
                Some(Self::find_in_document(&mut *tx, node.document_id, parent_id).await?.path)
            }
            None => None,
        };
        structure::validate_move(&node.path, parent_path.as_deref())?;

        let new_path = structure::child_path(parent_path.as_deref(), node.id);
        let subtree_depth: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(array_length(string_to_array(path, '.'), 1)), 0)
             FROM structure_nodes
             WHERE document_id = $1 AND (path = $2 OR path LIKE $2 || '.%')",
        )
        .bind(node.document_id)
        .bind(&node.path)
        .fetch_one(&mut *tx)
        .await?;
        let levels_below = (subtree_depth.max(0) as usize).saturating_sub(structure::depth(&node.path));
        if structure::depth(&new_path) + levels_below > MAX_DEPTH {
            return Err(CoreError::Validation(format!(
                "Structure nesting is limited to {MAX_DEPTH} levels"
            ))
            .into());
        }

        sqlx::query(
            "UPDATE structure_nodes
             SET path = $3 || substr(path, length($2) + 1)
             WHERE document_id = $1 AND (path = $2 OR path LIKE $2 || '.%')",
        )
        .bind(node.document_id)
        .bind(&node.path)
        .bind(&new_path)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE structure_nodes SET
                parent_id = $2,
                sort_order = COALESCE($3, (
                    SELECT COALESCE(MAX(s.sort_order) + 1, 0) FROM structure_nodes s
                    WHERE s.document_id = $4 AND s.parent_id IS NOT DISTINCT FROM $2 AND s.id <> $1
                ))
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let moved = sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .bind(input.parent_id)
            .bind(input.sort_order)
            .bind(node.document_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(node_id = id, from = %node.path, to = %moved.path, "Structure node moved");
        Ok(moved)
    }

    /// Delete a node and its subtree. Attached articles become unattached.
    ///
    /// Touches the owning document so sync clients refetch its tree.
    /// Returns `false` if the node does not exist or its document is deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "DELETE FROM structure_nodes WHERE id = $1 AND {IN_LIVE_DOCUMENT} RETURNING document_id"
        );
        let document_id: Option<DbId> = sqlx::query_scalar(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(document_id) = document_id else {
            return Ok(false);
        };
        DocumentRepo::touch(&mut *tx, document_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Replace a document's whole structure with the flat list in `request`.
    ///
    /// Every existing node is deleted and the new nodes are inserted
    /// parents-first. Articles lose their attachment unless `request.articles`
    /// places them on one of the new nodes.
    pub async fn sync_document(
        pool: &PgPool,
        document_id: DbId,
        request: &SyncStructureRequest,
    ) -> RepoResult<SyncStructureResult> {
        let plan = structure::plan_sync(&request.nodes)?;

        let known_keys: HashSet<&str> = request.nodes.iter().map(|n| n.key.as_str()).collect();
        for placement in &request.articles {
            if let Some(key) = placement.node_key.as_deref() {
                if !known_keys.contains(key) {
                    return Err(CoreError::Validation(format!(
                        "Article {} is placed on unknown node '{key}'",
                        placement.article_id
                    ))
                    .into());
                }
            }
        }

        let mut tx = pool.begin().await?;

        if !DocumentRepo::lock(&mut *tx, document_id).await? {
            return Err(CoreError::NotFound {
                entity: "Document",
                id: document_id,
            }
            .into());
        }

        sqlx::query("DELETE FROM structure_nodes WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        let mut key_map: BTreeMap<String, DbId> = BTreeMap::new();
        let mut paths: HashMap<DbId, String> = HashMap::new();

        for planned in &plan {
            let input = &request.nodes[planned.index];
            let parent_id = input.parent_key.as_ref().and_then(|k| key_map.get(k).copied());
            let parent_path = parent_id.and_then(|p| paths.get(&p).map(String::as_str));

            let node = Self::insert(
                &mut *tx,
                document_id,
                parent_id,
                parent_path,
                planned.node_type,
                input.number.as_deref(),
                input.title.as_deref(),
                Some(planned.sort_order),
            )
            .await?;

            paths.insert(node.id, node.path);
            key_map.insert(input.key.clone(), node.id);
        }

        for placement in &request.articles {
            let node_id = placement.node_key.as_ref().and_then(|k| key_map.get(k).copied());
            let result = sqlx::query(
                "UPDATE articles
                 SET structure_node_id = $2, sort_order = COALESCE($3, sort_order)
                 WHERE id = $1 AND document_id = $4 AND deleted_at IS NULL",
            )
            .bind(placement.article_id)
            .bind(node_id)
            .bind(placement.sort_order)
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CoreError::Validation(format!(
                    "Article {} does not belong to document {document_id}",
                    placement.article_id
                ))
                .into());
            }
        }

        DocumentRepo::touch(&mut *tx, document_id).await?;

        let query = format!(
            "SELECT {COLUMNS} FROM structure_nodes
             WHERE document_id = $1
             ORDER BY array_length(string_to_array(path, '.'), 1), sort_order, id"
        );
        let nodes = sqlx::query_as::<_, StructureNode>(&query)
            .bind(document_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            document_id,
            node_count = nodes.len(),
            placements = request.articles.len(),
            "Document structure replaced"
        );
        Ok(SyncStructureResult { key_map, nodes })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Fetch a node that must belong to `document_id`.
    pub(crate) async fn find_in_document(
        conn: &mut PgConnection,
        document_id: DbId,
        id: DbId,
    ) -> RepoResult<StructureNode> {
        let query = format!("SELECT {COLUMNS} FROM structure_nodes WHERE id = $1");
        let node = sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "StructureNode",
                id,
            })?;

        if node.document_id != document_id {
            return Err(CoreError::Validation(format!(
                "Structure node {id} belongs to another document"
            ))
            .into());
        }
        Ok(node)
    }

    /// Insert a node and set its path.
    #[allow(clippy::too_many_arguments)]
    async fn insert(
        conn: &mut PgConnection,
        document_id: DbId,
        parent_id: Option<DbId>,
        parent_path: Option<&str>,
        node_type: NodeType,
        number: Option<&str>,
        title: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<StructureNode, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO structure_nodes (document_id, parent_id, node_type, number, title, sort_order)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, (
                 SELECT COALESCE(MAX(sort_order) + 1, 0) FROM structure_nodes
                 WHERE document_id = $1 AND parent_id IS NOT DISTINCT FROM $2
             )))
             RETURNING id",
        )
        .bind(document_id)
        .bind(parent_id)
        .bind(node_type.as_str())
        .bind(number)
        .bind(title)
        .bind(sort_order)
        .fetch_one(&mut *conn)
        .await?;

        let query = format!("UPDATE structure_nodes SET path = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, StructureNode>(&query)
            .bind(id)
            .bind(structure::child_path(parent_path, id))
            .fetch_one(conn)
            .await
    }
}
