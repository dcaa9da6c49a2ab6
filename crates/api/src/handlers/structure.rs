//! Handlers for the structure tree of a document (books, titles, chapters,
//! sections...).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::error::CoreError;
use mibeko_core::structure::{build_tree, NodeType};
use mibeko_core::types::DbId;
use mibeko_db::models::structure_node::{
    CreateStructureNode, MoveStructureNode, SyncStructureRequest, UpdateStructureNode,
};
use mibeko_db::repositories::{ArticleRepo, DocumentRepo, StructureNodeRepo};

use super::documents::document_not_found;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Document-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/documents/{id}/structure
///
/// The document's nodes as a nested tree.
pub async fn get_structure(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_document(&state, document_id).await?;
    let nodes = StructureNodeRepo::list_by_document(&state.pool, document_id).await?;

    Ok(Json(DataResponse {
        data: build_tree(nodes),
    }))
}

/// PUT /api/v1/documents/{id}/structure
///
/// Replace the whole tree from a flat list of client-keyed nodes. Returns
/// the `key -> id` map and the new nodes.
pub async fn sync_structure(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
    Json(input): Json<SyncStructureRequest>,
) -> AppResult<impl IntoResponse> {
    let result = StructureNodeRepo::sync_document(&state.pool, document_id, &input).await?;

    tracing::info!(
        document_id,
        nodes = result.nodes.len(),
        placements = input.articles.len(),
        "Document structure replaced",
    );

    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/documents/{id}/nodes
pub async fn create_node(
    State(state): State<AppState>,
    Path(document_id): Path<DbId>,
    Json(input): Json<CreateStructureNode>,
) -> AppResult<impl IntoResponse> {
    let node_type = NodeType::parse(&input.node_type)?;
    let node = StructureNodeRepo::create(&state.pool, document_id, node_type, &input).await?;

    tracing::info!(document_id, node_id = node.id, path = %node.path, "Structure node created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

// ---------------------------------------------------------------------------
// Node-scoped
// ---------------------------------------------------------------------------

/// GET /api/v1/nodes/{id}
pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let node = StructureNodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(node_not_found(id))?;

    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/nodes/{id}
///
/// `number` and `title` may be set to `null` to clear them.
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStructureNode>,
) -> AppResult<impl IntoResponse> {
    let node_type = input.node_type.as_deref().map(NodeType::parse).transpose()?;
    let node = StructureNodeRepo::update(&state.pool, id, node_type, &input)
        .await?
        .ok_or(node_not_found(id))?;

    tracing::info!(node_id = id, "Structure node updated");

    Ok(Json(DataResponse { data: node }))
}

/// DELETE /api/v1/nodes/{id}
///
/// Deletes the subtree. Articles under it are detached, not deleted.
pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !StructureNodeRepo::delete(&state.pool, id).await? {
        return Err(node_not_found(id));
    }

    tracing::info!(node_id = id, "Structure node deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/nodes/{id}/move
pub async fn move_node(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveStructureNode>,
) -> AppResult<impl IntoResponse> {
    let node = StructureNodeRepo::move_node(&state.pool, id, &input).await?;

    tracing::info!(node_id = id, parent_id = ?node.parent_id, path = %node.path, "Structure node moved");

    Ok(Json(DataResponse { data: node }))
}

/// GET /api/v1/nodes/{id}/articles
pub async fn list_node_articles(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if StructureNodeRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(node_not_found(id));
    }
    let articles = ArticleRepo::list_by_node(&state.pool, id).await?;

    Ok(Json(DataResponse { data: articles }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) async fn ensure_document(state: &AppState, document_id: DbId) -> AppResult<()> {
    if DocumentRepo::find_by_id(&state.pool, document_id).await?.is_none() {
        return Err(document_not_found(document_id));
    }
    Ok(())
}

fn node_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "StructureNode",
        id,
    })
}
