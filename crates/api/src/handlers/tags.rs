//! Handlers for the tag system.
//!
//! Tags are shared across articles and documents through the polymorphic
//! `taggables` table. Tag names feed the search index of articles, so every
//! association change here reindexes the affected articles in the database.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::error::CoreError;
use mibeko_core::tagging::{validate_taggable_type, TAGGABLE_ARTICLE};
use mibeko_core::types::DbId;
use mibeko_db::models::tag::{
    ApplyTagsRequest, TagInfo, TagListParams, TagSuggestParams, UpdateTag,
};
use mibeko_db::repositories::TagRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for a tag-set replacement.
#[derive(Debug, Serialize)]
pub struct SyncTagsResponse {
    pub applied: u64,
    pub removed: u64,
    pub tags: Vec<TagInfo>,
}

// ---------------------------------------------------------------------------
// Tag CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/tags
///
/// All tags, most used first.
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<TagListParams>,
) -> AppResult<impl IntoResponse> {
    let tags = TagRepo::list_all(&state.pool, &params).await?;

    Ok(Json(DataResponse { data: tags }))
}

/// GET /api/v1/tags/suggest
///
/// Autocomplete suggestions matching the given prefix.
pub async fn suggest_tags(
    State(state): State<AppState>,
    Query(params): Query<TagSuggestParams>,
) -> AppResult<impl IntoResponse> {
    let suggestions = TagRepo::suggest(&state.pool, &params.prefix, params.limit).await?;

    Ok(Json(DataResponse { data: suggestions }))
}

/// PUT /api/v1/tags/{id}
///
/// Rename a tag. The slug follows the name; a clash with another tag's
/// slug is a 409.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    let tag = TagRepo::rename(&state.pool, tag_id, &input.name)
        .await?
        .ok_or(tag_not_found(tag_id))?;

    tracing::info!(tag_id, name = %tag.name, "Tag renamed");

    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
///
/// Delete a tag and all its entity associations.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !TagRepo::delete(&state.pool, tag_id).await? {
        return Err(tag_not_found(tag_id));
    }

    tracing::info!(tag_id, "Tag deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Entity-tag associations
// ---------------------------------------------------------------------------

/// GET /api/v1/entities/{entity_type}/{entity_id}/tags
pub async fn get_entity_tags(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    ensure_entity(&state, &entity_type, entity_id).await?;

    let tags = TagRepo::get_entity_tags(&state.pool, &entity_type, entity_id).await?;

    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/entities/{entity_type}/{entity_id}/tags
///
/// Apply one or more tags to an entity. Tags are created on first use.
pub async fn apply_entity_tags(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, DbId)>,
    Json(input): Json<ApplyTagsRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_entity(&state, &entity_type, entity_id).await?;

    if input.tag_names.is_empty() {
        return Err(AppError::BadRequest("tag_names must not be empty".into()));
    }

    let applied =
        TagRepo::apply_names(&state.pool, &entity_type, entity_id, &input.tag_names).await?;

    tracing::info!(
        entity_type = %entity_type,
        entity_id,
        applied,
        "Tags applied to entity",
    );

    let tags = TagRepo::get_entity_tags(&state.pool, &entity_type, entity_id).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: tags })))
}

/// PUT /api/v1/entities/{entity_type}/{entity_id}/tags
///
/// Replace the whole tag set of an entity. An empty list clears it.
pub async fn replace_entity_tags(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, DbId)>,
    Json(input): Json<ApplyTagsRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_entity(&state, &entity_type, entity_id).await?;

    let (applied, removed) =
        TagRepo::sync_tags(&state.pool, &entity_type, entity_id, &input.tag_names).await?;

    tracing::info!(
        entity_type = %entity_type,
        entity_id,
        applied,
        removed,
        "Entity tag set replaced",
    );

    let tags = TagRepo::get_entity_tags(&state.pool, &entity_type, entity_id).await?;

    Ok(Json(DataResponse {
        data: SyncTagsResponse {
            applied,
            removed,
            tags,
        },
    }))
}

/// DELETE /api/v1/entities/{entity_type}/{entity_id}/tags/{tag_id}
///
/// Remove a single tag from an entity.
pub async fn remove_entity_tag(
    State(state): State<AppState>,
    Path((entity_type, entity_id, tag_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    validate_taggable_type(&entity_type)?;

    let removed = TagRepo::remove_one(&state.pool, &entity_type, entity_id, tag_id).await?;

    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "EntityTag",
            id: tag_id,
        }));
    }

    tracing::info!(
        entity_type = %entity_type,
        entity_id,
        tag_id,
        "Tag removed from entity",
    );

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject unknown entity types (400) and missing entities (404).
async fn ensure_entity(state: &AppState, entity_type: &str, entity_id: DbId) -> AppResult<()> {
    if !TagRepo::entity_exists(&state.pool, entity_type, entity_id).await? {
        let entity = if entity_type == TAGGABLE_ARTICLE {
            "Article"
        } else {
            "Document"
        };
        return Err(AppError::Core(CoreError::NotFound {
            entity,
            id: entity_id,
        }));
    }
    Ok(())
}

fn tag_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Tag", id })
}
