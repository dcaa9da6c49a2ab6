//! Handlers for legal documents.
//!
//! Documents are soft-deleted; a deleted document disappears from listings,
//! search and the sync feed until restored.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::document::{resolve_slug, validate_status, validate_title, DocumentType};
use mibeko_core::error::CoreError;
use mibeko_core::types::DbId;
use mibeko_db::models::document::{CreateDocument, DocumentListParams, UpdateDocument};
use mibeko_db::repositories::DocumentRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<DocumentListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        validate_status(status)?;
    }
    let documents = DocumentRepo::list(&state.pool, &params).await?;

    Ok(Json(DataResponse { data: documents }))
}

/// POST /api/v1/documents
///
/// The slug is derived from the title unless one is given.
pub async fn create_document(
    State(state): State<AppState>,
    Json(input): Json<CreateDocument>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_title(&input.title)?;
    DocumentType::parse(&input.document_type)?;
    if let Some(status) = &input.status {
        validate_status(status)?;
    }
    let slug = resolve_slug(&input.title, input.slug.as_deref())?;

    let document = DocumentRepo::create(&state.pool, &input, &slug).await?;

    tracing::info!(document_id = document.id, slug = %document.slug, "Document created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: document })))
}

/// GET /api/v1/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(document_not_found(id))?;

    Ok(Json(DataResponse { data: document }))
}

/// PUT /api/v1/documents/{id}
///
/// Only provided fields change. An explicit slug is validated; a new title
/// alone keeps the existing slug so public links stay stable.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocument>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(document_type) = &input.document_type {
        DocumentType::parse(document_type)?;
    }
    if let Some(status) = &input.status {
        validate_status(status)?;
    }
    let slug = input
        .slug
        .as_deref()
        .map(|slug| resolve_slug(input.title.as_deref().unwrap_or_default(), Some(slug)))
        .transpose()?;

    let document = DocumentRepo::update(&state.pool, id, &input, slug.as_deref())
        .await?
        .ok_or(document_not_found(id))?;

    tracing::info!(document_id = id, "Document updated");

    Ok(Json(DataResponse { data: document }))
}

/// DELETE /api/v1/documents/{id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !DocumentRepo::soft_delete(&state.pool, id).await? {
        return Err(document_not_found(id));
    }

    tracing::info!(document_id = id, "Document soft-deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/documents/{id}/restore
pub async fn restore_document(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = DocumentRepo::restore(&state.pool, id)
        .await?
        .ok_or(document_not_found(id))?;

    tracing::info!(document_id = id, "Document restored");

    Ok(Json(DataResponse { data: document }))
}

pub(crate) fn document_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Document",
        id,
    })
}
