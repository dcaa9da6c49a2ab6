//! Handlers for article search: weighted full-text, typeahead and semantic.
//!
//! Full-text queries are sanitized into a tsquery before reaching the
//! database; input with no usable term yields an empty result list.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::embedding::{to_pgvector_literal, validate_embedding};
use mibeko_core::search::{
    build_prefix_tsquery, build_tsquery, clamp_limit, clamp_offset, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SEMANTIC_LIMIT, DEFAULT_TYPEAHEAD_LIMIT, MAX_SEARCH_LIMIT, MAX_SEMANTIC_LIMIT,
    MAX_TYPEAHEAD_LIMIT,
};
use mibeko_db::models::search::{
    SearchParams, SearchResultRow, SemanticResultRow, SemanticSearchParams, TypeaheadParams,
    TypeaheadResult,
};
use mibeko_db::repositories::SearchRepo;
use mibeko_embeddings::EmbeddingError;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/search
///
/// Ranked full-text search over current versions, or over the versions in
/// force at `at` when given.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let Some(tsquery) = params.q.as_deref().and_then(build_tsquery) else {
        return Ok(Json(DataResponse { data: Vec::<SearchResultRow>::new() }));
    };
    let limit = clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let offset = clamp_offset(params.offset);

    let results = SearchRepo::fulltext(
        &state.pool,
        &tsquery,
        params.document_id,
        params.at,
        limit,
        offset,
    )
    .await?;

    tracing::debug!(%tsquery, at = ?params.at, results = results.len(), "Full-text search");

    Ok(Json(DataResponse { data: results }))
}

/// GET /api/v1/search/suggest
///
/// Typeahead over current versions; the last term matches as a prefix.
pub async fn typeahead(
    State(state): State<AppState>,
    Query(params): Query<TypeaheadParams>,
) -> AppResult<impl IntoResponse> {
    let Some(tsquery) = params.q.as_deref().and_then(build_prefix_tsquery) else {
        return Ok(Json(DataResponse { data: Vec::<TypeaheadResult>::new() }));
    };
    let limit = clamp_limit(params.limit, DEFAULT_TYPEAHEAD_LIMIT, MAX_TYPEAHEAD_LIMIT);

    let results = SearchRepo::typeahead(&state.pool, &tsquery, limit).await?;

    Ok(Json(DataResponse { data: results }))
}

/// GET /api/v1/search/semantic
///
/// Embeds `q` and ranks current versions by cosine similarity. 503 when no
/// embedding provider is configured.
pub async fn semantic_search(
    State(state): State<AppState>,
    Query(params): Query<SemanticSearchParams>,
) -> AppResult<impl IntoResponse> {
    let Some(provider) = state.embedder.as_ref() else {
        return Err(AppError::ServiceUnavailable(
            "Semantic search requires an embedding provider".into(),
        ));
    };
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Ok(Json(DataResponse { data: Vec::<SemanticResultRow>::new() }));
    }
    let limit = clamp_limit(params.limit, DEFAULT_SEMANTIC_LIMIT, MAX_SEMANTIC_LIMIT);

    let embedding = provider.embed(query).await?;
    validate_embedding(&embedding).map_err(|e| EmbeddingError::Dimension(e.to_string()))?;

    let results = SearchRepo::semantic(
        &state.pool,
        &to_pgvector_literal(&embedding),
        params.document_id,
        limit,
    )
    .await?;

    Ok(Json(DataResponse { data: results }))
}
