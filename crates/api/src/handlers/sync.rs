//! Handler for the offline sync feed used by the mobile app.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::search::clamp_limit;
use mibeko_core::sync::{DEFAULT_SYNC_LIMIT, MAX_SYNC_LIMIT};
use mibeko_db::models::sync::SyncParams;
use mibeko_db::repositories::SyncRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sync/changes
///
/// Rows changed after `since` (everything without it), plus tombstones.
/// Clients store `next_since` and call again while `has_more` is set.
pub async fn get_changes(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_SYNC_LIMIT, MAX_SYNC_LIMIT);
    let changes = SyncRepo::changes(&state.pool, params.since, limit).await?;

    tracing::debug!(
        since = ?params.since,
        documents = changes.documents.len(),
        articles = changes.articles.len(),
        versions = changes.versions.len(),
        has_more = changes.has_more,
        "Sync page served",
    );

    Ok(Json(DataResponse { data: changes }))
}
