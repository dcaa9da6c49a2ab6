//! Maintenance endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use mibeko_core::error::CoreError;
use mibeko_db::models::search::{ReindexParams, ReindexResult};
use mibeko_db::repositories::{ArticleRepo, SearchIndexRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/search/reindex
///
/// Rebuild search vectors for one article (`?article_id=`) or for all.
pub async fn reindex_search(
    State(state): State<AppState>,
    Query(params): Query<ReindexParams>,
) -> AppResult<impl IntoResponse> {
    let versions_reindexed = match params.article_id {
        Some(article_id) => {
            if ArticleRepo::find_by_id(&state.pool, article_id).await?.is_none() {
                return Err(AppError::Core(CoreError::NotFound {
                    entity: "Article",
                    id: article_id,
                }));
            }
            SearchIndexRepo::reindex_article(&state.pool, article_id).await?
        }
        None => SearchIndexRepo::reindex_all(&state.pool).await?,
    };

    tracing::info!(article_id = ?params.article_id, versions_reindexed, "Search index rebuilt on request");

    Ok(Json(DataResponse {
        data: ReindexResult { versions_reindexed },
    }))
}
