//! Route definitions for search, the sync feed and search maintenance.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin, search, sync};
use crate::state::AppState;

/// Routes mounted at `/search`.
///
/// ```text
/// GET    /                  -> search
/// GET    /suggest           -> typeahead
/// GET    /semantic          -> semantic_search
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search::search))
        .route("/suggest", get(search::typeahead))
        .route("/semantic", get(search::semantic_search))
}

/// Routes mounted at `/sync`.
pub fn sync_router() -> Router<AppState> {
    Router::new().route("/changes", get(sync::get_changes))
}

/// Routes mounted at `/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/search/reindex", post(admin::reindex_search))
}
