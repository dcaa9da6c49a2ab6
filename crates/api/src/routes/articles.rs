//! Route definitions for articles and their versions.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::articles;
use crate::state::AppState;

/// Routes mounted at `/articles`.
///
/// ```text
/// GET    /{id}                          -> get_article
/// PUT    /{id}                          -> update_article
/// DELETE /{id}                          -> delete_article
/// PUT    /{id}/content                  -> save_content
/// POST   /{id}/repeal                   -> repeal_article
/// GET    /{id}/versions                 -> list_versions
/// GET    /{id}/versions/active          -> get_active_version
/// GET    /{id}/versions/{version_id}    -> get_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
        .route("/{id}/content", put(articles::save_content))
        .route("/{id}/repeal", post(articles::repeal_article))
        .route("/{id}/versions", get(articles::list_versions))
        .route("/{id}/versions/active", get(articles::get_active_version))
        .route("/{id}/versions/{version_id}", get(articles::get_version))
}
