//! Route definitions for structure nodes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::structure;
use crate::state::AppState;

/// Routes mounted at `/nodes`.
///
/// ```text
/// GET    /{id}                -> get_node
/// PUT    /{id}                -> update_node
/// DELETE /{id}                -> delete_node
/// POST   /{id}/move           -> move_node
/// GET    /{id}/articles       -> list_node_articles
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(structure::get_node)
                .put(structure::update_node)
                .delete(structure::delete_node),
        )
        .route("/{id}/move", post(structure::move_node))
        .route("/{id}/articles", get(structure::list_node_articles))
}
