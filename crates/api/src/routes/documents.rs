//! Route definitions for documents and their document-scoped children.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{articles, documents, structure};
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// GET    /                    -> list_documents
/// POST   /                    -> create_document
/// GET    /{id}                -> get_document
/// PUT    /{id}                -> update_document
/// DELETE /{id}                -> delete_document
/// POST   /{id}/restore        -> restore_document
/// GET    /{id}/structure      -> get_structure
/// PUT    /{id}/structure      -> sync_structure
/// POST   /{id}/nodes          -> create_node
/// GET    /{id}/articles       -> list_document_articles
/// POST   /{id}/articles       -> create_article
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/{id}",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/{id}/restore", post(documents::restore_document))
        .route(
            "/{id}/structure",
            get(structure::get_structure).put(structure::sync_structure),
        )
        .route("/{id}/nodes", post(structure::create_node))
        .route(
            "/{id}/articles",
            get(articles::list_document_articles).post(articles::create_article),
        )
}
