pub mod articles;
pub mod documents;
pub mod health;
pub mod nodes;
pub mod search;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents                                    list, create
/// /documents/{id}                               get, update, soft delete
/// /documents/{id}/restore                       restore (POST)
/// /documents/{id}/structure                     nested tree, replace from flat list
/// /documents/{id}/nodes                         create node (POST)
/// /documents/{id}/articles                      list, create with first version
///
/// /nodes/{id}                                   get, update, delete subtree
/// /nodes/{id}/move                              re-parent / reorder (POST)
/// /nodes/{id}/articles                          articles attached to node
///
/// /articles/{id}                                detail, update, soft delete
/// /articles/{id}/content                        save content (PUT)
/// /articles/{id}/repeal                         close version in force (POST)
/// /articles/{id}/versions                       history, newest first
/// /articles/{id}/versions/active                version in force (?at=)
/// /articles/{id}/versions/{version_id}          one version
///
/// /tags                                         list
/// /tags/suggest                                 autocomplete (?prefix=)
/// /tags/{id}                                    rename, delete
/// /entities/{type}/{id}/tags                    list, apply, replace
/// /entities/{type}/{id}/tags/{tag_id}           remove
///
/// /search                                       full-text (?q=&document_id=&at=)
/// /search/suggest                               typeahead (?q=)
/// /search/semantic                              embedding search (?q=)
///
/// /sync/changes                                 offline change feed (?since=)
///
/// /admin/search/reindex                         rebuild search vectors (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router())
        .nest("/nodes", nodes::router())
        .nest("/articles", articles::router())
        .nest("/tags", tags::router())
        .nest("/entities", tags::entity_tags_router())
        .nest("/search", search::router())
        .nest("/sync", search::sync_router())
        .nest("/admin", search::admin_router())
}
