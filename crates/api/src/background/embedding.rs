//! Save hook: embed a freshly saved article version.
//!
//! Fire-and-forget. Failures are logged; the worker's backfill picks up any
//! version left without a vector.

use mibeko_core::types::DbId;
use mibeko_embeddings::indexer;

use crate::state::AppState;

/// Spawn embedding of `version_id` if a provider is configured.
///
/// Returns `true` if a task was spawned.
pub fn spawn_embed_version(state: &AppState, version_id: DbId) -> bool {
    let Some(provider) = state.embedder.clone() else {
        return false;
    };
    let pool = state.pool.clone();

    state.background.spawn(async move {
        match indexer::embed_version(&pool, provider.as_ref(), version_id).await {
            Ok(true) => tracing::debug!(version_id, "Article version embedded"),
            Ok(false) => {
                tracing::debug!(version_id, "Article version changed before embedding was stored")
            }
            Err(e) => {
                tracing::warn!(version_id, error = %e, "Embedding hook failed; backfill will retry")
            }
        }
    });
    true
}
