use std::sync::Arc;

use mibeko_embeddings::EmbeddingProvider;
use tokio_util::task::TaskTracker;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mibeko_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Embedding provider; `None` disables semantic search and the save hook.
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    /// Tracks spawned embedding hooks so shutdown can wait for them.
    pub background: TaskTracker,
}
