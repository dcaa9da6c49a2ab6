use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Turns text into a dense vector.
///
/// Implementations must be cheap to share: the API holds one behind an
/// `Arc<dyn EmbeddingProvider>` and calls it from spawned tasks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single input.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier recorded next to stored vectors.
    fn model(&self) -> &str;
}
