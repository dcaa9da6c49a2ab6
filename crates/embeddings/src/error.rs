/// Error type for embedding provider failures.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status other than 429.
    #[error("Embedding API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Still rate-limited once every retry was spent.
    #[error("Embedding API rate-limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// The response body did not have the expected shape.
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    /// The vector does not have the expected number of finite components.
    #[error("Invalid embedding: {0}")]
    Dimension(String),
}

/// Error type for storing embeddings on article versions.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
