//! Article embeddings: the provider seam, an HTTP client for
//! OpenAI-compatible `/embeddings` endpoints, and the indexer that stores
//! vectors on article versions.

pub mod client;
pub mod error;
pub mod indexer;
pub mod provider;

pub use client::{EmbeddingConfig, HttpEmbeddingClient};
pub use error::{EmbeddingError, IndexerError};
pub use provider::EmbeddingProvider;
