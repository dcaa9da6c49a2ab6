//! Article embedding constants, input preparation and vector encoding.
//!
//! Embeddings are stored in pgvector's `vector(1536)` column. Queries are
//! built at runtime, so vectors travel as text literals (`'[0.1,0.2]'`) and
//! are cast with `::vector` in SQL.

use crate::error::CoreError;

/// Dimensionality of article embeddings.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Maximum characters sent to the embedding provider per input.
pub const MAX_EMBEDDING_INPUT_CHARS: usize = 8000;

/// Build the text sent to the embedding provider for one article version.
///
/// Prefixes the content with its document title and article number so that
/// short articles ("Abrogé.") still land near their context, and truncates
/// on a character boundary.
pub fn build_embedding_input(document_title: &str, article_number: &str, content: &str) -> String {
    let input = format!(
        "{} - Article {}\n\n{}",
        document_title.trim(),
        article_number.trim(),
        content.trim()
    );
    truncate_chars(&input, MAX_EMBEDDING_INPUT_CHARS)
}

/// Truncate `s` to at most `max` characters without splitting a char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Validate that an embedding has the expected number of finite components.
pub fn validate_embedding(embedding: &[f32]) -> Result<(), CoreError> {
    if embedding.len() != EMBEDDING_DIMENSION {
        return Err(CoreError::Validation(format!(
            "Embedding must have {EMBEDDING_DIMENSION} dimensions, got {}",
            embedding.len()
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(CoreError::Validation(
            "Embedding contains non-finite values".into(),
        ));
    }
    Ok(())
}

/// Encode an embedding as a pgvector text literal.
pub fn to_pgvector_literal(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}
