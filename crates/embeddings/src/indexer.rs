//! Stores embeddings on article versions.
//!
//! Used two ways: [`embed_version`] for the save hook (one version right
//! after a content save) and [`backfill_batch`] for the worker (sequential
//! pass over versions without a vector, with a fixed delay between calls).

use std::time::Duration;

use mibeko_core::embedding::{build_embedding_input, to_pgvector_literal, validate_embedding};
use mibeko_core::types::DbId;
use mibeko_db::models::article_version::VersionEmbeddingSource;
use mibeko_db::repositories::ArticleVersionRepo;
use mibeko_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::error::{EmbeddingError, IndexerError};
use crate::provider::EmbeddingProvider;

/// Counters for one backfill batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    /// Versions fetched for this batch.
    pub fetched: usize,
    pub embedded: usize,
    /// Versions whose content changed while the vector was computed.
    pub stale: usize,
    pub failed: usize,
    /// Highest version id fetched. The next batch starts after it.
    pub last_id: Option<DbId>,
}

/// Embed one prepared source row and store the vector.
///
/// Returns `false` if the version's content changed in the meantime, in
/// which case nothing is stored.
pub async fn embed_source(
    pool: &DbPool,
    provider: &dyn EmbeddingProvider,
    source: &VersionEmbeddingSource,
) -> Result<bool, IndexerError> {
    let input = build_embedding_input(&source.document_title, &source.article_number, &source.content);
    let embedding = provider.embed(&input).await?;
    validate_embedding(&embedding).map_err(|e| EmbeddingError::Dimension(e.to_string()))?;

    let stored = ArticleVersionRepo::store_embedding(
        pool,
        source.version_id,
        &source.content_hash,
        &to_pgvector_literal(&embedding),
        provider.model(),
    )
    .await?;
    Ok(stored)
}

/// Embed a single version by id.
///
/// Returns `false` if the version no longer exists or changed while the
/// vector was computed.
pub async fn embed_version(
    pool: &DbPool,
    provider: &dyn EmbeddingProvider,
    version_id: DbId,
) -> Result<bool, IndexerError> {
    let Some(source) = ArticleVersionRepo::embedding_source(pool, version_id).await? else {
        return Ok(false);
    };
    embed_source(pool, provider, &source).await
}

/// Embed up to `batch_size` versions with an id above `after_id` that have
/// no vector yet.
///
/// Versions are processed one at a time with `delay` between provider
/// calls. Failures are logged and counted, never propagated. Stops early
/// when `cancel` fires.
pub async fn backfill_batch(
    pool: &DbPool,
    provider: &dyn EmbeddingProvider,
    after_id: DbId,
    batch_size: i64,
    delay: Duration,
    include_history: bool,
    cancel: &CancellationToken,
) -> Result<BackfillStats, sqlx::Error> {
    let sources =
        ArticleVersionRepo::list_missing_embeddings(pool, after_id, batch_size, include_history)
            .await?;
    let mut stats = BackfillStats {
        fetched: sources.len(),
        last_id: sources.last().map(|s| s.version_id),
        ..Default::default()
    };

    for (i, source) in sources.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        if i > 0 {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        match embed_source(pool, provider, source).await {
            Ok(true) => stats.embedded += 1,
            Ok(false) => stats.stale += 1,
            Err(e) => {
                tracing::warn!(version_id = source.version_id, error = %e, "Failed to embed article version");
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        fetched = stats.fetched,
        embedded = stats.embedded,
        stale = stats.stale,
        failed = stats.failed,
        "Embedding batch finished"
    );
    Ok(stats)
}
