//! Embedding backfill loop.
//!
//! Repeatedly asks the indexer for a batch of article versions without a
//! vector until none are left or the worker is asked to stop. Batches walk
//! the version ids upward, so a version that keeps failing is tried once per
//! run and never holds back the ones after it.

use std::time::Duration;

use mibeko_db::DbPool;
use mibeko_embeddings::indexer::{backfill_batch, BackfillStats};
use mibeko_embeddings::EmbeddingProvider;
use tokio_util::sync::CancellationToken;

/// Default number of versions fetched per batch.
const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default pause between two provider calls.
const DEFAULT_BATCH_DELAY_MS: u64 = 200;

/// Tunables for the backfill loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub batch_size: i64,
    pub delay: Duration,
    /// Also embed superseded versions, not only the current ones.
    pub include_history: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            include_history: false,
        }
    }
}

impl BackfillConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                         | Default |
    /// |----------------------------------|---------|
    /// | `EMBEDDING_BATCH_SIZE`           | `50`    |
    /// | `EMBEDDING_BATCH_DELAY_MS`       | `200`   |
    /// | `EMBEDDING_BACKFILL_ALL_VERSIONS`| `false` |
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let batch_size = var("EMBEDDING_BATCH_SIZE")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.batch_size);
        let delay = var("EMBEDDING_BATCH_DELAY_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay);
        let include_history = var("EMBEDDING_BACKFILL_ALL_VERSIONS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.include_history);

        Self {
            batch_size,
            delay,
            include_history,
        }
    }
}

/// Totals across every batch of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillTotals {
    pub batches: usize,
    pub embedded: usize,
    pub stale: usize,
    pub failed: usize,
}

impl BackfillTotals {
    fn add(&mut self, stats: &BackfillStats) {
        self.batches += 1;
        self.embedded += stats.embedded;
        self.stale += stats.stale;
        self.failed += stats.failed;
    }
}

/// Run batches until the backlog is empty.
pub async fn run(
    pool: &DbPool,
    provider: &dyn EmbeddingProvider,
    config: &BackfillConfig,
    cancel: &CancellationToken,
) -> Result<BackfillTotals, sqlx::Error> {
    let mut totals = BackfillTotals::default();
    let mut after_id = 0;

    loop {
        if cancel.is_cancelled() {
            tracing::info!("Embedding backfill cancelled");
            break;
        }

        let stats = backfill_batch(
            pool,
            provider,
            after_id,
            config.batch_size,
            config.delay,
            config.include_history,
            cancel,
        )
        .await?;

        let Some(last_id) = stats.last_id else {
            break;
        };
        totals.add(&stats);
        after_id = last_id;
    }

    Ok(totals)
}
