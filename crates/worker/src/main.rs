//! Background worker: embeds article versions that have no vector yet.
//!
//! `mibeko-worker` runs the embedding backfill. `mibeko-worker reindex`
//! rebuilds the full-text search document of every version first.

mod backfill;

use anyhow::Context;
use mibeko_db::repositories::SearchIndexRepo;
use mibeko_embeddings::{EmbeddingConfig, EmbeddingProvider, HttpEmbeddingClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backfill::BackfillConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mibeko_worker=debug,mibeko_embeddings=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = mibeko_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    mibeko_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    if std::env::args().nth(1).as_deref() == Some("reindex") {
        let reindexed = SearchIndexRepo::reindex_all(&pool)
            .await
            .context("Search reindex failed")?;
        tracing::info!(reindexed, "Search documents rebuilt");
    }

    let embedding_config =
        EmbeddingConfig::from_env().context("EMBEDDING_API_KEY must be set for the worker")?;
    let client = HttpEmbeddingClient::new(embedding_config).context("Failed to build embedding client")?;
    let config = BackfillConfig::from_env();
    tracing::info!(
        model = %client.model(),
        batch_size = config.batch_size,
        delay_ms = config.delay.as_millis() as u64,
        include_history = config.include_history,
        "Embedding backfill starting"
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        }
    });

    let totals = backfill::run(&pool, &client, &config, &cancel)
        .await
        .context("Embedding backfill failed")?;
    tracing::info!(
        batches = totals.batches,
        embedded = totals.embedded,
        stale = totals.stale,
        failed = totals.failed,
        "Embedding backfill finished"
    );

    pool.close().await;
    Ok(())
}
