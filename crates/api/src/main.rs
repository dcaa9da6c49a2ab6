use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mibeko_api::config::ServerConfig;
use mibeko_api::router::build_app_router;
use mibeko_api::state::AppState;
use mibeko_embeddings::{EmbeddingConfig, EmbeddingProvider, HttpEmbeddingClient};
use tokio_util::task::TaskTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mibeko_api=debug,mibeko_embeddings=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = mibeko_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    mibeko_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    mibeko_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Embedding provider ---
    let embedder: Option<Arc<dyn EmbeddingProvider>> = match EmbeddingConfig::from_env() {
        Some(embedding_config) => {
            let client =
                HttpEmbeddingClient::new(embedding_config).expect("Failed to build embedding client");
            tracing::info!(model = %client.model(), "Embedding provider configured");
            Some(Arc::new(client) as Arc<dyn EmbeddingProvider>)
        }
        None => {
            tracing::warn!("EMBEDDING_API_KEY not set; semantic search and the embedding hook are disabled");
            None
        }
    };

    // --- App state ---
    let background = TaskTracker::new();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        embedder,
        background: background.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        pending = background.len(),
        "Server stopped accepting connections, waiting for embedding hooks"
    );
    background.close();
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, background.wait()).await.is_err() {
        tracing::warn!(
            pending = background.len(),
            "Embedding hooks still running at shutdown; the worker backfill will cover them"
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
