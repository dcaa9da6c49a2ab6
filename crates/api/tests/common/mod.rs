#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use mibeko_api::config::ServerConfig;
use mibeko_api::router::build_app_router;
use mibeko_api::state::AppState;
use mibeko_core::embedding::EMBEDDING_DIMENSION;
use mibeko_embeddings::{EmbeddingError, EmbeddingProvider};
use serde_json::Value;
use sqlx::PgPool;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

/// Build the full application router without an embedding provider.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(pool, None)
}

/// Build the full application router with the given embedding provider.
pub fn build_test_app_with_embedder(pool: PgPool, embedder: Arc<dyn EmbeddingProvider>) -> Router {
    build_app(pool, Some(embedder))
}

fn build_app(pool: PgPool, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        embedder,
        background: TaskTracker::new(),
    };
    build_app_router(state, &config)
}

/// Provider returning the same constant vector for every input.
pub struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _input: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.5; EMBEDDING_DIMENSION])
    }

    fn model(&self) -> &str {
        "constant-test-model"
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a document through the API and return its id.
pub async fn create_document(pool: &PgPool, title: &str) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/documents",
        serde_json::json!({ "title": title, "document_type": "code" }),
    )
    .await;
    assert_eq!(response.status(), 201, "document fixture");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create an article with its first version and return `(article_id, version_id)`.
pub async fn create_article(
    pool: &PgPool,
    document_id: i64,
    number: &str,
    content: &str,
    valid_from: &str,
) -> (i64, i64) {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/documents/{document_id}/articles"),
        serde_json::json!({ "number": number, "content": content, "valid_from": valid_from }),
    )
    .await;
    assert_eq!(response.status(), 201, "article fixture");
    let json = body_json(response).await;
    (
        json["data"]["id"].as_i64().unwrap(),
        json["data"]["current_version"]["id"].as_i64().unwrap(),
    )
}
