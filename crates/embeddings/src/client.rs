//! HTTP client for OpenAI-compatible embedding endpoints.
//!
//! [`HttpEmbeddingClient`] posts `{ "model", "input" }` to
//! `{base_url}/embeddings` with a bearer key. HTTP 429 responses are retried
//! with exponential backoff (2 s, 4 s, 8 s); a `Retry-After` header, when
//! present, replaces the scheduled delay.

use std::time::Duration;

use async_trait::async_trait;
use mibeko_core::embedding::EMBEDDING_DIMENSION;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::provider::EmbeddingProvider;

/// Retry delays in seconds (exponential backoff: 2s, 4s, 8s).
const RETRY_DELAYS_SECS: [u64; 3] = [2, 4, 8];

/// Longest server-requested wait that is honoured.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the embedding HTTP client.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    /// Base URL without the trailing `/embeddings`.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Build a config with default URL, model and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `EMBEDDING_API_KEY` is not set, signalling that
    /// embeddings are disabled.
    ///
    /// | Variable                 | Required | Default                      |
    /// |--------------------------|----------|------------------------------|
    /// | `EMBEDDING_API_KEY`      | yes      | -                            |
    /// | `EMBEDDING_API_URL`      | no       | `https://api.openai.com/v1`  |
    /// | `EMBEDDING_MODEL`        | no       | `text-embedding-3-small`     |
    /// | `EMBEDDING_TIMEOUT_SECS` | no       | `30`                         |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("EMBEDDING_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            base_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout_secs: std::env::var("EMBEDDING_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(Vec<f32>),
    RateLimited(Option<Duration>),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Embedding provider backed by an OpenAI-compatible HTTP API.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    config: EmbeddingConfig,
    retry_delays: Vec<Duration>,
}

impl HttpEmbeddingClient {
    /// Create a client with the default backoff schedule.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            retry_delays: RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        })
    }

    /// Replace the backoff schedule. One retry per entry.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Execute a single POST request.
    async fn try_embed(&self, input: &str) -> Result<Attempt, EmbeddingError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::RateLimited(parse_retry_after(response.headers())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("response contains no data".into()))?;

        if embedding.len() != EMBEDDING_DIMENSION {
            return Err(EmbeddingError::Dimension(format!(
                "expected {EMBEDDING_DIMENSION} dimensions, got {}",
                embedding.len()
            )));
        }
        Ok(Attempt::Done(embedding))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_embed(input).await? {
                Attempt::Done(embedding) => return Ok(embedding),
                Attempt::RateLimited(retry_after) => {
                    let Some(scheduled) = self.retry_delays.get(attempt - 1) else {
                        tracing::error!(attempts = attempt, "Embedding API still rate-limited");
                        return Err(EmbeddingError::RateLimited {
                            attempts: attempt as u32,
                        });
                    };
                    let delay = retry_after.unwrap_or(*scheduled);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Embedding API rate-limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Read a `Retry-After` header given in seconds, capped at [`MAX_RETRY_AFTER`].
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let mut config = EmbeddingConfig::new("k");
        config.base_url = "http://localhost:9000/v1/".into();
        assert_eq!(config.endpoint(), "http://localhost:9000/v1/embeddings");
    }

    #[test]
    fn config_defaults() {
        let config = EmbeddingConfig::new("k");
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));
    }

    #[test]
    fn retry_after_is_capped() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));
        assert_eq!(parse_retry_after(&headers), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn retry_after_http_date_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(EmbeddingRequest {
            model: "m",
            input: "texte",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "model": "m", "input": "texte" }));
    }

    #[test]
    fn default_schedule_is_exponential() {
        let client = HttpEmbeddingClient::new(EmbeddingConfig::new("k")).unwrap();
        assert_eq!(
            client.retry_delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[test]
    fn error_display() {
        let err = EmbeddingError::Api {
            status: 400,
            body: "bad input".into(),
        };
        assert_eq!(err.to_string(), "Embedding API returned HTTP 400: bad input");
        let err = EmbeddingError::RateLimited { attempts: 4 };
        assert_eq!(err.to_string(), "Embedding API rate-limited after 4 attempts");
    }
}
