//! Embedding service abstraction
//!
//! The embedder is an external capability reached over the network. Queries
//! and stored documents must be embedded with the same model/version, or
//! similarity scores stop being comparable; `EmbedMode` tells providers that
//! distinguish input types which side of the comparison a text is on.
//!
//! Failures surface as-is: a failed embedding call is fatal to the query and
//! is never papered over with a zero vector.

use crate::config::EmbeddingConfig;
use crate::errors::{Result, SearchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which side of the similarity comparison a text is embedded for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedMode {
    /// Free-text search query
    Query,
    /// Stored document content
    Document,
}

impl EmbedMode {
    fn as_str(&self) -> &'static str {
        match self {
            EmbedMode::Query => "query",
            EmbedMode::Document => "document",
        }
    }
}

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Generate a fixed-length embedding for a single text
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// HTTP embedding client (OpenAI-compatible endpoint)
#[derive(Debug)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create an embedder from configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| SearchError::Configuration {
            message: "embedding api_key is not set".to_string(),
        })?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            timeout,
        })
    }

    async fn make_request(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
            input_type: mode.as_str(),
        };

        let send = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| SearchError::Timeout {
                operation: "embed".to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        operation: "embed".to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    SearchError::EmbeddingUnavailable {
                        message: format!("request failed: {e}"),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::EmbeddingUnavailable {
                message: format!("API error {status}: {body}"),
            });
        }

        let result: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::EmbeddingUnavailable {
                    message: format!("failed to parse response: {e}"),
                })?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| SearchError::EmbeddingUnavailable {
                message: "empty response".to_string(),
            })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(SearchError::invalid_field("text is empty", "text"));
        }
        self.make_request(text, mode).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock embedder for testing: deterministic per input text
#[derive(Debug)]
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        use rand::{Rng, SeedableRng};
        // Seed from the text so identical inputs embed identically
        let seed = text.bytes().fold(0u64, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(u64::from(b))
        });
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Ok((0..self.dimension).map(|_| rng.gen::<f32>()).collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(HttpEmbedder::new(config)?)),
        "mock" => Ok(Arc::new(MockEmbedder::new(config.dimension))),
        other => Err(SearchError::Configuration {
            message: format!("unknown embedding provider: {other}"),
        }),
    }
}
