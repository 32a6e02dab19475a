//! Vector-search backend abstraction
//!
//! The backend is a hosted document database reached over HTTP; it accepts an
//! ordered pipeline of stage documents and returns matching documents
//! annotated with a similarity score. No connection state is shared globally:
//! callers hold the backend handle and pass it where it is needed.

use crate::config::BackendConfig;
use crate::errors::{Result, SearchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for running an aggregation pipeline against the search backend
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run the pipeline and return matching documents in backend order
    async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>>;
}

/// HTTP client for a hosted data API aggregate endpoint
#[derive(Debug)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    data_source: String,
    database: String,
    collection: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct AggregateRequest<'a> {
    #[serde(rename = "dataSource")]
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    pipeline: &'a [Value],
}

#[derive(Deserialize)]
struct AggregateResponse {
    documents: Vec<Value>,
}

impl HttpSearchBackend {
    /// Create a backend client from configuration
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| SearchError::Configuration {
            message: "backend api_key is not set".to_string(),
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
            base_url: config.base_url.clone(),
            data_source: config.data_source.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>> {
        let url = format!("{}/action/aggregate", self.base_url);

        let request = AggregateRequest {
            data_source: &self.data_source,
            database: &self.database,
            collection: &self.collection,
            pipeline,
        };

        let send = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| SearchError::Timeout {
                operation: "aggregate".to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        operation: "aggregate".to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    SearchError::SearchBackendUnavailable {
                        message: format!("request failed: {e}"),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::SearchBackendUnavailable {
                message: format!("API error {status}: {body}"),
            });
        }

        let result: AggregateResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::SearchBackendUnavailable {
                    message: format!("failed to parse response: {e}"),
                })?;

        Ok(result.documents)
    }
}

/// Mock backend for testing: returns canned documents and records the
/// pipeline it was sent
pub struct MockBackend {
    documents: Vec<Value>,
    received: Mutex<Vec<Vec<Value>>>,
}

impl MockBackend {
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Pipelines received so far, in call order
    pub fn received_pipelines(&self) -> Vec<Vec<Value>> {
        self.received.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>> {
        self.received
            .lock()
            .expect("mock lock poisoned")
            .push(pipeline.to_vec());
        Ok(self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_backend_records_pipeline() {
        let backend = MockBackend::new(vec![json!({ "title": "Alien" })]);
        let pipeline = vec![json!({ "$match": { "year": 1979 } })];

        let docs = backend.aggregate(&pipeline).await.unwrap();
        assert_eq!(docs.len(), 1);

        let received = backend.received_pipelines();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], pipeline);
    }

    #[test]
    fn test_http_backend_requires_api_key() {
        let config = BackendConfig::default();
        let err = HttpSearchBackend::new(&config).unwrap_err();
        assert!(matches!(err, SearchError::Configuration { .. }));
    }
}
