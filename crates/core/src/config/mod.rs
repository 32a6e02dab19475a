//! Configuration management for the ReelSearch demos
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector-search backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai, mock
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for the embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use (must match the model used to embed stored documents)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the hosted data API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// API key for the data API
    pub api_key: Option<String>,

    /// Named data source (cluster) to query
    #[serde(default = "default_data_source")]
    pub data_source: String,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Request timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Vector index name
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Field path holding the stored vectors
    #[serde(default = "default_vector_field")]
    pub vector_field: String,

    /// Dimensionality declared on the index; query vectors must match
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Fields indexed as filterable; constraints on these fields are applied
    /// inline during the similarity scan instead of after the top-K cut
    #[serde(default)]
    pub filterable_fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Default number of results to return
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Default candidate pool size (recall/latency trade-off)
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,
}

// Default value functions
fn default_embedding_provider() -> String { "openai".to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_embedding_timeout() -> u64 { 30 }
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_data_source() -> String { "Cluster0".to_string() }
fn default_database() -> String { "sample_mflix".to_string() }
fn default_collection() -> String { "embedded_movies".to_string() }
fn default_backend_timeout() -> u64 { 30 }
fn default_index_name() -> String { crate::DEFAULT_INDEX_NAME.to_string() }
fn default_vector_field() -> String { crate::DEFAULT_VECTOR_FIELD.to_string() }
fn default_result_limit() -> usize { 5 }
fn default_candidate_pool() -> usize { 150 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_key: None,
            data_source: default_data_source(),
            database: default_database(),
            collection: default_collection(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            vector_field: default_vector_field(),
            dimension: default_embedding_dimension(),
            filterable_fields: Vec::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            candidate_pool: default_candidate_pool(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            backend: BackendConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__EMBEDDING__API_KEY=sk-...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get embedding timeout as Duration
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }

    /// Get backend timeout as Duration
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}
