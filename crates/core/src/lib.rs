//! ReelSearch Core Library
//!
//! Shared code for the ReelSearch demos including:
//! - Vector search pipeline construction and filter merging
//! - Embedding client abstraction
//! - Search backend abstraction
//! - Result projection
//! - Error types and handling
//! - Configuration management

pub mod backend;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod filters;
pub mod pipeline;
pub mod projection;
pub mod search;

// Re-export commonly used types
pub use backend::SearchBackend;
pub use config::AppConfig;
pub use embeddings::{EmbedMode, Embedder};
pub use errors::{Result, SearchError};
pub use filters::{FilterKey, SearchFilters};
pub use pipeline::{PipelineBuilder, PipelineStage, SearchRequest};
pub use projection::MovieHit;
pub use search::{SearchResponse, SemanticSearch};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Default vector index name
pub const DEFAULT_INDEX_NAME: &str = "vector_index";

/// Default field path holding stored vectors
pub const DEFAULT_VECTOR_FIELD: &str = "plot_embedding";
