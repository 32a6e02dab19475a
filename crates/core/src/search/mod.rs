//! Semantic search orchestration
//!
//! One linear pipeline per query: embed the text, build the stage list, run
//! it against the backend, project the results. The search call cannot start
//! before the embedding completes (the query vector is its input), so the two
//! external calls are strictly sequential. Nothing is cached or mutated
//! across calls; independent queries need no coordination.

use crate::backend::SearchBackend;
use crate::config::IndexConfig;
use crate::embeddings::{EmbedMode, Embedder};
use crate::errors::{Result, SearchError};
use crate::pipeline::{PipelineBuilder, PipelineStage, ProjectionStage, SearchRequest};
use crate::projection::{project, MovieHit};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Projected hits, ordered by descending similarity score
    pub hits: Vec<MovieHit>,

    /// The query text that produced these hits
    pub query: String,

    /// Query processing time in milliseconds
    pub query_time_ms: u64,
}

/// Semantic search over a hosted vector index.
///
/// Both collaborators are injected, never reached through ambient state;
/// tests swap in fakes.
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    backend: Arc<dyn SearchBackend>,
    builder: PipelineBuilder,
    index_dimension: usize,
}

impl SemanticSearch {
    /// Create a search service for the given index
    pub fn new(
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn SearchBackend>,
        index: IndexConfig,
    ) -> Self {
        let index_dimension = index.dimension;
        Self {
            embedder,
            backend,
            builder: PipelineBuilder::new(index),
            index_dimension,
        }
    }

    /// Run one search request end to end.
    ///
    /// Either the full pipeline succeeds and yields a result sequence, or it
    /// fails and yields nothing; zero hits is a valid empty success, not an
    /// error.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();

        request.check()?;

        let query_vector = self.embedder.embed(&request.query, EmbedMode::Query).await?;

        // The index declares a fixed dimensionality; a mismatched embedder is
        // a deployment problem, detected here at call time
        if query_vector.len() != self.index_dimension {
            return Err(SearchError::Configuration {
                message: format!(
                    "embedder produced {} dimensions but index '{}' expects {}",
                    query_vector.len(),
                    self.embedder.model_name(),
                    self.index_dimension
                ),
            });
        }

        let mut stages = self.builder.build(request, &query_vector)?;
        stages.push(PipelineStage::Project(ProjectionStage::standard()));

        let documents: Vec<Value> = stages.iter().map(PipelineStage::to_document).collect();
        let raw = self.backend.aggregate(&documents).await?;
        let hits = project(&raw);

        let query_time_ms = start.elapsed().as_millis() as u64;

        info!(
            query = %request.query,
            hits = hits.len(),
            latency_ms = query_time_ms,
            "Search completed"
        );

        Ok(SearchResponse {
            hits,
            query: request.query.clone(),
            query_time_ms,
        })
    }
}
