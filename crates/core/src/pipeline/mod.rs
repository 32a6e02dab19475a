//! Vector search pipeline construction
//!
//! Turns a validated `SearchRequest` plus an already-embedded query vector
//! into the ordered stage list sent to the search backend. Stages are typed
//! variants appended in a fixed order, never spliced positionally.
//!
//! Filter placement: constraints on fields the index declares as filterable
//! ride inside the vector-search stage itself and narrow the candidate pool
//! before ranking. Everything else merges into a single match stage appended
//! after the vector-search stage — which means it filters the already
//! truncated top-K, so a tight filter can return fewer than `limit` results
//! even when more relevant documents exist in the full corpus. Each populated
//! filter field lands in exactly one of the two places.

use crate::config::IndexConfig;
use crate::errors::{Result, SearchError};
use crate::filters::SearchFilters;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

/// Document field holding the genre array
pub const GENRES_FIELD: &str = "genres";

/// Document field holding the release year
pub const YEAR_FIELD: &str = "year";

/// Document field holding the rating
pub const RATING_FIELD: &str = "imdb.rating";

/// Synthetic field the similarity score is projected into
pub const SCORE_FIELD: &str = "score";

/// Search request parameters; immutable once built
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    /// Query text
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    /// Maximum results to return
    pub limit: usize,

    /// Candidate pool size examined before truncating to `limit`
    pub candidate_pool: usize,

    /// Structured constraints
    #[serde(default)]
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// Create a request with default limit and candidate pool
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 5,
            candidate_pool: 150,
            filters: SearchFilters::default(),
        }
    }

    /// Set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the candidate pool size
    pub fn with_candidate_pool(mut self, pool: usize) -> Self {
        self.candidate_pool = pool;
        self
    }

    /// Attach structured filters
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Validate the request shape before any network call
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|e| SearchError::InvalidArgument {
            message: e.to_string(),
            field: Some("query".to_string()),
        })?;

        if self.limit == 0 {
            return Err(SearchError::invalid_field("limit must be positive", "limit"));
        }
        if self.candidate_pool == 0 {
            return Err(SearchError::invalid_field(
                "candidate_pool must be positive",
                "candidate_pool",
            ));
        }
        // Recall is meaningless when the pool is smaller than the cut
        if self.limit > self.candidate_pool {
            return Err(SearchError::invalid_field(
                format!(
                    "limit ({}) exceeds candidate_pool ({})",
                    self.limit, self.candidate_pool
                ),
                "limit",
            ));
        }

        self.filters.validate()
    }
}

/// The vector-search stage itself
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchStage {
    pub index: String,
    pub path: String,
    pub query_vector: Vec<f32>,
    pub num_candidates: usize,
    pub limit: usize,
    /// Constraints applied during the similarity scan (pre-ranking);
    /// requires the fields to be indexed as filterable
    pub inline_filter: Option<Map<String, Value>>,
}

/// Constraint stage applied after ranking, on the truncated top-K
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    pub criteria: Map<String, Value>,
}

/// Projection stage: which fields to return and where the score goes
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionStage {
    pub fields: Vec<String>,
    pub score_field: String,
}

impl ProjectionStage {
    /// The fixed allow-list of movie fields returned to callers
    pub fn standard() -> Self {
        Self {
            fields: vec![
                "title".to_string(),
                "plot".to_string(),
                YEAR_FIELD.to_string(),
                GENRES_FIELD.to_string(),
                "cast".to_string(),
                "poster".to_string(),
                RATING_FIELD.to_string(),
            ],
            score_field: SCORE_FIELD.to_string(),
        }
    }
}

/// One stage of the aggregation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    VectorSearch(VectorSearchStage),
    Filter(FilterStage),
    Project(ProjectionStage),
}

impl PipelineStage {
    /// Serialize this stage into its backend document form
    pub fn to_document(&self) -> Value {
        match self {
            PipelineStage::VectorSearch(stage) => {
                let mut body = Map::new();
                body.insert("index".to_string(), json!(stage.index));
                body.insert("path".to_string(), json!(stage.path));
                body.insert("queryVector".to_string(), json!(stage.query_vector));
                body.insert("numCandidates".to_string(), json!(stage.num_candidates));
                body.insert("limit".to_string(), json!(stage.limit));
                if let Some(filter) = &stage.inline_filter {
                    body.insert("filter".to_string(), Value::Object(filter.clone()));
                }
                json!({ "$vectorSearch": body })
            }
            PipelineStage::Filter(stage) => {
                json!({ "$match": Value::Object(stage.criteria.clone()) })
            }
            PipelineStage::Project(stage) => {
                let mut body = Map::new();
                for field in &stage.fields {
                    body.insert(field.clone(), json!(1));
                }
                body.insert(
                    stage.score_field.clone(),
                    json!({ "$meta": "vectorSearchScore" }),
                );
                json!({ "$project": body })
            }
        }
    }
}

/// Builds the stage list for a request against a configured index
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    index: IndexConfig,
}

impl PipelineBuilder {
    /// Create a builder for the given index
    pub fn new(index: IndexConfig) -> Self {
        Self { index }
    }

    /// Build the ordered stage list: the vector-search stage, then at most
    /// one post-filter stage. The projection stage is appended by the caller
    /// at dispatch time.
    pub fn build(&self, request: &SearchRequest, query_vector: &[f32]) -> Result<Vec<PipelineStage>> {
        request.check()?;

        if query_vector.is_empty() {
            return Err(SearchError::invalid_field(
                "query vector is empty",
                "query_vector",
            ));
        }

        let (inline, post) = self.split_constraints(&request.filters);

        let mut stages = vec![PipelineStage::VectorSearch(VectorSearchStage {
            index: self.index.name.clone(),
            path: self.index.vector_field.clone(),
            query_vector: query_vector.to_vec(),
            num_candidates: request.candidate_pool,
            limit: request.limit,
            inline_filter: if inline.is_empty() { None } else { Some(inline) },
        })];

        if !post.is_empty() {
            stages.push(PipelineStage::Filter(FilterStage { criteria: post }));
        }

        Ok(stages)
    }

    /// Route each populated constraint to exactly one placement. Constraints
    /// are built in a fixed order (genres, year, rating) so identical
    /// requests always yield structurally identical pipelines.
    fn split_constraints(&self, filters: &SearchFilters) -> (Map<String, Value>, Map<String, Value>) {
        let mut inline = Map::new();
        let mut post = Map::new();

        let mut route = |field: &str, constraint: Value| {
            if self.index.filterable_fields.iter().any(|f| f == field) {
                inline.insert(field.to_string(), constraint);
            } else {
                post.insert(field.to_string(), constraint);
            }
        };

        if let Some(genres) = &filters.genres {
            if !genres.is_empty() {
                // BTreeSet iteration keeps the value list deterministic
                let values: Vec<&String> = genres.iter().collect();
                route(GENRES_FIELD, json!({ "$in": values }));
            }
        }

        // Year bounds combine into a single range constraint (AND semantics)
        let mut year = Map::new();
        if let Some(min) = filters.min_year {
            year.insert("$gte".to_string(), json!(min));
        }
        if let Some(max) = filters.max_year {
            year.insert("$lte".to_string(), json!(max));
        }
        if !year.is_empty() {
            route(YEAR_FIELD, Value::Object(year));
        }

        if let Some(rating) = filters.min_rating {
            route(RATING_FIELD, json!({ "$gte": rating }));
        }

        (inline, post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::SearchFilters;

    fn builder() -> PipelineBuilder {
        PipelineBuilder::new(IndexConfig::default())
    }

    fn vector() -> Vec<f32> {
        vec![0.1, 0.2, 0.3]
    }

    #[test]
    fn test_empty_filters_yield_single_stage() {
        let request = SearchRequest::new("space exploration");
        let stages = builder().build(&request, &vector()).unwrap();
        assert_eq!(stages.len(), 1);
        assert!(matches!(stages[0], PipelineStage::VectorSearch(_)));

        let PipelineStage::VectorSearch(stage) = &stages[0] else {
            unreachable!()
        };
        assert!(stage.inline_filter.is_none());
        assert_eq!(stage.num_candidates, 150);
        assert_eq!(stage.limit, 5);
    }

    #[test]
    fn test_genre_filter_becomes_separate_stage() {
        let request = SearchRequest::new("space exploration and alien encounters")
            .with_limit(5)
            .with_candidate_pool(150)
            .with_filters(SearchFilters::new().with_genres(["Sci-Fi"]));

        let stages = builder().build(&request, &vector()).unwrap();
        assert_eq!(stages.len(), 2);

        let PipelineStage::Filter(filter) = &stages[1] else {
            panic!("expected a post-filter stage");
        };
        assert_eq!(
            filter.criteria.get(GENRES_FIELD).unwrap(),
            &json!({ "$in": ["Sci-Fi"] })
        );
    }

    #[test]
    fn test_year_bounds_merge_into_single_range() {
        let request = SearchRequest::new("heist").with_filters(
            SearchFilters::new().with_min_year(2000).with_max_year(2020),
        );

        let stages = builder().build(&request, &vector()).unwrap();
        assert_eq!(stages.len(), 2);

        let PipelineStage::Filter(filter) = &stages[1] else {
            panic!("expected a post-filter stage");
        };
        assert_eq!(filter.criteria.len(), 1);
        assert_eq!(
            filter.criteria.get(YEAR_FIELD).unwrap(),
            &json!({ "$gte": 2000, "$lte": 2020 })
        );
    }

    #[test]
    fn test_all_filters_merge_into_one_post_stage() {
        let request = SearchRequest::new("heist").with_filters(
            SearchFilters::new()
                .with_genres(["Crime", "Thriller"])
                .with_min_year(1990)
                .with_min_rating(7.0),
        );

        let stages = builder().build(&request, &vector()).unwrap();
        assert_eq!(stages.len(), 2);

        let PipelineStage::Filter(filter) = &stages[1] else {
            panic!("expected a post-filter stage");
        };
        assert_eq!(filter.criteria.len(), 3);
        assert_eq!(
            filter.criteria.get(RATING_FIELD).unwrap(),
            &json!({ "$gte": 7.0 })
        );
    }

    #[test]
    fn test_filterable_field_goes_inline_not_post() {
        let index = IndexConfig {
            filterable_fields: vec![GENRES_FIELD.to_string()],
            ..Default::default()
        };
        let request = SearchRequest::new("space").with_filters(
            SearchFilters::new()
                .with_genres(["Sci-Fi"])
                .with_min_rating(8.0),
        );

        let stages = PipelineBuilder::new(index).build(&request, &vector()).unwrap();
        assert_eq!(stages.len(), 2);

        let PipelineStage::VectorSearch(search) = &stages[0] else {
            unreachable!()
        };
        let inline = search.inline_filter.as_ref().unwrap();
        assert!(inline.contains_key(GENRES_FIELD));

        // Rating stays in the post-filter; genre appears nowhere else
        let PipelineStage::Filter(filter) = &stages[1] else {
            panic!("expected a post-filter stage");
        };
        assert!(filter.criteria.contains_key(RATING_FIELD));
        assert!(!filter.criteria.contains_key(GENRES_FIELD));
    }

    #[test]
    fn test_limit_exceeding_pool_is_rejected() {
        let request = SearchRequest::new("space")
            .with_limit(200)
            .with_candidate_pool(100);
        let err = builder().build(&request, &vector()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_zero_limit_and_empty_query_rejected() {
        let request = SearchRequest::new("space").with_limit(0);
        assert!(builder().build(&request, &vector()).is_err());

        let request = SearchRequest::new("");
        assert!(builder().build(&request, &vector()).is_err());
    }

    #[test]
    fn test_empty_query_vector_rejected() {
        let request = SearchRequest::new("space");
        let err = builder().build(&request, &[]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_build_is_deterministic() {
        let request = SearchRequest::new("space").with_filters(
            SearchFilters::new()
                .with_genres(["Western", "Adventure", "Sci-Fi"])
                .with_min_year(1960)
                .with_max_year(1999)
                .with_min_rating(6.0),
        );

        let first = builder().build(&request, &vector()).unwrap();
        let second = builder().build(&request, &vector()).unwrap();
        assert_eq!(first, second);

        let first_docs: Vec<Value> = first.iter().map(PipelineStage::to_document).collect();
        let second_docs: Vec<Value> = second.iter().map(PipelineStage::to_document).collect();
        assert_eq!(first_docs, second_docs);
    }

    #[test]
    fn test_vector_search_document_shape() {
        let request = SearchRequest::new("space exploration and alien encounters")
            .with_limit(5)
            .with_candidate_pool(150)
            .with_filters(SearchFilters::new().with_genres(["Sci-Fi"]));

        let stages = builder().build(&request, &vector()).unwrap();
        let doc = stages[0].to_document();
        let body = doc.get("$vectorSearch").unwrap();
        assert_eq!(body.get("index").unwrap(), "vector_index");
        assert_eq!(body.get("path").unwrap(), "plot_embedding");
        assert_eq!(body.get("numCandidates").unwrap(), 150);
        assert_eq!(body.get("limit").unwrap(), 5);
        assert!(body.get("filter").is_none());

        let doc = stages[1].to_document();
        assert!(doc.get("$match").is_some());
    }

    #[test]
    fn test_projection_document_shape() {
        let doc = PipelineStage::Project(ProjectionStage::standard()).to_document();
        let body = doc.get("$project").unwrap();
        assert_eq!(body.get("title").unwrap(), 1);
        assert_eq!(body.get("cast").unwrap(), 1);
        assert_eq!(
            body.get(SCORE_FIELD).unwrap(),
            &json!({ "$meta": "vectorSearchScore" })
        );
    }
}
