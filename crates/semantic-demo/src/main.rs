//! ReelSearch Semantic Search Demo
//!
//! One-shot semantic movie search:
//! embed the query, build the pipeline, run it, print ranked hits.
//!
//! Usage:
//!   semantic-search "space exploration and alien encounters" genres=Sci-Fi minYear=1990

use anyhow::{bail, Context};
use reelsearch_core::backend::HttpSearchBackend;
use reelsearch_core::embeddings::create_embedder;
use reelsearch_core::{
    AppConfig, FilterKey, MovieHit, SearchFilters, SearchRequest, SemanticSearch, VERSION,
};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("ReelSearch semantic search demo v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((query, filter_args)) = args.split_first() else {
        bail!("usage: semantic-search <query> [genres=A|B] [minYear=N] [maxYear=N] [minRating=X]");
    };

    let filters = parse_filters(filter_args)?;

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    let embedder = create_embedder(&config.embedding)?;
    let backend = Arc::new(HttpSearchBackend::new(&config.backend)?);
    let search = SemanticSearch::new(embedder, backend, config.index.clone());

    let request = SearchRequest::new(query.clone())
        .with_limit(config.search.result_limit)
        .with_candidate_pool(config.search.candidate_pool)
        .with_filters(filters);

    let response = search.search(&request).await?;

    if response.hits.is_empty() {
        println!("No matches for \"{}\".", response.query);
        return Ok(());
    }

    println!(
        "Top {} matches for \"{}\" ({}ms):\n",
        response.hits.len(),
        response.query,
        response.query_time_ms
    );
    for (rank, hit) in response.hits.iter().enumerate() {
        print_hit(rank + 1, hit);
    }

    Ok(())
}

/// Parse trailing KEY=VALUE arguments through the closed filter-key set
fn parse_filters(args: &[String]) -> anyhow::Result<SearchFilters> {
    let mut filters = SearchFilters::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("filter argument must be KEY=VALUE, got: {arg}");
        };
        let key: FilterKey = key.parse()?;
        filters.apply(key, value)?;
    }
    Ok(filters)
}

fn print_hit(rank: usize, hit: &MovieHit) {
    let year = hit.year.map_or_else(|| "????".to_string(), |y| y.to_string());
    println!("{rank}. {} ({year})  [{:.1}% match]", hit.title, hit.score * 100.0);
    if !hit.genres.is_empty() {
        println!("   Genres: {}", hit.genres.join(", "));
    }
    if !hit.cast.is_empty() {
        println!("   Starring: {}", hit.cast.join(", "));
    }
    if let Some(rating) = hit.rating {
        println!("   Rating: {rating:.1}/10");
    }
    if !hit.plot.is_empty() {
        println!("   {}", hit.plot);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let args = vec![
            "genres=Sci-Fi|Adventure".to_string(),
            "minYear=1990".to_string(),
            "minRating=7.0".to_string(),
        ];
        let filters = parse_filters(&args).unwrap();
        assert_eq!(filters.genres.as_ref().unwrap().len(), 2);
        assert_eq!(filters.min_year, Some(1990));
        assert_eq!(filters.min_rating, Some(7.0));
    }

    #[test]
    fn test_parse_filters_rejects_unknown_key() {
        let args = vec!["director=Nolan".to_string()];
        assert!(parse_filters(&args).is_err());
    }

    #[test]
    fn test_parse_filters_rejects_bare_argument() {
        let args = vec!["genres".to_string()];
        assert!(parse_filters(&args).is_err());
    }
}
