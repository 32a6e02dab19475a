//! ReelSearch RAG Demo
//!
//! Retrieval-augmented generation over the movie collection: retrieve the
//! closest plots, hand them to a chat model as context, print the answer.
//!
//! Usage:
//!   rag "what should I watch if I like slow-burn space movies?"

mod chat;

use anyhow::{bail, Context};
use chat::ChatClient;
use reelsearch_core::backend::HttpSearchBackend;
use reelsearch_core::embeddings::create_embedder;
use reelsearch_core::{AppConfig, MovieHit, SearchRequest, SemanticSearch, VERSION};
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

    info!("ReelSearch RAG demo v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [question] = args.as_slice() else {
        bail!("usage: rag <question>");
    };

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    let embedder = create_embedder(&config.embedding)?;
    let backend = Arc::new(HttpSearchBackend::new(&config.backend)?);
    let search = SemanticSearch::new(embedder, backend, config.index.clone());

    // Retrieval: same core pipeline as the search demo
    let request = SearchRequest::new(question.clone())
        .with_limit(config.search.result_limit)
        .with_candidate_pool(config.search.candidate_pool);
    let response = search.search(&request).await?;

    if response.hits.is_empty() {
        println!("No relevant movies found to ground an answer.");
        return Ok(());
    }

    info!(hits = response.hits.len(), "Retrieved context");

    // Generation: the chat model reuses the embedding provider credentials
    let api_key = config
        .embedding
        .api_key
        .clone()
        .context("embedding api_key is not set")?;
    let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let chat = ChatClient::new(api_key, model, config.embedding.api_base.clone())?;

    let context_block = build_context(&response.hits);
    let answer = chat.answer(question, &context_block).await?;

    println!("{answer}\n");
    println!("Based on:");
    for hit in &response.hits {
        let year = hit.year.map_or_else(|| "????".to_string(), |y| y.to_string());
        println!("  - {} ({year}), {:.1}% match", hit.title, hit.score * 100.0);
    }

    Ok(())
}

/// Format retrieved hits into the context block fed to the chat model
fn build_context(hits: &[MovieHit]) -> String {
    hits.iter()
        .map(|hit| {
            let year = hit.year.map_or_else(|| "unknown year".to_string(), |y| y.to_string());
            format!(
                "Title: {} ({year})\nGenres: {}\nPlot: {}",
                hit.title,
                hit.genres.join(", "),
                hit.plot
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
