//! Command implementations.

mod ask;
mod config;
mod ingest;
mod search;
mod status;

pub use ask::{AskArgs, handle_ask};
pub use config::{ConfigCommand, handle_config};
pub use ingest::{IngestArgs, handle_ingest};
pub use search::{SearchArgs, handle_search};
pub use status::handle_status;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{
    Embedder, EmbeddingClient, QdrantIndex, Retriever, TextChunker, TokenCounter, VectorIndex,
};

/// Build the chunker from configuration. Tokenizer construction failure
/// is a fatal configuration error.
pub(crate) fn build_chunker(config: &Config) -> Result<TextChunker> {
    let counter = TokenCounter::new().context("failed to initialize tokenizer")?;
    Ok(TextChunker::new(&config.chunking, counter))
}

pub(crate) fn build_embedder(config: &Config) -> Result<Arc<EmbeddingClient>> {
    let client = EmbeddingClient::new(&config.embedding)
        .context("failed to create embedding client")?;
    Ok(Arc::new(client))
}

pub(crate) fn build_index(config: &Config) -> Result<Arc<QdrantIndex>> {
    let index = QdrantIndex::new(&config.vector_store, config.embedding.dimension as u64)
        .context("failed to create vector index client")?;
    Ok(Arc::new(index))
}

pub(crate) fn build_retriever(config: &Config) -> Result<Retriever> {
    let chunker = build_chunker(config)?;
    let embedder: Arc<dyn Embedder> = build_embedder(config)?;
    let index: Arc<dyn VectorIndex> = build_index(config)?;
    Ok(Retriever::new(
        embedder,
        index,
        chunker,
        config.retrieval.top_k,
    ))
}

/// Resolve and validate the request language against the configured
/// language partitions.
pub(crate) fn resolve_language(config: &Config, language: Option<&str>) -> Result<String> {
    let language = language
        .unwrap_or(&config.vector_store.default_language)
        .to_string();

    if !config.vector_store.languages.contains(&language) {
        anyhow::bail!(
            "unsupported language '{}' (configured: {})",
            language,
            config.vector_store.languages.join(", ")
        );
    }

    Ok(language)
}
