//! Embed-and-store flush for accumulated chunks.

use crate::error::IngestError;
use crate::models::Chunk;
use crate::services::embedding::Embedder;
use crate::services::vector_store::VectorIndex;
use crate::utils::retry::{RetryConfig, with_retry};

/// Embed pending chunk texts and upsert the chunks into the language's
/// collection. Both network calls retry transient failures with backoff.
/// Returns the number of chunks stored.
pub async fn flush_chunks(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    language: &str,
    chunks: &mut Vec<Chunk>,
    texts: &mut Vec<String>,
) -> Result<usize, IngestError> {
    if texts.is_empty() {
        return Ok(0);
    }

    let retry_config = RetryConfig::default();

    let batch_texts = std::mem::take(texts);
    let embeddings = with_retry(&retry_config, || {
        embedder.embed_documents(batch_texts.clone())
    })
    .await
    .into_result()?;

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings.into_iter()) {
        chunk.dense_vector = embedding;
    }

    let batch = std::mem::take(chunks);
    let stored = batch.len();
    with_retry(&retry_config, || {
        index.upsert_chunks(language, batch.clone())
    })
    .await
    .into_result()?;

    Ok(stored)
}
