//! Ingestion pipeline: chunk documents and flush embedded chunks to the
//! index in bounded batches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::models::{Chunk, Document};
use crate::services::batch::flush_chunks;
use crate::services::chunker::TextChunker;
use crate::services::embedding::Embedder;
use crate::services::vector_store::VectorIndex;

/// Counters reported when an ingestion run completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub pages_discovered: u64,
    pub pages_processed: u64,
    pub pages_skipped: u64,
    pub chunks_created: u64,
    pub duration_ms: u64,
}

/// Buffers chunks for one language and flushes them to the index once
/// `flush_threshold` accumulate, bounding memory on large corpora.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: TextChunker,
    language: String,
    flush_threshold: usize,
    pending_chunks: Vec<Chunk>,
    pending_texts: Vec<String>,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunker: TextChunker,
        language: impl Into<String>,
        flush_threshold: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            language: language.into(),
            flush_threshold: flush_threshold.max(1),
            pending_chunks: Vec::new(),
            pending_texts: Vec::new(),
        }
    }

    /// Chunk a document into the buffer, flushing as the threshold is
    /// crossed. Returns the number of chunks the document produced.
    pub async fn add_document(&mut self, document: &Document) -> Result<usize, IngestError> {
        let chunks = self.chunker.chunk(document);
        let created = chunks.len();

        for chunk in chunks {
            self.pending_texts.push(chunk.text.clone());
            self.pending_chunks.push(chunk);

            if self.pending_chunks.len() >= self.flush_threshold {
                self.flush().await?;
            }
        }

        Ok(created)
    }

    /// Drain whatever remains in the buffer.
    pub async fn finish(&mut self) -> Result<(), IngestError> {
        self.flush().await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), IngestError> {
        let stored = flush_chunks(
            self.embedder.as_ref(),
            self.index.as_ref(),
            &self.language,
            &mut self.pending_chunks,
            &mut self.pending_texts,
        )
        .await?;

        if stored > 0 {
            tracing::debug!(stored, language = %self.language, "flushed chunk batch");
        }

        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.pending_chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::error::{EmbeddingError, VectorStoreError};
    use crate::models::{ChunkingConfig, RetrievalResult};
    use crate::services::tokenizer::TokenCounter;
    use crate::services::vector_store::CollectionInfo;

    struct ZeroEmbedder;

    #[async_trait]
    impl Embedder for ZeroEmbedder {
        async fn embed_documents(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.0, 1.0])
        }
    }

    /// Records the size of every upsert batch it receives.
    #[derive(Default)]
    struct BatchRecordingIndex {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl VectorIndex for BatchRecordingIndex {
        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            Ok(true)
        }

        async fn collection_info(
            &self,
            _language: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(None)
        }

        async fn ensure_collection(&self, _language: &str) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert_chunks(
            &self,
            _language: &str,
            chunks: Vec<Chunk>,
        ) -> Result<(), VectorStoreError> {
            self.batches.lock().unwrap().push(chunks.len());
            Ok(())
        }

        async fn search(
            &self,
            _language: &str,
            _query_vector: Vec<f32>,
            _limit: u64,
        ) -> Result<Vec<RetrievalResult>, VectorStoreError> {
            Ok(Vec::new())
        }
    }

    fn small_chunker() -> TextChunker {
        TextChunker::new(
            &ChunkingConfig {
                chunk_size: 7,
                chunk_overlap: 0,
            },
            TokenCounter::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_flush_on_threshold_and_completion() {
        let index = Arc::new(BatchRecordingIndex::default());
        let mut pipeline = IngestionPipeline::new(
            Arc::new(ZeroEmbedder),
            index.clone(),
            small_chunker(),
            "en",
            3,
        );

        // Nine short sentences with a 7-token budget hold at most two
        // sentences per chunk, forcing mid-run flushes
        let document = Document::new(
            "src",
            "Title",
            "Robots walk. Robots run. Robots jump. Robots climb. \
             Robots swim. Robots fly. Robots dig. Robots sing. Robots rest.",
            "en",
        );

        let created = pipeline.add_document(&document).await.unwrap();
        pipeline.finish().await.unwrap();

        assert!(created > 3, "expected enough chunks to cross the threshold");
        assert_eq!(pipeline.pending(), 0);

        let batches = index.batches.lock().unwrap().clone();
        let total: usize = batches.iter().sum();
        assert_eq!(total, created);
        // Every flushed batch is bounded by the threshold
        assert!(batches.iter().all(|&size| size <= 3));
        // At least one flush happened before completion
        assert!(batches.len() >= 2);
    }

    #[tokio::test]
    async fn test_empty_document_creates_nothing() {
        let index = Arc::new(BatchRecordingIndex::default());
        let mut pipeline = IngestionPipeline::new(
            Arc::new(ZeroEmbedder),
            index.clone(),
            small_chunker(),
            "en",
            100,
        );

        let document = Document::new("src", "Title", "", "en");
        let created = pipeline.add_document(&document).await.unwrap();
        pipeline.finish().await.unwrap();

        assert_eq!(created, 0);
        assert!(index.batches.lock().unwrap().is_empty());
    }
}
