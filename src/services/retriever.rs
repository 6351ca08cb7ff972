//! Retrieval orchestration across the two operating modes.
//!
//! Full-corpus mode embeds the query once and delegates ranking to the
//! persisted index. Selected-text-only mode chunks the supplied passage,
//! embeds the chunks alongside the query, and ranks in memory; it never
//! touches the persisted index. Backend failures degrade to an empty
//! result set so the answer path stays up through transient outages.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::QueryError;
use crate::models::{RetrievalMode, RetrievalOutcome, RetrievalResult};
use crate::services::chunker::TextChunker;
use crate::services::embedding::Embedder;
use crate::services::vector_store::VectorIndex;

/// Source label attached to ephemeral selected-text results.
const SELECTED_TEXT_SOURCE: &str = "selected_text";
const SELECTED_TEXT_TITLE: &str = "Selected Text";

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: TextChunker,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunker: TextChunker,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            default_top_k,
        }
    }

    /// Retrieve ranked context for a query. Mode selection is a one-shot
    /// branch on whether a non-empty selected text was supplied.
    pub async fn retrieve(
        &self,
        query: &str,
        selected_text: Option<&str>,
        language: &str,
        top_k: Option<usize>,
    ) -> RetrievalOutcome {
        let top_k = top_k.unwrap_or(self.default_top_k);
        let selected = selected_text.map(str::trim).filter(|s| !s.is_empty());

        match selected {
            Some(text) => match self.search_selected_text(query, text, top_k).await {
                Ok(results) => RetrievalOutcome {
                    results,
                    mode: RetrievalMode::SelectedTextOnly,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "selected-text retrieval failed, degrading to empty results");
                    RetrievalOutcome::degraded()
                }
            },
            None => match self.search_corpus(query, language, top_k).await {
                Ok(results) => RetrievalOutcome {
                    results,
                    mode: RetrievalMode::FullBook,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "corpus retrieval failed, degrading to empty results");
                    RetrievalOutcome::degraded()
                }
            },
        }
    }

    /// Full-corpus mode: one query embedding, one k-NN search. The
    /// index's ranking is preserved as-is.
    async fn search_corpus(
        &self,
        query: &str,
        language: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, QueryError> {
        let query_vector = self.embedder.embed_query(query).await?;
        let results = self
            .index
            .search(language, query_vector, top_k as u64)
            .await?;
        Ok(results)
    }

    /// Selected-text-only mode: chunk the passage with the ingestion
    /// configuration, embed chunks and query, rank by cosine similarity.
    async fn search_selected_text(
        &self,
        query: &str,
        selected_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, QueryError> {
        let chunks = self.chunker.chunk_text(selected_text);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_vectors = self.embedder.embed_documents(chunks.clone()).await?;
        let query_vector = self.embedder.embed_query(query).await?;

        let mut scored: Vec<RetrievalResult> = chunks
            .into_iter()
            .zip(chunk_vectors.iter())
            .map(|(text, vector)| RetrievalResult {
                text,
                source: SELECTED_TEXT_SOURCE.to_string(),
                title: SELECTED_TEXT_TITLE.to_string(),
                score: cosine_similarity(&query_vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

/// Cosine similarity between two vectors, in [-1, 1]. Zero-magnitude
/// vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use crate::error::{EmbeddingError, VectorStoreError};
    use crate::models::{Chunk, ChunkingConfig};
    use crate::services::tokenizer::TokenCounter;
    use crate::services::vector_store::CollectionInfo;

    /// Deterministic bag-of-words embedder: identical text gives identical
    /// vectors, shared words give correlated ones.
    struct WordHashEmbedder;

    fn word_hash_vector(text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut vector = vec![0.0f32; 32];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % 32) as usize] += 1.0;
        }
        vector
    }

    #[async_trait]
    impl Embedder for WordHashEmbedder {
        async fn embed_documents(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| word_hash_vector(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(word_hash_vector(text))
        }
    }

    /// Embedder whose every call fails, for degradation tests.
    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_documents(
            &self,
            _texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::ConnectionError("unreachable".to_string()))
        }

        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::ConnectionError("unreachable".to_string()))
        }
    }

    /// Index double that counts searches and returns canned results.
    struct CountingIndex {
        searches: AtomicUsize,
        results: Vec<RetrievalResult>,
    }

    impl CountingIndex {
        fn new(results: Vec<RetrievalResult>) -> Self {
            Self {
                searches: AtomicUsize::new(0),
                results,
            }
        }

        fn search_count(&self) -> usize {
            self.searches.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl VectorIndex for CountingIndex {
        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            Ok(true)
        }

        async fn collection_info(
            &self,
            _language: &str,
        ) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(Some(CollectionInfo {
                points_count: self.results.len() as u64,
            }))
        }

        async fn ensure_collection(&self, _language: &str) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert_chunks(
            &self,
            _language: &str,
            _chunks: Vec<Chunk>,
        ) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn search(
            &self,
            _language: &str,
            _query_vector: Vec<f32>,
            limit: u64,
        ) -> Result<Vec<RetrievalResult>, VectorStoreError> {
            self.searches.fetch_add(1, AtomicOrdering::SeqCst);
            let mut results = self.results.clone();
            results.truncate(limit as usize);
            Ok(results)
        }
    }

    fn test_chunker() -> TextChunker {
        let config = ChunkingConfig {
            chunk_size: 64,
            chunk_overlap: 16,
        };
        TextChunker::new(&config, TokenCounter::new().unwrap())
    }

    fn canned_result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            source: "https://example.com/ch1".to_string(),
            title: "Chapter 1".to_string(),
            score,
        }
    }

    fn retriever(
        embedder: Arc<dyn Embedder>,
        index: Arc<CountingIndex>,
    ) -> Retriever {
        Retriever::new(embedder, index, test_chunker(), 5)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_full_corpus_mode_uses_index_ranking() {
        let index = Arc::new(CountingIndex::new(vec![
            canned_result("first", 0.9),
            canned_result("second", 0.7),
        ]));
        let r = retriever(Arc::new(WordHashEmbedder), index.clone());

        let outcome = r.retrieve("what is physical AI", None, "en", None).await;
        assert_eq!(outcome.mode, RetrievalMode::FullBook);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].text, "first");
        assert_eq!(index.search_count(), 1);
    }

    #[tokio::test]
    async fn test_selected_text_mode_never_queries_index() {
        let index = Arc::new(CountingIndex::new(vec![canned_result("corpus", 0.9)]));
        let r = retriever(Arc::new(WordHashEmbedder), index.clone());

        let outcome = r
            .retrieve(
                "how do robots balance",
                Some("Humanoid robots balance using inverse kinematics."),
                "en",
                None,
            )
            .await;

        assert_eq!(outcome.mode, RetrievalMode::SelectedTextOnly);
        assert!(!outcome.results.is_empty());
        assert_eq!(index.search_count(), 0);
        assert_eq!(outcome.results[0].source, "selected_text");
    }

    #[tokio::test]
    async fn test_empty_selected_text_falls_back_to_corpus() {
        let index = Arc::new(CountingIndex::new(vec![canned_result("corpus", 0.9)]));
        let r = retriever(Arc::new(WordHashEmbedder), index.clone());

        let outcome = r.retrieve("question here", Some("   "), "en", None).await;
        assert_eq!(outcome.mode, RetrievalMode::FullBook);
        assert_eq!(index.search_count(), 1);
    }

    #[tokio::test]
    async fn test_selected_text_dominant_sentence_ranks_first() {
        let index = Arc::new(CountingIndex::new(Vec::new()));
        let r = Retriever::new(
            Arc::new(WordHashEmbedder),
            index,
            // Small budget so each sentence lands in its own chunk
            TextChunker::new(
                &ChunkingConfig {
                    chunk_size: 12,
                    chunk_overlap: 0,
                },
                TokenCounter::new().unwrap(),
            ),
            5,
        );

        let selected = "Humanoid robots balance using inverse kinematics. \
                        Plants convert sunlight into sugars. \
                        Medieval castles had thick stone walls.";
        let outcome = r
            .retrieve("how do humanoid robots balance", Some(selected), "en", Some(1))
            .await;

        assert_eq!(outcome.mode, RetrievalMode::SelectedTextOnly);
        assert_eq!(outcome.results.len(), 1);
        assert!(
            outcome.results[0]
                .text
                .contains("Humanoid robots balance using inverse kinematics")
        );
    }

    #[tokio::test]
    async fn test_fewer_results_than_top_k() {
        let index = Arc::new(CountingIndex::new(Vec::new()));
        let r = retriever(Arc::new(WordHashEmbedder), index);

        let outcome = r
            .retrieve("balance", Some("One short sentence."), "en", Some(10))
            .await;
        assert_eq!(outcome.mode, RetrievalMode::SelectedTextOnly);
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_empty() {
        let index = Arc::new(CountingIndex::new(vec![canned_result("corpus", 0.9)]));
        let r = retriever(Arc::new(FailingEmbedder), index.clone());

        let outcome = r.retrieve("what is physical AI", None, "en", None).await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.mode, RetrievalMode::Error);
        assert_eq!(index.search_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_in_selected_mode_degrades() {
        let index = Arc::new(CountingIndex::new(Vec::new()));
        let r = retriever(Arc::new(FailingEmbedder), index.clone());

        let outcome = r
            .retrieve("query", Some("Some passage to search."), "en", None)
            .await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.mode, RetrievalMode::Error);
        assert_eq!(index.search_count(), 0);
    }

    #[tokio::test]
    async fn test_selected_results_sorted_descending() {
        let index = Arc::new(CountingIndex::new(Vec::new()));
        let r = retriever(Arc::new(WordHashEmbedder), index);

        let selected = "Humanoid robots balance using inverse kinematics. \
                        Plants convert sunlight into sugars. \
                        Robots balance better with feedback control.";
        let outcome = r
            .retrieve("how do robots balance", Some(selected), "en", None)
            .await;

        for pair in outcome.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
