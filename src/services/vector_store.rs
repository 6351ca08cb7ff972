//! Vector index abstraction and the Qdrant backend.
//!
//! Collections are partitioned by language (`{prefix}_{language}`) and use
//! cosine distance. Point ids are derived deterministically from chunk ids
//! so re-ingestion overwrites rather than duplicates.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use std::collections::HashMap;

use crate::error::VectorStoreError;
use crate::models::{Chunk, RetrievalResult, VectorStoreConfig};

/// Collection information.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Persisted vector storage with k-nearest-neighbor cosine search.
/// The retriever only reads; all writes go through ingestion.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the index is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Get information about a language's collection.
    /// Returns None if the collection doesn't exist.
    async fn collection_info(
        &self,
        language: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection for a language if it doesn't exist.
    async fn ensure_collection(&self, language: &str) -> Result<(), VectorStoreError>;

    /// Insert or update embedded chunks.
    async fn upsert_chunks(
        &self,
        language: &str,
        chunks: Vec<Chunk>,
    ) -> Result<(), VectorStoreError>;

    /// k-nearest-neighbor search, descending by similarity.
    async fn search(
        &self,
        language: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievalResult>, VectorStoreError>;
}

/// Qdrant-backed vector index.
pub struct QdrantIndex {
    client: Qdrant,
    collection_prefix: String,
    embedding_dim: u64,
}

impl QdrantIndex {
    /// Create a new Qdrant index from configuration.
    pub fn new(config: &VectorStoreConfig, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection_prefix: config.collection_prefix.clone(),
            embedding_dim,
        })
    }

    pub fn collection_name(&self, language: &str) -> String {
        format!("{}_{}", self.collection_prefix, language)
    }

    fn payload_str(
        payload: &HashMap<String, qdrant_client::qdrant::Value>,
        key: &str,
    ) -> String {
        payload
            .get(key)
            .and_then(|v| match &v.kind {
                Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.as_str()),
                _ => None,
            })
            .unwrap_or("")
            .to_string()
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_info(
        &self,
        language: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let collection = self.collection_name(language);
        match self.client.collection_info(&collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            })),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn ensure_collection(&self, language: &str) -> Result<(), VectorStoreError> {
        if self.collection_info(language).await?.is_some() {
            return Ok(());
        }

        let collection = self.collection_name(language);
        let create_collection = CreateCollectionBuilder::new(&collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert_chunks(
        &self,
        language: &str,
        chunks: Vec<Chunk>,
    ) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let collection = self.collection_name(language);
        let ingested_at = chrono::Utc::now().to_rfc3339();

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let point_id = chunk.point_id();
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("chunk_id".to_string(), chunk.id.into());
                payload.insert("text".to_string(), chunk.text.into());
                payload.insert("source".to_string(), chunk.source.into());
                payload.insert("title".to_string(), chunk.title.into());
                payload.insert(
                    "position_index".to_string(),
                    (chunk.position_index as i64).into(),
                );
                payload.insert("language".to_string(), chunk.language.into());
                payload.insert("ingested_at".to_string(), ingested_at.clone().into());

                PointStruct::new(point_id, chunk.dense_vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        language: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<RetrievalResult>, VectorStoreError> {
        let collection = self.collection_name(language);
        let search =
            SearchPointsBuilder::new(&collection, query_vector, limit).with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let retrieval_results = results
            .result
            .into_iter()
            .map(|point| RetrievalResult {
                text: Self::payload_str(&point.payload, "text"),
                source: Self::payload_str(&point.payload, "source"),
                title: Self::payload_str(&point.payload, "title"),
                score: point.score,
            })
            .collect();

        Ok(retrieval_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_partitions_by_language() {
        let config = VectorStoreConfig::default();
        let index = QdrantIndex::new(&config, 1024).unwrap();
        assert_eq!(index.collection_name("en"), "book_chunks_en");
        assert_eq!(index.collection_name("ur"), "book_chunks_ur");
    }
}
