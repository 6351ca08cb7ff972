//! Embedding capability: trait contract plus the HTTP client
//! implementation against an embedding server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Instruction type for embedding generation.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionType {
    /// For indexing documents
    Document,
    /// For search queries
    Query,
}

/// Maps text to fixed-length dense vectors. Injected into the retriever
/// and ingestion pipeline so tests can substitute doubles.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of documents for indexing.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Request body for the /embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
    instruction_type: InstructionType,
}

/// Response from the /embed endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Health response from the /health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

/// Client for interacting with the embedding server.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size as usize,
        })
    }

    /// Check if the embedding server is healthy and ready.
    pub async fn health_check(&self) -> Result<HealthResponse, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        // Server may return an empty body on health check
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            return Ok(HealthResponse {
                status: Some("healthy".to_string()),
                model_id: None,
            });
        }

        serde_json::from_str(&text).or(Ok(HealthResponse {
            status: Some("healthy".to_string()),
            model_id: None,
        }))
    }

    /// Embed one probe text and report the vector width the server
    /// actually produces. Used at startup to catch dimension mismatches
    /// before any data moves.
    pub async fn probe_dimension(&self) -> Result<usize, EmbeddingError> {
        let vector = self.embed_query("dimension probe").await?;
        Ok(vector.len())
    }

    /// Generate embeddings for a batch of texts with specified instruction type.
    async fn embed_batch_with_type(
        &self,
        texts: Vec<String>,
        instruction_type: InstructionType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self
                .embed_single_batch(chunk.to_vec(), instruction_type)
                .await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    /// Internal method to embed a single batch.
    async fn embed_single_batch(
        &self,
        texts: Vec<String>,
        instruction_type: InstructionType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let expected = texts.len();
        let request = EmbedRequest {
            inputs: texts,
            truncate: Some(true),
            instruction_type,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout
            } else {
                EmbeddingError::RequestError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.0.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                expected,
                embed_response.0.len()
            )));
        }

        Ok(embed_response.0)
    }

    /// Get the base URL of the embedding server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_batch_with_type(texts, InstructionType::Document)
            .await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embeddings = self
            .embed_batch_with_type(vec![text.to_string()], InstructionType::Query)
            .await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}
