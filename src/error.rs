//! Error types for the retrieval-augmented QA engine.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection and timeout errors are retryable
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            // Request errors depend on the underlying cause
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Invalid responses are not retryable
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("Qdrant client error: {0}")]
    ClientError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection errors are always retryable
            VectorStoreError::ConnectionError(_) => true,
            // Other errors might be transient
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg)
            | VectorStoreError::ClientError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors related to chunking and token counting.
#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("tokenizer initialization failed: {0}")]
    Tokenizer(String),
}

/// Errors related to corpus ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("sitemap error: {0}")]
    Sitemap(String),

    #[error("file read error: {0}")]
    FileRead(String),

    #[error("directory walk error: {0}")]
    Walk(String),

    #[error("chunker error: {0}")]
    Chunker(#[from] ChunkerError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("no pages found to ingest")]
    NoPagesFound,
}

/// Errors related to query handling and retrieval.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to answer generation.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to connect to generation endpoint: {0}")]
    ConnectionError(String),

    #[error("generation endpoint error: {0}")]
    ServerError(String),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation timeout")]
    Timeout,
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("embedding dimension mismatch: index expects {expected}, embedder produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("chunker error: {0}")]
    Chunker(#[from] ChunkerError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("{0}")]
    Other(String),
}
