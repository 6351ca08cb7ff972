mod answer;
mod config;
mod document;
mod retrieval;

pub use answer::{QueryOutcome, QueryRequest};
pub use config::{
    ChunkingConfig, Config, DEFAULT_COLLECTION_PREFIX, DEFAULT_EMBEDDING_URL, DEFAULT_QDRANT_URL,
    DEFAULT_SYNTHESIS_URL, EmbeddingConfig, IngestionConfig, RetrievalConfig, SynthesisConfig,
    VectorStoreConfig,
};
pub use document::{Chunk, Document};
pub use retrieval::{RetrievalMode, RetrievalOutcome, RetrievalResult, SearchResults};
