mod batch;
mod chunker;
mod embedding;
mod ingest;
mod retriever;
mod synthesis;
mod tokenizer;
mod vector_store;

pub use batch::flush_chunks;
pub use chunker::TextChunker;
pub use embedding::{Embedder, EmbeddingClient, HealthResponse, InstructionType};
pub use ingest::{IngestStats, IngestionPipeline};
pub use retriever::{Retriever, cosine_similarity};
pub use synthesis::{AnswerGenerator, AnswerPipeline, ChatCompletionsClient};
pub use tokenizer::TokenCounter;
pub use vector_store::{CollectionInfo, QdrantIndex, VectorIndex};
