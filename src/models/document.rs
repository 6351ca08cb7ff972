use serde::{Deserialize, Serialize};

/// A fetched, cleaned document ready for chunking. Ephemeral: documents
/// are not persisted beyond chunk extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// URL or path identifying where the content came from.
    pub source: String,
    pub title: String,
    pub content: String,
    pub language: String,
}

impl Document {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            content: content.into(),
            language: language.into(),
        }
    }
}

/// A bounded segment of a document. Immutable once created; the id is
/// deterministic so re-ingestion overwrites instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub title: String,
    pub position_index: usize,
    pub language: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dense_vector: Vec<f32>,
}

impl Chunk {
    pub fn generate_id(source: &str, position_index: usize) -> String {
        format!("{}_chunk_{}", source, position_index)
    }

    /// Qdrant point ids must be UUIDs; derive one deterministically from
    /// the chunk id so upserts stay idempotent.
    pub fn point_id(&self) -> String {
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, self.id.as_bytes()).to_string()
    }

    pub fn from_document(document: &Document, text: String, position_index: usize) -> Self {
        Self {
            id: Self::generate_id(&document.source, position_index),
            text,
            source: document.source.clone(),
            title: document.title.clone(),
            position_index,
            language: document.language.clone(),
            dense_vector: Vec::new(),
        }
    }
}
