//! Query request and answer response contracts.

use serde::{Deserialize, Serialize};

use super::retrieval::RetrievalMode;

/// An incoming question, optionally scoped to a selected passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,

    /// When present and non-empty, retrieval runs in selected-text-only
    /// mode and never touches the persisted index.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selected_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top_k: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            selected_text: None,
            language: None,
            top_k: None,
            session_id: None,
        }
    }

    pub fn with_selected_text(mut self, text: impl Into<String>) -> Self {
        self.selected_text = Some(text.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Structured answer returned for every query, including degraded ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub mode: RetrievalMode,
    pub retrieved_chunk_count: usize,
    pub response_time_ms: u64,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = QueryRequest::new("What is physical AI?")
            .with_selected_text("Robots act in the world.")
            .with_language("en")
            .with_top_k(3);
        assert_eq!(request.query, "What is physical AI?");
        assert_eq!(
            request.selected_text.as_deref(),
            Some("Robots act in the world.")
        );
        assert_eq!(request.language.as_deref(), Some("en"));
        assert_eq!(request.top_k, Some(3));
    }

    #[test]
    fn test_outcome_serializes_mode_string() {
        let outcome = QueryOutcome {
            answer: "Answer.".to_string(),
            mode: RetrievalMode::FullBook,
            retrieved_chunk_count: 2,
            response_time_ms: 12,
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "full-book");
        assert_eq!(json["retrieved_chunk_count"], 2);
    }
}
