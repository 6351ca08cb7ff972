//! Retrieval models: modes, ranked results, per-request outcomes.

use serde::{Deserialize, Serialize};

/// Which retrieval path served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalMode {
    /// Search against the persisted, pre-indexed corpus.
    FullBook,
    /// Ephemeral search scoped to text supplied with the request.
    SelectedTextOnly,
    /// Retrieval degraded to an empty result set after a backend failure.
    Error,
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMode::FullBook => write!(f, "full-book"),
            RetrievalMode::SelectedTextOnly => write!(f, "selected-text-only"),
            RetrievalMode::Error => write!(f, "error"),
        }
    }
}

/// A single ranked passage. Scores are cosine similarities in [-1, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub source: String,
    pub title: String,
    pub score: f32,
}

/// Result of one retrieval pass, ordered descending by score.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub results: Vec<RetrievalResult>,
    pub mode: RetrievalMode,
}

impl RetrievalOutcome {
    pub fn empty(mode: RetrievalMode) -> Self {
        Self {
            results: Vec::new(),
            mode,
        }
    }

    pub fn degraded() -> Self {
        Self::empty(RetrievalMode::Error)
    }
}

/// Search output surfaced by the `search` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub mode: RetrievalMode,
    pub results: Vec<RetrievalResult>,
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(
        query: String,
        mode: RetrievalMode,
        results: Vec<RetrievalResult>,
        duration_ms: u64,
    ) -> Self {
        Self {
            query,
            mode,
            results,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display() {
        assert_eq!(RetrievalMode::FullBook.to_string(), "full-book");
        assert_eq!(
            RetrievalMode::SelectedTextOnly.to_string(),
            "selected-text-only"
        );
        assert_eq!(RetrievalMode::Error.to_string(), "error");
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&RetrievalMode::SelectedTextOnly).unwrap();
        assert_eq!(json, "\"selected-text-only\"");
        let parsed: RetrievalMode = serde_json::from_str("\"full-book\"").unwrap();
        assert_eq!(parsed, RetrievalMode::FullBook);
    }

    #[test]
    fn test_degraded_outcome() {
        let outcome = RetrievalOutcome::degraded();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.mode, RetrievalMode::Error);
    }
}
