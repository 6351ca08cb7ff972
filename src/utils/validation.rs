//! Input validation applied before retrieval is attempted.

use crate::error::QueryError;

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_QUERY_CHARS: usize = 1000;
pub const MAX_SELECTED_TEXT_CHARS: usize = 10_000;

/// Validate a user query. Returns the trimmed query on success.
pub fn validate_query(query: &str) -> Result<&str, QueryError> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(QueryError::InvalidInput(
            "query cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(QueryError::InvalidInput(format!(
            "query must be at least {} characters long",
            MIN_QUERY_CHARS
        )));
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(QueryError::InvalidInput(format!(
            "query is too long (max {} characters)",
            MAX_QUERY_CHARS
        )));
    }

    Ok(trimmed)
}

/// Validate a selected text passage. Returns the trimmed passage on
/// success. Callers treat empty selections as absent before calling this.
pub fn validate_selected_text(text: &str) -> Result<&str, QueryError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(QueryError::InvalidInput(
            "selected text cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_SELECTED_TEXT_CHARS {
        return Err(QueryError::InvalidInput(format!(
            "selected text is too long (max {} characters)",
            MAX_SELECTED_TEXT_CHARS
        )));
    }

    Ok(trimmed)
}
