//! Utility modules.

pub mod retry;
pub mod text;
pub mod validation;

pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use text::{clean_text, extract_html_text, extract_html_title, markdown_title};
pub use validation::{validate_query, validate_selected_text};
