//! Token counting for chunk sizing.
//!
//! Wraps the cl100k_base BPE. The same instance handles both counting and
//! decoded subset extraction, so chunk budgets and overlap slices agree on
//! what a token is.

use std::sync::Arc;

use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::error::ChunkerError;

#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter").finish()
    }
}

impl TokenCounter {
    /// Build the encoder. Failure here is a configuration error, not a
    /// per-request one.
    pub fn new() -> Result<Self, ChunkerError> {
        let bpe = cl100k_base().map_err(|e| ChunkerError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }

    /// Number of tokens in `text`. Deterministic and monotonic with text
    /// length.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Decode roughly the last `n` tokens of `text` back to a string.
    ///
    /// A token slice can start inside a multi-byte character; the slice is
    /// narrowed from the front until it decodes cleanly.
    pub fn tail(&self, text: &str, n: usize) -> String {
        if n == 0 || text.is_empty() {
            return String::new();
        }

        let tokens = self.bpe.encode_ordinary(text);
        if tokens.is_empty() {
            return String::new();
        }

        let mut start = tokens.len().saturating_sub(n);
        while start < tokens.len() {
            if let Ok(decoded) = self.bpe.decode(tokens[start..].to_vec()) {
                return decoded;
            }
            start += 1;
        }
        String::new()
    }

    /// Decode roughly the first `n` tokens of `text` back to a string.
    pub fn head(&self, text: &str, n: usize) -> String {
        if n == 0 || text.is_empty() {
            return String::new();
        }

        let tokens = self.bpe.encode_ordinary(text);
        if tokens.is_empty() {
            return String::new();
        }

        let mut end = n.min(tokens.len());
        while end > 0 {
            if let Ok(decoded) = self.bpe.decode(tokens[..end].to_vec()) {
                return decoded;
            }
            end -= 1;
        }
        String::new()
    }
}
