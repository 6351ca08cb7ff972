//! Answer synthesis: generation contract, chat-completions client, and
//! the query pipeline that ties validation, retrieval, and generation
//! together.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{QueryError, SynthesisError};
use crate::models::{QueryOutcome, QueryRequest, RetrievalResult, SynthesisConfig};
use crate::services::retriever::Retriever;
use crate::utils::validation::{validate_query, validate_selected_text};

const SYSTEM_PROMPT: &str = "You are an AI assistant for a textbook. \
Answer questions based only on the provided context from the textbook. \
If the context doesn't contain relevant information, say so clearly. \
Be helpful, accurate, and cite sources when possible.";

const NO_CONTEXT_NOTICE: &str = "No relevant content found in the textbook.";

/// How many characters of retrieved context the fallback answer keeps.
const FALLBACK_EXCERPT_CHARS: usize = 500;

/// Produces a natural-language answer from a system instruction and a
/// user message. Injected so tests can substitute doubles.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    pub fn new(config: &SynthesisConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, SynthesisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SynthesisError::Timeout
            } else {
                SynthesisError::RequestError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                SynthesisError::InvalidResponse("response contained no answer text".to_string())
            })
    }
}

/// End-to-end query pipeline: validate input, retrieve context, generate
/// an answer, and always return a structured outcome.
pub struct AnswerPipeline {
    retriever: Retriever,
    generator: Arc<dyn AnswerGenerator>,
    max_context_chunks: usize,
    default_language: String,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn AnswerGenerator>,
        max_context_chunks: usize,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            generator,
            max_context_chunks,
            default_language: default_language.into(),
        }
    }

    /// Answer a query. Invalid input is rejected up front; backend
    /// failures downstream degrade into the structured outcome instead of
    /// erroring.
    pub async fn answer(&self, request: &QueryRequest) -> Result<QueryOutcome, QueryError> {
        let start = Instant::now();

        let query = validate_query(&request.query)?;
        let selected = request
            .selected_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(text) = selected {
            validate_selected_text(text)?;
        }

        let language = request
            .language
            .as_deref()
            .unwrap_or(&self.default_language);

        let retrieval = self
            .retriever
            .retrieve(query, selected, language, request.top_k)
            .await;

        let context = if retrieval.results.is_empty() {
            NO_CONTEXT_NOTICE.to_string()
        } else {
            build_context(&retrieval.results, self.max_context_chunks)
        };

        let user_message = format!(
            "Context from textbook:\n{}\n\nUser question: {}\n\n\
             Please provide an answer based on the context provided. \
             If the context doesn't contain relevant information, say so clearly.",
            context, query
        );

        let answer = match self.generator.generate(SYSTEM_PROMPT, &user_message).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "answer generation failed, returning context excerpt");
                fallback_answer(&context)
            }
        };

        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| format!("session_{}", uuid::Uuid::new_v4()));

        Ok(QueryOutcome {
            answer,
            mode: retrieval.mode,
            retrieved_chunk_count: retrieval.results.len(),
            response_time_ms: start.elapsed().as_millis() as u64,
            session_id,
        })
    }
}

/// Concatenate the top results into the synthesis context.
fn build_context(results: &[RetrievalResult], max_chunks: usize) -> String {
    results
        .iter()
        .take(max_chunks)
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Best-effort answer when generation fails: a truncated excerpt of the
/// retrieved context.
fn fallback_answer(context: &str) -> String {
    let excerpt: String = context.chars().take(FALLBACK_EXCERPT_CHARS).collect();
    let ellipsis = if context.chars().count() > FALLBACK_EXCERPT_CHARS {
        "..."
    } else {
        ""
    };
    format!("Based on the textbook content:\n\n{}{}", excerpt, ellipsis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            source: "src".to_string(),
            title: "title".to_string(),
            score,
        }
    }

    #[test]
    fn test_build_context_bounded_by_max_chunks() {
        let results = vec![result("a", 0.9), result("b", 0.8), result("c", 0.7)];
        assert_eq!(build_context(&results, 2), "a\n\nb");
        assert_eq!(build_context(&results, 10), "a\n\nb\n\nc");
    }

    #[test]
    fn test_fallback_answer_truncates() {
        let context = "x".repeat(FALLBACK_EXCERPT_CHARS * 2);
        let answer = fallback_answer(&context);
        assert!(answer.ends_with("..."));
        assert!(answer.contains(&"x".repeat(FALLBACK_EXCERPT_CHARS)));

        let short = fallback_answer("short context");
        assert!(short.contains("short context"));
        assert!(!short.ends_with("..."));
    }
}
