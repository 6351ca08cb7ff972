use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use crate::models::{QueryOutcome, SearchResults};
use crate::services::IngestStats;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub trait Formatter {
    fn format_answer(&self, outcome: &QueryOutcome) -> String;
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_healthy: bool,
    pub embedding_model: Option<String>,
    pub embedding_dimension: usize,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    /// Per-language collection name and point count.
    pub collections: Vec<(String, Option<u64>)>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, outcome: &QueryOutcome) -> String {
        let mut output = String::new();
        writeln!(output, "{}", outcome.answer).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "---").unwrap();
        writeln!(output, "Mode:       {}", outcome.mode).unwrap();
        writeln!(output, "Chunks:     {}", outcome.retrieved_chunk_count).unwrap();
        writeln!(output, "Latency:    {}ms", outcome.response_time_ms).unwrap();
        writeln!(output, "Session:    {}", outcome.session_id).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!(
                "No results found for: {} (mode: {})\n",
                results.query, results.mode
            );
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Mode: {} | {} results in {}ms\n",
            results.mode,
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, result.score).unwrap();
            writeln!(output, "   Source: {}", result.source).unwrap();
            if !result.title.is_empty() {
                writeln!(output, "   Title:  {}", result.title).unwrap();
            }
            writeln!(output, "   ---").unwrap();

            let preview: String = result.text.chars().take(200).collect();
            let preview = if result.text.chars().count() > 200 {
                format!("{}...", preview)
            } else {
                preview
            };
            for line in preview.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let embedding_status = if status.embedding_healthy {
            "[HEALTHY]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Embedding:    {}", embedding_status).unwrap();
        writeln!(output, "  URL:        {}", status.embedding_url).unwrap();
        if let Some(ref model) = status.embedding_model {
            writeln!(output, "  Model:      {}", model).unwrap();
        }
        writeln!(output, "  Dimension:  {}", status.embedding_dimension).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store: {}", vector_status).unwrap();
        writeln!(output, "  URL:        {}", status.vector_store_url).unwrap();
        for (collection, points) in &status.collections {
            match points {
                Some(count) => {
                    writeln!(output, "  {}: {} points", collection, count).unwrap();
                }
                None => {
                    writeln!(output, "  {}: not created", collection).unwrap();
                }
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Pages discovered: {}", stats.pages_discovered).unwrap();
        writeln!(output, "Pages processed:  {}", stats.pages_processed).unwrap();
        writeln!(output, "Pages skipped:    {}", stats.pages_skipped).unwrap();
        writeln!(output, "Chunks created:   {}", stats.chunks_created).unwrap();
        writeln!(output, "Duration:         {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_answer(&self, outcome: &QueryOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|e| {
            format!("{{\"error\": \"failed to serialize outcome: {}\"}}", e)
        })
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|e| {
            format!("{{\"error\": \"failed to serialize results: {}\"}}", e)
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        serde_json::to_string_pretty(status)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize status: {}\"}}", e))
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        serde_json::to_string_pretty(stats)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize stats: {}\"}}", e))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RetrievalMode;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_answer_includes_mode() {
        let outcome = QueryOutcome {
            answer: "The answer.".to_string(),
            mode: RetrievalMode::SelectedTextOnly,
            retrieved_chunk_count: 2,
            response_time_ms: 42,
            session_id: "s".to_string(),
        };
        let text = TextFormatter.format_answer(&outcome);
        assert!(text.contains("The answer."));
        assert!(text.contains("selected-text-only"));
    }

    #[test]
    fn test_json_answer_round_trips() {
        let outcome = QueryOutcome {
            answer: "A".to_string(),
            mode: RetrievalMode::FullBook,
            retrieved_chunk_count: 1,
            response_time_ms: 5,
            session_id: "s".to_string(),
        };
        let json = JsonFormatter.format_answer(&outcome);
        let parsed: QueryOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.retrieved_chunk_count, 1);
    }
}
