//! Token-bounded text chunking with sentence awareness and overlap.

use regex::Regex;

use crate::models::{Chunk, ChunkingConfig, Document};
use crate::services::tokenizer::TokenCounter;

/// Sentence boundary heuristic: terminal punctuation followed by
/// whitespace. Not a full sentence grammar.
const SENTENCE_BOUNDARY: &str = r"[.!?]+\s+";

/// Splits documents into overlapping, token-bounded chunks.
///
/// Sentences are accumulated greedily under the `chunk_size` budget. A
/// single sentence that exceeds the budget on its own is re-split at word
/// boundaries. After assembly, each chunk past the first is prefixed with
/// roughly `overlap / 2` tokens decoded from the end of its predecessor.
/// The prefix is added without trimming the chunk's own head, so
/// overlapped chunks run larger than the nominal budget by the overlap
/// amount; this matches the documented sizing behavior.
#[derive(Debug, Clone)]
pub struct TextChunker {
    counter: TokenCounter,
    chunk_size: usize,
    overlap: usize,
    sentence_re: Regex,
}

impl TextChunker {
    pub fn new(config: &ChunkingConfig, counter: TokenCounter) -> Self {
        Self {
            counter,
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            sentence_re: Regex::new(SENTENCE_BOUNDARY).expect("static regex is valid"),
        }
    }

    /// Chunk a document into ordered, position-indexed chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.chunk_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Chunk::from_document(document, text, idx))
            .collect()
    }

    /// Chunk raw text. Empty input yields an empty sequence.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let base = self.base_chunks(text);
        self.apply_overlap(base)
    }

    /// Split into sentence units, keeping terminal punctuation attached to
    /// the sentence it closes.
    fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut last = 0;

        for boundary in self.sentence_re.find_iter(text) {
            let punct_end = boundary.start() + text[boundary.start()..boundary.end()].trim_end().len();
            let sentence = text[last..punct_end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            last = boundary.end();
        }

        let tail = text[last..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }

        sentences
    }

    /// Greedy sentence accumulation under the token budget, before the
    /// overlap pass.
    fn base_chunks(&self, text: &str) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for sentence in self.split_sentences(text) {
            let sentence_tokens = self.counter.count(sentence);

            if current_tokens + sentence_tokens > self.chunk_size {
                if !current.trim().is_empty() {
                    chunks.push(current.trim().to_string());
                }

                if sentence_tokens > self.chunk_size {
                    // Oversized atomic sentence: re-split at word
                    // boundaries. All sub-chunks but the last are final;
                    // the last seeds the next buffer.
                    let mut sub_chunks = self.split_long_sentence(sentence);
                    match sub_chunks.pop() {
                        Some(last) => {
                            chunks.extend(sub_chunks);
                            current_tokens = self.counter.count(&last);
                            current = last;
                        }
                        None => {
                            current.clear();
                            current_tokens = 0;
                        }
                    }
                } else {
                    current = sentence.to_string();
                    current_tokens = sentence_tokens;
                }
            } else {
                if current.is_empty() {
                    current = sentence.to_string();
                } else {
                    current.push(' ');
                    current.push_str(sentence);
                }
                current_tokens += sentence_tokens;
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Word-level split for a sentence that exceeds the budget on its own.
    fn split_long_sentence(&self, sentence: &str) -> Vec<String> {
        if self.counter.count(sentence) <= self.chunk_size {
            return vec![sentence.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0usize;

        for word in sentence.split_whitespace() {
            let word_tokens = self.counter.count(word);

            if current_tokens + word_tokens > self.chunk_size && !current.is_empty() {
                chunks.push(current.join(" "));

                if self.overlap > 0 {
                    // Carry the tail words of the closed chunk forward so
                    // sub-chunks overlap like sentence-level chunks do.
                    let carry = (self.overlap / 2).max(1).min(current.len());
                    current = current[current.len() - carry..].to_vec();
                    current.push(word);
                    current_tokens = self.counter.count(&current.join(" "));
                } else {
                    current = vec![word];
                    current_tokens = word_tokens;
                }
            } else {
                current.push(word);
                current_tokens += word_tokens;
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }

    /// Prepend each chunk after the first with the decoded tail of its
    /// predecessor. Lists of fewer than two chunks pass through untouched.
    fn apply_overlap(&self, chunks: Vec<String>) -> Vec<String> {
        if self.overlap == 0 || chunks.len() < 2 {
            return chunks;
        }

        let mut overlapped = Vec::with_capacity(chunks.len());
        overlapped.push(chunks[0].clone());

        for i in 1..chunks.len() {
            let prev_tail = self.counter.tail(&chunks[i - 1], self.overlap / 2);
            let prev_tail = prev_tail.trim();
            if prev_tail.is_empty() {
                overlapped.push(chunks[i].clone());
            } else {
                overlapped.push(format!("{} {}", prev_tail, chunks[i]));
            }
        }

        overlapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> TextChunker {
        let config = ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        };
        TextChunker::new(&config, TokenCounter::new().unwrap())
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let c = chunker(100, 20);
        assert!(c.chunk_text("").is_empty());
        assert!(c.chunk_text("   \n  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let c = chunker(100, 20);
        let chunks = c.chunk_text("Robotics is a subfield of physical AI.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Robotics is a subfield of physical AI.");
    }

    #[test]
    fn test_sentence_split_keeps_punctuation() {
        let c = chunker(100, 0);
        let sentences =
            c.split_sentences("First sentence. Second one! Third? Trailing without punct");
        assert_eq!(
            sentences,
            vec![
                "First sentence.",
                "Second one!",
                "Third?",
                "Trailing without punct"
            ]
        );
    }

    #[test]
    fn test_budget_respected_without_overlap() {
        let c = chunker(20, 0);
        let text = "The robot walks forward. The robot turns left. The robot picks up a box. \
                    The robot places the box on a shelf. The robot returns to the charger. \
                    The robot powers down for the night.";
        let chunks = c.chunk_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                c.counter.count(chunk) <= 20,
                "chunk exceeded budget: {:?}",
                chunk
            );
        }
    }

    #[test]
    fn test_oversized_sentence_word_split_respects_budget() {
        let c = chunker(15, 0);
        // One long "sentence" with no terminal punctuation inside
        let long_sentence: String = (0..120)
            .map(|i| format!("item{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = c.chunk_text(&long_sentence);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                c.counter.count(chunk) <= 15,
                "sub-chunk exceeded budget: {:?}",
                chunk
            );
        }
    }

    #[test]
    fn test_pre_overlap_chunks_cover_document_in_order() {
        let c = chunker(20, 10);
        let text = "Sensors measure the world. Actuators change it. Controllers close the loop. \
                    Planning selects actions. Learning improves behavior over time. \
                    Evaluation grounds progress in benchmarks.";
        let base = c.base_chunks(text);
        let rejoined: Vec<&str> = base.iter().flat_map(|chunk| words(chunk)).collect();
        assert_eq!(rejoined, words(text));
    }

    #[test]
    fn test_overlap_prefixes_previous_tail() {
        let c = chunker(20, 10);
        let text = "Sensors measure the world. Actuators change it. Controllers close the loop. \
                    Planning selects actions. Learning improves behavior over time. \
                    Evaluation grounds progress in benchmarks.";
        let base = c.base_chunks(text);
        let overlapped = c.apply_overlap(base.clone());
        assert!(overlapped.len() >= 2);
        assert_eq!(overlapped[0], base[0]);

        for i in 1..overlapped.len() {
            let tail = c.counter.tail(&base[i - 1], 5);
            let tail = tail.trim();
            assert!(!tail.is_empty());
            assert!(
                overlapped[i].starts_with(tail),
                "chunk {} does not start with predecessor tail {:?}",
                i,
                tail
            );
            // The suffix came from the previous chunk's own content
            assert!(base[i - 1].ends_with(tail));
        }
    }

    #[test]
    fn test_single_chunk_bypasses_overlap_pass() {
        let c = chunker(500, 100);
        let text = "A single small sentence.";
        let chunks = c.chunk_text(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_overlapped_chunks_may_exceed_budget_but_boundedly() {
        let c = chunker(20, 10);
        let text = "The robot walks forward. The robot turns left. The robot picks up a box. \
                    The robot places the box on a shelf. The robot returns to the charger. \
                    The robot powers down for the night.";
        let chunks = c.chunk_text(text);
        for chunk in &chunks {
            // Widening is bounded by the prepended tail
            assert!(c.counter.count(chunk) <= 20 + 10);
        }
    }

    #[test]
    fn test_chunk_builds_position_indexed_chunks() {
        let c = chunker(20, 0);
        let doc = Document::new(
            "https://example.com/ch2",
            "Chapter 2",
            "The robot walks forward. The robot turns left. The robot picks up a box. \
             The robot places the box on a shelf. The robot returns to the charger.",
            "en",
        );
        let chunks = c.chunk(&doc);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position_index, i);
            assert_eq!(chunk.id, format!("https://example.com/ch2_chunk_{}", i));
            assert_eq!(chunk.language, "en");
            assert_eq!(chunk.title, "Chapter 2");
        }
    }
}
