//! Text extraction and cleanup utilities for ingestion.

use std::collections::HashSet;

use scraper::{Html, Selector};

/// Elements whose text never belongs in textbook content.
const EXCLUDED_ELEMENTS: &str = "nav, header, footer, aside, script, style, noscript";

/// Extract readable text from an HTML page, skipping navigation and
/// structural chrome.
pub fn extract_html_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let excluded = Selector::parse(EXCLUDED_ELEMENTS).expect("static selector is valid");

    let mut skipped: HashSet<_> = HashSet::new();
    for element in document.select(&excluded) {
        skipped.insert(element.id());
    }

    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.nodes() {
        if let scraper::Node::Text(text) = node.value() {
            if node.ancestors().any(|a| skipped.contains(&a.id())) {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }

    clean_text(&parts.join(" "))
}

/// Extract the page title from HTML, falling back to "Untitled".
pub fn extract_html_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").expect("static selector is valid");

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Title of a markdown document: the first `#` heading, or the fallback.
pub fn markdown_title(content: &str, fallback: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Collapse whitespace runs and strip control characters left behind by
/// HTML parsing.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
