//! Local markdown directory ingestion.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::IngestError;
use crate::models::{Document, IngestionConfig};
use crate::utils::text::markdown_title;

/// Collects markdown files under a directory as documents.
pub struct LocalSource {
    root: PathBuf,
    exclude_patterns: Vec<String>,
    max_file_size: u64,
    language: String,
}

impl LocalSource {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &IngestionConfig,
        language: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            exclude_patterns: config.exclude_patterns.clone(),
            max_file_size: config.max_file_size,
            language: language.into(),
        }
    }

    /// Walk the directory and read every markdown file into a document.
    /// Oversized and unreadable files are skipped with a warning.
    pub fn collect(&self) -> Result<Vec<Document>, IngestError> {
        let mut documents = Vec::new();

        if self.root.is_file() {
            if let Some(doc) = self.read_markdown(&self.root)? {
                documents.push(doc);
            }
            return Ok(documents);
        }

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| IngestError::Walk(e.to_string()))?;
            let path = entry.path();

            if !path.is_file() || !is_markdown(path) || self.is_excluded(path) {
                continue;
            }

            match self.read_markdown(path) {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }

        Ok(documents)
    }

    fn read_markdown(&self, path: &Path) -> Result<Option<Document>, IngestError> {
        let metadata =
            std::fs::metadata(path).map_err(|e| IngestError::FileRead(e.to_string()))?;
        if metadata.len() > self.max_file_size {
            tracing::warn!(path = %path.display(), size = metadata.len(), "skipping oversized file");
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| IngestError::FileRead(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        let title = markdown_title(&content, &fallback);
        let source = path.to_string_lossy().to_string();

        Ok(Some(Document::new(
            source,
            title,
            content,
            self.language.clone(),
        )))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
        })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "md" || ext == "markdown"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_collects_markdown_files_only() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "ch1.md", "# Chapter 1\n\nRobots move.");
        write_file(dir.path(), "ch2.markdown", "# Chapter 2\n\nRobots sense.");
        write_file(dir.path(), "notes.txt", "not markdown");

        let source = LocalSource::new(dir.path(), &IngestionConfig::default(), "en");
        let mut docs = source.collect().unwrap();
        docs.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Chapter 1");
        assert_eq!(docs[1].title, "Chapter 2");
        assert_eq!(docs[0].language, "en");
    }

    #[test]
    fn test_skips_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "empty.md", "   \n  ");

        let source = LocalSource::new(dir.path(), &IngestionConfig::default(), "en");
        assert!(source.collect().unwrap().is_empty());
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "intro.md", "No heading, just text.");

        let source = LocalSource::new(dir.path(), &IngestionConfig::default(), "en");
        let docs = source.collect().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "intro");
    }

    #[test]
    fn test_single_file_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "ch1.md", "# Solo\n\nContent.");

        let source = LocalSource::new(
            dir.path().join("ch1.md"),
            &IngestionConfig::default(),
            "ur",
        );
        let docs = source.collect().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Solo");
        assert_eq!(docs[0].language, "ur");
    }
}
