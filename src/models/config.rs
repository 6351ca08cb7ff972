use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION_PREFIX: &str = "book_chunks";
pub const DEFAULT_SYNTHESIS_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("bookrag").join("config.toml"))
    }

    /// Load configuration from disk, apply environment overrides, and
    /// validate. Validation failures are fatal configuration errors.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let mut config = Self::load_file()?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn load_file() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// API keys come from the environment so they never land in the
    /// config file on disk.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY")
            && !key.is_empty()
        {
            self.embedding.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY")
            && !key.is_empty()
        {
            self.vector_store.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("SYNTHESIS_API_KEY")
            && !key.is_empty()
        {
            self.synthesis.api_key = Some(key);
        }
    }

    fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding dimension must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding batch_size must be at least 1".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval top_k must be at least 1".to_string(),
            ));
        }
        if self.vector_store.languages.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one language must be configured".to_string(),
            ));
        }
        if !self
            .vector_store
            .languages
            .contains(&self.vector_store.default_language)
        {
            return Err(ConfigError::ValidationError(format!(
                "default_language '{}' is not in the configured language list",
                self.vector_store.default_language
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_dimension() -> usize {
    1024
}

fn default_embedding_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            batch_size: default_batch_size(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Collections are partitioned by language as `{prefix}_{language}`.
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,

    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection_prefix() -> String {
    DEFAULT_COLLECTION_PREFIX.to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "ur".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection_prefix: default_collection_prefix(),
            languages: default_languages(),
            default_language: default_language(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk budget in tokens.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens shared between adjacent chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on chunks concatenated into the synthesis context.
    #[serde(default = "default_max_context_chunks")]
    pub max_context_chunks: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_max_context_chunks() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chunks: default_max_context_chunks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of an OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_synthesis_url")]
    pub url: String,

    #[serde(default = "default_synthesis_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_synthesis_url() -> String {
    DEFAULT_SYNTHESIS_URL.to_string()
}

fn default_synthesis_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_synthesis_timeout() -> u64 {
    60
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            url: default_synthesis_url(),
            model: default_synthesis_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_synthesis_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Default sitemap to crawl when `ingest` is run without a source.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sitemap_url: Option<String>,

    /// URL path substrings excluded from sitemap discovery.
    #[serde(default = "default_exclude_paths")]
    pub exclude_paths: Vec<String>,

    /// File patterns excluded from local directory ingestion.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Pending chunks are flushed to the index once this many accumulate.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_exclude_paths() -> Vec<String> {
    vec![
        "/blog".to_string(),
        "/docs".to_string(),
        "/api".to_string(),
    ]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/build/**".to_string(),
    ]
}

fn default_flush_threshold() -> usize {
    100
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            sitemap_url: None,
            exclude_paths: default_exclude_paths(),
            exclude_patterns: default_exclude_patterns(),
            flush_threshold: default_flush_threshold(),
            max_file_size: default_max_file_size(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}
