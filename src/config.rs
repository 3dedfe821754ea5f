//! Configuration for textbook-tutor
//!
//! Settings are grouped per pipeline stage. A JSON file can override the
//! defaults, and environment variables (optionally loaded from `.env`)
//! override both.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the `grade_<N>/<subject>/<chapter>` content tree
    pub data_dir: PathBuf,

    /// Location of the persisted similarity index
    pub index_path: PathBuf,

    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub quiz: QuizConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            index_path: PathBuf::from("vector_store/index.db"),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            quiz: QuizConfig::default(),
        }
    }
}

/// Text chunking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,

    /// Characters shared by adjacent chunks of the same page
    pub overlap: usize,

    /// Prefix stripped from the grade directory name
    pub grade_prefix: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
            grade_prefix: "grade_".to_string(),
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings endpoint
    OpenAi,
    /// Deterministic offline embeddings
    Hashing,
}

/// Embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,

    /// Embedding model name; recorded in the index
    pub model: String,

    /// Texts per embeddings request
    pub batch_size: usize,

    /// Vector length for the hashing provider
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-small".to_string(),
            batch_size: 64,
            dimension: 384,
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,

    /// Base URL for OpenAI-compatible APIs (e.g. "http://localhost:11434/v1" for Ollama)
    pub base_url: Option<String>,

    /// API key; usually supplied through `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            base_url: None,
            api_key: None,
        }
    }
}

/// Upper bound on a citation excerpt, in characters
pub const MAX_EXCERPT_CHARS: usize = 300;

/// Retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved when answering a question
    pub answer_k: usize,

    /// Chunks retrieved to seed a quiz
    pub quiz_k: usize,

    /// Maximum excerpt length of a source citation, in characters
    pub excerpt_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            answer_k: 4,
            quiz_k: 1,
            excerpt_chars: MAX_EXCERPT_CHARS,
        }
    }
}

/// Quiz settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub num_questions: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self { num_questions: 5 }
    }
}

impl Config {
    /// Load configuration from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    TutorError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    TutorError::Config(format!("Invalid config {}: {}", path.display(), e))
                })?
            }
            None => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(path) = lookup("TUTOR_INDEX_PATH") {
            self.index_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("TUTOR_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("TUTOR_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = lookup("TUTOR_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
    }

    /// Reject settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(TutorError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(TutorError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.answer_k == 0 || self.retrieval.quiz_k == 0 {
            return Err(TutorError::Config("retrieval k must be positive".to_string()));
        }
        if self.retrieval.excerpt_chars == 0 || self.retrieval.excerpt_chars > MAX_EXCERPT_CHARS {
            return Err(TutorError::Config(format!(
                "excerpt_chars must be between 1 and {}, got {}",
                MAX_EXCERPT_CHARS, self.retrieval.excerpt_chars
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(TutorError::Config("embedding batch_size must be positive".to_string()));
        }
        if self.embedding.provider == EmbeddingProvider::Hashing && self.embedding.dimension == 0 {
            return Err(TutorError::Config("embedding dimension must be positive".to_string()));
        }
        Ok(())
    }
}
