//! Error types for textbook-tutor
//!
//! This module provides error handling for every stage of the tutoring
//! pipeline: ingestion, index persistence, retrieval, model invocation and
//! quiz parsing.

use thiserror::Error;

/// Main error type for tutor operations
#[derive(Error, Debug)]
pub enum TutorError {
    /// A source file was skipped during ingestion (bad path shape or unreadable file)
    #[error("Ingestion skipped: {0}")]
    IngestionSkip(String),

    /// The persisted index is missing or unreadable
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The persisted index was built with a different embedding model
    #[error("Embedding model mismatch: index built with '{found}', configured '{expected}'")]
    EmbeddingMismatch { expected: String, found: String },

    /// There was nothing to index
    #[error("No chunks to index")]
    EmptyCorpus,

    /// Embedding or language model call failed, or returned an unusable response
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// One quiz block could not be parsed
    #[error("Quiz block skipped: {0}")]
    QuizParseSkip(String),

    /// PDF processing errors
    #[error("PDF processing error: {0}")]
    Pdf(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias for tutor operations
pub type Result<T> = std::result::Result<T, TutorError>;

impl From<async_openai::error::OpenAIError> for TutorError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        TutorError::ModelInvocation(err.to_string())
    }
}

impl From<lopdf::Error> for TutorError {
    fn from(err: lopdf::Error) -> Self {
        TutorError::Pdf(err.to_string())
    }
}
