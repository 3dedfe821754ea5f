//! Model access for textbook-tutor
//!
//! Embedding and language models are external services reached through the
//! [`Embedder`] and [`LanguageModel`] traits. Concrete clients are built from
//! configuration and passed into the pipeline explicitly.

pub mod embedding;
pub mod llm;
pub mod similarity;

// Re-export main types and functions
pub use embedding::{Embedder, Embedding, HashingEmbedder, OpenAiEmbedder, build_embedder};
pub use llm::{LanguageModel, OpenAiChatModel, build_language_model};
pub use similarity::{cosine_similarity, normalize};
