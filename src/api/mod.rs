//! API layer for textbook-tutor
//!
//! Ingestion and index building run offline; retrieval, answering and quiz
//! generation serve requests against the built index.

pub mod builder;
pub mod ingestor;
pub mod prompts;
pub mod quiz;
pub mod retriever;
pub mod service;
pub mod tutor;

// Re-export main API types
pub use builder::IndexBuilder;
pub use ingestor::{DocumentIngestor, IngestReport};
pub use prompts::{ConversationTurn, Role};
pub use quiz::{QUIZ_ERROR_TEXT, QuizGenerator};
pub use retriever::{RetrievalFilter, Retriever, ScoredChunk, VectorIndex};
pub use service::{AskRequest, AskResponse, QuizRequest, QuizResponse, TutorService};
pub use tutor::{AnswerResult, FALLBACK_ANSWER, SourceCitation, Tutor, beyond_syllabus};
