//! # textbook-tutor
//!
//! A retrieval-augmented tutoring assistant over a directory of textbooks.
//! Documents laid out as `<root>/grade_<N>/<subject>/<chapter>.pdf` are
//! chunked, embedded and persisted to a SQLite index; questions and quiz
//! requests are then answered from the chunks matching the student's grade
//! and subject.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use textbook_tutor::{AskRequest, Config, DocumentIngestor, IndexBuilder, TutorService};
//! use textbook_tutor::ml::build_embedder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!
//!     // Offline: ingest and index the textbooks
//!     let report = DocumentIngestor::new(config.chunking.clone())?.ingest_dir(&config.data_dir)?;
//!     let embedder = build_embedder(&config.embedding, &config.llm);
//!     IndexBuilder::new(embedder, config.embedding.batch_size)
//!         .build(&report.chunks, &config.index_path)
//!         .await?;
//!
//!     // Online: answer a question
//!     let service = TutorService::from_config(&config)?;
//!     let response = service
//!         .ask(&AskRequest {
//!             question: "What is velocity?".to_string(),
//!             grade: "11".to_string(),
//!             subject: "Physics".to_string(),
//!             history: Vec::new(),
//!         })
//!         .await;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod quiz;
pub mod storage;
pub mod text;
pub mod utils;

// Re-export main API types
pub use api::{
    AnswerResult, AskRequest, AskResponse, ConversationTurn, DocumentIngestor, IndexBuilder,
    QuizGenerator, QuizRequest, QuizResponse, RetrievalFilter, Retriever, Role, SourceCitation,
    Tutor, TutorService,
};
pub use config::Config;
pub use error::{Result, TutorError};

// Re-export commonly used types
pub use quiz::{QuizParser, QuizQuestion};
pub use storage::BuildStats;
pub use text::Chunk;
