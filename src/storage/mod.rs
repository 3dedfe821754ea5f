//! Index persistence for textbook-tutor
//!
//! The similarity index is stored in an embedded SQLite database: one row
//! per chunk with its embedding, plus a metadata table that pins the
//! embedding model the index was built with.

pub mod database;
pub mod schema;

// Re-export main types
pub use database::{IndexEntry, IndexInfo, IndexStore, Topic};

/// Index build statistics
#[derive(Debug, Clone)]
pub struct BuildStats {
    /// Total number of chunks indexed
    pub total_chunks: usize,

    /// Embedding vector length
    pub dimension: usize,

    /// Total processing time in seconds
    pub processing_time: f64,

    /// Index file size in bytes
    pub index_file_size: u64,
}
