//! Text processing for textbook-tutor
//!
//! This module provides page loading for source documents and the
//! fixed-window chunker that turns pages into indexable chunks.

pub mod chunking;
pub mod loader;

// Re-export main types and functions
pub use chunking::{Chunk, ChunkSource, TextChunker};
pub use loader::{Page, PageLoader, PdfLoader, PlainTextLoader, loader_for};
