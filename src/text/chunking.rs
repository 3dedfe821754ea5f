//! Text chunking
//!
//! Pages are split into fixed-size character windows that overlap their
//! neighbour by a fixed number of characters. Sizes are measured in Unicode
//! scalar values, never bytes, so a window never splits a code point.

use crate::config::ChunkingConfig;
use crate::error::{Result, TutorError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A bounded slice of source text with its provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text
    pub text: String,

    /// Grade, e.g. "11"
    pub grade: String,

    /// Lower-cased subject, e.g. "physics"
    pub subject: String,

    /// Lower-cased chapter, e.g. "chapter1"
    pub chapter: String,

    /// Path of the document the chunk came from
    pub source_file: String,

    /// 1-based page number inside the source document
    pub page_number: u32,
}

/// Provenance shared by every chunk of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSource {
    pub grade: String,
    pub subject: String,
    pub chapter: String,
    pub source_file: String,
}

/// Fixed-window text chunker
pub struct TextChunker {
    config: ChunkingConfig,
    whitespace_regex: Regex,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 || config.overlap >= config.chunk_size {
            return Err(TutorError::Config(format!(
                "Invalid chunking window: size {} overlap {}",
                config.chunk_size, config.overlap
            )));
        }

        let whitespace_regex = Regex::new(r"\s+")
            .map_err(|e| TutorError::Generic(format!("Failed to compile whitespace regex: {}", e)))?;

        Ok(Self {
            config,
            whitespace_regex,
        })
    }

    /// Create a chunker with default configuration (1000 characters, 100 overlap)
    pub fn with_default_config() -> Result<Self> {
        Self::new(ChunkingConfig::default())
    }

    /// Chunk one page, attaching the document provenance to every chunk
    pub fn chunk_page(&self, text: &str, page_number: u32, source: &ChunkSource) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .map(|text| Chunk {
                text,
                grade: source.grade.clone(),
                subject: source.subject.clone(),
                chapter: source.chapter.clone(),
                source_file: source.source_file.clone(),
                page_number,
            })
            .collect()
    }

    /// Split text into overlapping windows
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = self.preprocess_text(text);
        let chars: Vec<char> = text.chars().collect();

        if chars.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let step = size - self.config.overlap;
        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            let end = usize::min(start + size, chars.len());
            windows.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        windows
    }

    /// Normalize to NFC and collapse whitespace runs
    fn preprocess_text(&self, text: &str) -> String {
        let normalized: String = text.nfc().collect();
        self.whitespace_regex
            .replace_all(normalized.trim(), " ")
            .into_owned()
    }
}
