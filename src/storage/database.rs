//! SQLite storage for the similarity index

use crate::error::{Result, TutorError};
use crate::ml::Embedding;
use crate::storage::schema::*;
use crate::text::Chunk;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A (vector, chunk) pair inside the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub vector: Embedding,
    pub chunk: Chunk,
}

/// Summary of a persisted index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub built_at: Option<String>,
}

/// Chapters available for one grade and subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub grade: String,
    pub subject: String,
    pub chapters: Vec<String>,
}

/// Database connection and operations
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Create a new index database at `path`, initializing the schema
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| TutorError::Storage(format!("Failed to open database: {}", e)))?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TutorError::Storage(format!("Failed to create in-memory database: {}", e))
        })?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open an existing index for reading
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TutorError::IndexUnavailable(format!(
                "Index not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| {
                TutorError::IndexUnavailable(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let store = Self { conn };
        match store.get_metadata(KEY_SCHEMA_VERSION) {
            Ok(Some(version)) if version == SCHEMA_VERSION.to_string() => Ok(store),
            Ok(Some(version)) => Err(TutorError::IndexUnavailable(format!(
                "Unsupported index schema version {} in {}",
                version,
                path.display()
            ))),
            Ok(None) | Err(_) => Err(TutorError::IndexUnavailable(format!(
                "Not a tutor index: {}",
                path.display()
            ))),
        }
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        self.conn
            .execute(CREATE_CHUNKS_TABLE, [])
            .map_err(|e| TutorError::Storage(format!("Failed to create chunks table: {}", e)))?;

        self.conn
            .execute(CREATE_METADATA_TABLE, [])
            .map_err(|e| TutorError::Storage(format!("Failed to create metadata table: {}", e)))?;

        self.conn
            .execute(CREATE_CHUNKS_INDEXES, [])
            .map_err(|e| TutorError::Storage(format!("Failed to create indexes: {}", e)))?;

        self.set_metadata(KEY_SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;

        log::debug!("Index database initialized with schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Insert chunks and their embeddings in a single transaction
    pub fn insert_entries(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(TutorError::Storage(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| TutorError::Storage(format!("Failed to start transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                INSERT INTO chunks (text, grade, subject, chapter, source_file, page_number, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                )
                .map_err(|e| TutorError::Storage(format!("Failed to prepare statement: {}", e)))?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    chunk.text,
                    chunk.grade,
                    chunk.subject,
                    chunk.chapter,
                    chunk.source_file,
                    chunk.page_number as i64,
                    encode_embedding(embedding),
                ])
                .map_err(|e| {
                    TutorError::Storage(format!(
                        "Failed to insert chunk from {}: {}",
                        chunk.source_file, e
                    ))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| TutorError::Storage(format!("Failed to commit transaction: {}", e)))?;

        log::info!("Inserted {} index entries", chunks.len());
        Ok(())
    }

    /// Store a metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)",
                params![key, value],
            )
            .map_err(|e| TutorError::Storage(format!("Failed to set metadata {}: {}", key, e)))?;
        Ok(())
    }

    /// Read a metadata value
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Read the embedding model, dimension and size recorded for this index
    pub fn info(&self) -> Result<IndexInfo> {
        let embedding_model = self.get_metadata(KEY_EMBEDDING_MODEL)?.ok_or_else(|| {
            TutorError::IndexUnavailable("Index has no embedding model recorded".to_string())
        })?;

        let dimension = self
            .get_metadata(KEY_EMBEDDING_DIMENSION)?
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| {
                TutorError::IndexUnavailable("Index has no embedding dimension recorded".to_string())
            })?;

        Ok(IndexInfo {
            embedding_model,
            dimension,
            chunk_count: self.chunk_count()?,
            built_at: self.get_metadata(KEY_BUILT_AT)?,
        })
    }

    /// Get total chunk count
    pub fn chunk_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| TutorError::Storage(format!("Failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }

    /// Load every entry in insertion order
    pub fn load_entries(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT text, grade, subject, chapter, source_file, page_number, embedding FROM chunks ORDER BY id",
            )
            .map_err(|e| TutorError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], row_to_entry)
            .map_err(|e| TutorError::Storage(format!("Failed to query chunks: {}", e)))?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(
                entry.map_err(|e| TutorError::Storage(format!("Failed to read chunk row: {}", e)))?,
            );
        }
        Ok(entries)
    }

    /// Distinct grade/subject pairs with their chapters
    pub fn topics(&self) -> Result<Vec<Topic>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT grade, subject, chapter FROM chunks ORDER BY grade, subject, chapter",
            )
            .map_err(|e| TutorError::Storage(format!("Failed to prepare topic query: {}", e)))?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut topics: Vec<Topic> = Vec::new();
        for row in rows {
            let (grade, subject, chapter) = row?;
            match topics.last_mut() {
                Some(topic) if topic.grade == grade && topic.subject == subject => {
                    topic.chapters.push(chapter)
                }
                _ => topics.push(Topic {
                    grade,
                    subject,
                    chapters: vec![chapter],
                }),
            }
        }
        Ok(topics)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        bytes.extend_from_slice(&val.to_le_bytes());
    }
    bytes
}

fn decode_embedding(blob: &[u8]) -> Embedding {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn row_to_entry(row: &Row) -> rusqlite::Result<IndexEntry> {
    let blob: Vec<u8> = row.get(6)?;
    Ok(IndexEntry {
        vector: decode_embedding(&blob),
        chunk: Chunk {
            text: row.get(0)?,
            grade: row.get(1)?,
            subject: row.get(2)?,
            chapter: row.get(3)?,
            source_file: row.get(4)?,
            page_number: row.get::<_, i64>(5)? as u32,
        },
    })
}
