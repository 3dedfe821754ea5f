//! Database schema definitions

/// Database schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL for creating the chunks table
pub const CREATE_CHUNKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY,
    text TEXT NOT NULL,
    grade TEXT NOT NULL,
    subject TEXT NOT NULL,
    chapter TEXT NOT NULL,
    source_file TEXT NOT NULL,
    page_number INTEGER NOT NULL,
    embedding BLOB NOT NULL
);
"#;

/// SQL for creating the metadata table
pub const CREATE_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQL for creating indexes used by topic listing
pub const CREATE_CHUNKS_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_chunks_topic ON chunks(grade, subject, chapter);
"#;

/// Metadata keys
pub const KEY_SCHEMA_VERSION: &str = "schema_version";
pub const KEY_EMBEDDING_MODEL: &str = "embedding_model";
pub const KEY_EMBEDDING_DIMENSION: &str = "embedding_dimension";
pub const KEY_CHUNK_COUNT: &str = "chunk_count";
pub const KEY_BUILT_AT: &str = "built_at";
