//! DocumentIngestor - turns a `grade_<N>/<subject>/<chapter-file>` tree into chunks

use crate::config::ChunkingConfig;
use crate::error::{Result, TutorError};
use crate::text::{Chunk, ChunkSource, TextChunker, loader_for};
use crate::utils::is_supported_document;
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of ingesting a content directory
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// All chunks, ordered by source path then page
    pub chunks: Vec<Chunk>,

    /// Files that produced chunks
    pub files_processed: usize,

    /// Files skipped because of their path shape or a load failure
    pub files_skipped: usize,
}

/// Loads source documents and splits them into metadata-tagged chunks
pub struct DocumentIngestor {
    chunker: TextChunker,
    grade_prefix: String,
}

impl DocumentIngestor {
    /// Create a new ingestor with the given chunking configuration
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        let grade_prefix = config.grade_prefix.clone();
        Ok(Self {
            chunker: TextChunker::new(config)?,
            grade_prefix,
        })
    }

    /// Walk `root` and ingest every supported document below it
    ///
    /// Bad paths and unreadable files are logged and skipped; ingestion
    /// carries on with the remaining files.
    pub fn ingest_dir<P: AsRef<Path>>(&self, root: P) -> Result<IngestReport> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(TutorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Content directory not found: {}", root.display()),
            )));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_supported_document(entry.path()) => {
                    files.push(entry.into_path())
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping unreadable directory entry: {}", e),
            }
        }

        log::info!("Found {} documents under {}", files.len(), root.display());

        let results: Vec<(PathBuf, Result<Vec<Chunk>>)> = files
            .into_par_iter()
            .map(|path| {
                let result = path
                    .strip_prefix(root)
                    .map_err(|e| TutorError::IngestionSkip(e.to_string()))
                    .and_then(|relative| self.source_for(relative, &path))
                    .and_then(|source| self.chunk_document(&path, &source));
                (path, result)
            })
            .collect();

        let mut report = IngestReport::default();
        for (path, result) in results {
            match result {
                Ok(chunks) => {
                    report.files_processed += 1;
                    report.chunks.extend(chunks);
                }
                Err(TutorError::IngestionSkip(reason)) => {
                    log::warn!("Skipping improperly structured path {}: {}", path.display(), reason);
                    report.files_skipped += 1;
                }
                Err(e) => {
                    log::error!("Failed to process {}: {}", path.display(), e);
                    report.files_skipped += 1;
                }
            }
        }

        log::info!(
            "Ingested {} chunks from {} files ({} skipped)",
            report.chunks.len(),
            report.files_processed,
            report.files_skipped
        );
        Ok(report)
    }

    /// Ingest a single document, deriving metadata from its own path
    pub fn ingest_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Chunk>> {
        let path = path.as_ref();
        let source = self.source_for(path, path)?;
        self.chunk_document(path, &source)
    }

    /// Derive grade, subject and chapter from the last three path segments
    pub fn source_for(&self, segments: &Path, full_path: &Path) -> Result<ChunkSource> {
        let parts: Vec<&str> = segments
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        if parts.len() < 3 {
            return Err(TutorError::IngestionSkip(format!(
                "expected grade/subject/chapter, got {} segment(s)",
                parts.len()
            )));
        }

        let grade_dir = parts[parts.len() - 3];
        let grade = grade_dir
            .strip_prefix(self.grade_prefix.as_str())
            .unwrap_or(grade_dir)
            .to_string();
        let subject = parts[parts.len() - 2].to_lowercase();
        let chapter = Path::new(parts[parts.len() - 1])
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| TutorError::IngestionSkip("file has no name".to_string()))?;

        log::info!("Processing → Grade {}, Subject {}, Chapter {}", grade, subject, chapter);

        Ok(ChunkSource {
            grade,
            subject,
            chapter,
            source_file: full_path.to_string_lossy().to_string(),
        })
    }

    fn chunk_document(&self, path: &Path, source: &ChunkSource) -> Result<Vec<Chunk>> {
        let loader = loader_for(path).ok_or_else(|| {
            TutorError::IngestionSkip(format!("unsupported document type: {}", path.display()))
        })?;

        let pages = loader.load(path)?;
        let chunks: Vec<Chunk> = pages
            .iter()
            .flat_map(|page| self.chunker.chunk_page(&page.text, page.number, source))
            .collect();

        log::debug!("{} pages → {} chunks from {}", pages.len(), chunks.len(), path.display());
        Ok(chunks)
    }
}
