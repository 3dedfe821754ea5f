//! IndexBuilder - embeds chunks and persists the similarity index

use crate::error::{Result, TutorError};
use crate::ml::Embedder;
use crate::storage::schema::{KEY_BUILT_AT, KEY_CHUNK_COUNT, KEY_EMBEDDING_DIMENSION, KEY_EMBEDDING_MODEL};
use crate::storage::{BuildStats, IndexStore};
use crate::text::Chunk;
use crate::utils::ensure_parent_directory;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Builds a persisted index from chunks
///
/// A build always replaces the previous index at the same location. The
/// new index is written next to the target and renamed into place once
/// complete, so readers never observe a half-written file.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    /// Draw a progress bar while embedding
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed `chunks` and write them to `index_path`
    pub async fn build<P: AsRef<Path>>(&self, chunks: &[Chunk], index_path: P) -> Result<BuildStats> {
        if chunks.is_empty() {
            return Err(TutorError::EmptyCorpus);
        }

        let start_time = Instant::now();
        let index_path = index_path.as_ref();
        ensure_parent_directory(index_path)?;

        log::info!(
            "Embedding {} chunks with {}",
            chunks.len(),
            self.embedder.model_id()
        );

        let progress = self.progress_bar(chunks.len());
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            embeddings.extend(self.embedder.embed_documents(&texts).await?);
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
            return Err(TutorError::ModelInvocation(
                "Embedding model returned vectors of inconsistent dimension".to_string(),
            ));
        }

        let staging_path = staging_path(index_path);
        remove_index_files(&staging_path)?;

        {
            let mut store = IndexStore::create(&staging_path)?;
            store.insert_entries(chunks, &embeddings)?;
            store.set_metadata(KEY_EMBEDDING_MODEL, self.embedder.model_id())?;
            store.set_metadata(KEY_EMBEDDING_DIMENSION, &dimension.to_string())?;
            store.set_metadata(KEY_CHUNK_COUNT, &chunks.len().to_string())?;
            store.set_metadata(KEY_BUILT_AT, &chrono::Utc::now().to_rfc3339())?;
        }

        remove_index_files(index_path)?;
        std::fs::rename(&staging_path, index_path)?;

        let stats = BuildStats {
            total_chunks: chunks.len(),
            dimension,
            processing_time: start_time.elapsed().as_secs_f64(),
            index_file_size: std::fs::metadata(index_path)?.len(),
        };

        log::info!(
            "Index saved to {} ({} chunks, dimension {})",
            index_path.display(),
            stats.total_chunks,
            stats.dimension
        );
        Ok(stats)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} Embedding [{bar:40}] {pos}/{len} chunks")
        {
            bar.set_style(style);
        }
        bar
    }
}

fn staging_path(index_path: &Path) -> PathBuf {
    let mut name = index_path.as_os_str().to_owned();
    name.push(".building");
    PathBuf::from(name)
}

/// Remove a database file and any SQLite side files next to it
fn remove_index_files(path: &Path) -> Result<()> {
    for suffix in ["", "-journal", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        let candidate = PathBuf::from(name);
        if candidate.exists() {
            std::fs::remove_file(&candidate)?;
        }
    }
    Ok(())
}
