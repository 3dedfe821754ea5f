//! Retriever - metadata-filtered similarity search over the persisted index
//!
//! The index is loaded once into an immutable [`VectorIndex`] and shared by
//! every request. Filtering is exact-match on grade, subject and (optionally)
//! chapter; ranking is cosine similarity against the query embedding.

use crate::error::{Result, TutorError};
use crate::ml::{Embedder, Embedding, cosine_similarity};
use crate::storage::{IndexEntry, IndexInfo, IndexStore, Topic};
use crate::text::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Exact-match metadata predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalFilter {
    pub grade: String,
    /// Always stored lower-cased, matching how ingestion stores subjects
    pub subject: String,
    pub chapter: Option<String>,
}

impl RetrievalFilter {
    /// Filter on grade and subject; the subject is lower-cased
    pub fn new(grade: impl Into<String>, subject: impl AsRef<str>) -> Self {
        Self {
            grade: grade.into(),
            subject: subject.as_ref().to_lowercase(),
            chapter: None,
        }
    }

    /// Also restrict to one chapter
    pub fn with_chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn matches(&self, chunk: &Chunk) -> bool {
        chunk.grade == self.grade
            && chunk.subject == self.subject
            && self
                .chapter
                .as_ref()
                .is_none_or(|chapter| &chunk.chapter == chapter)
    }
}

/// Retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: Chunk,
}

/// In-memory, read-only view of a persisted index
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    info: IndexInfo,
}

impl VectorIndex {
    /// Load a persisted index from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let store = IndexStore::open_read_only(path)?;
        let info = store.info()?;
        let entries = store.load_entries().map_err(|e| {
            TutorError::IndexUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != info.dimension) {
            return Err(TutorError::IndexUnavailable(format!(
                "Corrupt entry from {}: dimension {} instead of {}",
                bad.chunk.source_file,
                bad.vector.len(),
                info.dimension
            )));
        }

        log::info!(
            "Loaded index {} ({} entries, model {})",
            path.display(),
            entries.len(),
            info.embedding_model
        );
        Ok(Self { entries, info })
    }

    /// Build an index directly from entries
    pub fn from_entries(entries: Vec<IndexEntry>, embedding_model: impl Into<String>) -> Self {
        let dimension = entries.first().map(|e| e.vector.len()).unwrap_or(0);
        let info = IndexInfo {
            embedding_model: embedding_model.into(),
            dimension,
            chunk_count: entries.len(),
            built_at: None,
        };
        Self { entries, info }
    }

    pub fn info(&self) -> &IndexInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grade/subject pairs present in the index with their chapters, sorted
    pub fn topics(&self) -> Vec<Topic> {
        let mut grouped: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
        for entry in &self.entries {
            grouped
                .entry((entry.chunk.grade.as_str(), entry.chunk.subject.as_str()))
                .or_default()
                .insert(entry.chunk.chapter.as_str());
        }

        grouped
            .into_iter()
            .map(|((grade, subject), chapters)| Topic {
                grade: grade.to_string(),
                subject: subject.to_string(),
                chapters: chapters.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }

    /// Top-`k` entries matching `filter`, by descending similarity
    pub fn search(&self, query: &[f32], filter: &RetrievalFilter, k: usize) -> Vec<ScoredChunk> {
        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(&entry.chunk))
            .map(|entry| ScoredChunk {
                score: cosine_similarity(query, &entry.vector),
                chunk: entry.chunk.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        results
    }
}

/// Embeds queries and searches the shared index
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Open the persisted index at `path` for use with `embedder`
    pub fn open<P: AsRef<Path>>(path: P, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let index = VectorIndex::load(path)?;
        Self::new(Arc::new(index), embedder)
    }

    /// Wrap an already loaded index; fails if it was built with another model
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if index.info().embedding_model != embedder.model_id() {
            return Err(TutorError::EmbeddingMismatch {
                expected: embedder.model_id().to_string(),
                found: index.info().embedding_model.clone(),
            });
        }
        Ok(Self { index, embedder })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Up to `k` chunks matching `filter`, most similar first
    pub async fn retrieve(&self, query: &str, filter: &RetrievalFilter, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(query, filter, k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping similarity scores
    pub async fn retrieve_scored(
        &self,
        query: &str,
        filter: &RetrievalFilter,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding: Embedding = self.embedder.embed_query(query).await?;
        if !self.index.is_empty() && query_embedding.len() != self.index.info().dimension {
            return Err(TutorError::EmbeddingMismatch {
                expected: format!("dimension {}", self.index.info().dimension),
                found: format!("dimension {}", query_embedding.len()),
            });
        }

        let results = self.index.search(&query_embedding, filter, k);
        log::debug!(
            "Retrieved {} chunks for grade {} subject {} chapter {:?}",
            results.len(),
            filter.grade,
            filter.subject,
            filter.chapter
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::HashingEmbedder;

    fn chunk(grade: &str, subject: &str, chapter: &str, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            grade: grade.to_string(),
            subject: subject.to_string(),
            chapter: chapter.to_string(),
            source_file: format!("{}.pdf", chapter),
            page_number: 1,
        }
    }

    async fn index_of(embedder: &HashingEmbedder, chunks: Vec<Chunk>) -> VectorIndex {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { vector, chunk })
            .collect();
        VectorIndex::from_entries(entries, embedder.model_id())
    }

    #[test]
    fn test_filter_lowercases_subject() {
        let filter = RetrievalFilter::new("11", "Physics");
        assert_eq!(filter.subject, "physics");
        assert!(filter.matches(&chunk("11", "physics", "chapter1", "x")));
        assert!(!filter.matches(&chunk("12", "physics", "chapter1", "x")));
        assert!(!filter.matches(&chunk("11", "chemistry", "chapter1", "x")));
    }

    #[test]
    fn test_filter_chapter_is_optional() {
        let filter = RetrievalFilter::new("11", "physics").with_chapter("chapter2");
        assert!(!filter.matches(&chunk("11", "physics", "chapter1", "x")));
        assert!(filter.matches(&chunk("11", "physics", "chapter2", "x")));
    }

    #[tokio::test]
    async fn test_retrieve_ranks_and_filters() {
        let embedder = HashingEmbedder::new(256);
        let index = index_of(
            &embedder,
            vec![
                chunk("11", "physics", "chapter1", "velocity is the rate of change of displacement"),
                chunk("11", "physics", "chapter2", "work energy and power"),
                chunk("12", "physics", "chapter1", "velocity of electromagnetic waves"),
                chunk("11", "chemistry", "chapter1", "velocity of a reaction"),
            ],
        )
        .await;
        let retriever = Retriever::new(Arc::new(index), Arc::new(embedder)).unwrap();

        let filter = RetrievalFilter::new("11", "Physics");
        let results = retriever.retrieve_scored("what is velocity", &filter, 4).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.chapter, "chapter1");
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| filter.matches(&r.chunk)));
    }

    #[tokio::test]
    async fn test_retrieve_respects_k() {
        let embedder = HashingEmbedder::new(64);
        let chunks = (0..10)
            .map(|i| chunk("11", "physics", "chapter1", &format!("fact number {}", i)))
            .collect();
        let index = index_of(&embedder, chunks).await;
        let retriever = Retriever::new(Arc::new(index), Arc::new(embedder)).unwrap();

        let filter = RetrievalFilter::new("11", "physics");
        assert_eq!(retriever.retrieve("fact", &filter, 4).await.unwrap().len(), 4);
        assert_eq!(retriever.retrieve("fact", &filter, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_matching_entries_is_empty() {
        let embedder = HashingEmbedder::new(64);
        let index = index_of(&embedder, vec![chunk("11", "physics", "chapter1", "force")]).await;
        let retriever = Retriever::new(Arc::new(index), Arc::new(embedder)).unwrap();

        let results = retriever
            .retrieve("force", &RetrievalFilter::new("9", "biology"), 4)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_model_mismatch_rejected() {
        let index = index_of(&HashingEmbedder::new(64), vec![chunk("11", "physics", "c", "x")]).await;
        let result = Retriever::new(Arc::new(index), Arc::new(HashingEmbedder::new(32)));
        assert!(matches!(result, Err(TutorError::EmbeddingMismatch { .. })));
    }

    #[test]
    fn test_open_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = Retriever::open(
            dir.path().join("index.db"),
            Arc::new(HashingEmbedder::new(8)),
        );
        assert!(matches!(result, Err(TutorError::IndexUnavailable(_))));
    }

    #[tokio::test]
    async fn test_topics_group_chapters() {
        let embedder = HashingEmbedder::new(32);
        let index = index_of(
            &embedder,
            vec![
                chunk("11", "physics", "chapter2", "a"),
                chunk("11", "physics", "chapter1", "b"),
                chunk("11", "physics", "chapter1", "c"),
                chunk("10", "biology", "cells", "d"),
            ],
        )
        .await;

        let topics = index.topics();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].grade, "10");
        assert_eq!(topics[1].chapters, vec!["chapter1", "chapter2"]);
    }
}
