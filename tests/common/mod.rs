//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use textbook_tutor::config::EmbeddingProvider;
use textbook_tutor::ml::{Embedder, HashingEmbedder, LanguageModel};
use textbook_tutor::{Config, DocumentIngestor, IndexBuilder, Result, Retriever, TutorError};

pub const EMBEDDING_DIMENSION: usize = 256;

/// Language model that replays a fixed reply and records every prompt
pub struct ScriptedModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as if the remote service were down
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| TutorError::ModelInvocation("service unavailable".to_string()))
    }
}

/// Write `content` to `root/relative`, creating parent directories
pub fn write_document(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A small two-grade textbook tree; pages are separated by form feeds
pub fn write_textbooks(root: &Path) {
    write_document(
        root,
        "grade_11/physics/chapter1.txt",
        "Motion in a straight line. Velocity is the rate of change of displacement with time.\x0c\
         Acceleration is the rate of change of velocity with time. Its SI unit is metre per second squared.",
    );
    write_document(
        root,
        "grade_11/physics/chapter2.txt",
        "Work, energy and power. The SI unit of energy is the joule.",
    );
    write_document(
        root,
        "grade_12/chemistry/chapter1.txt",
        "Solutions. Molarity is the number of moles of solute per litre of solution.",
    );
}

/// Configuration using the offline hashing embedder, rooted in `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.data_dir = dir.join("data");
    config.index_path = dir.join("vector_store").join("index.db");
    config.embedding.provider = EmbeddingProvider::Hashing;
    config.embedding.dimension = EMBEDDING_DIMENSION;
    config
}

pub fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::new(EMBEDDING_DIMENSION))
}

/// Ingest `config.data_dir` and build the index, returning its path
pub async fn build_index(config: &Config) -> PathBuf {
    let report = DocumentIngestor::new(config.chunking.clone())
        .unwrap()
        .ingest_dir(&config.data_dir)
        .unwrap();
    IndexBuilder::new(embedder(), config.embedding.batch_size)
        .build(&report.chunks, &config.index_path)
        .await
        .unwrap();
    config.index_path.clone()
}

/// Write the fixture tree, build its index and open a retriever over it
pub async fn indexed_retriever(dir: &Path) -> (Config, Retriever) {
    let config = test_config(dir);
    write_textbooks(&config.data_dir);
    let index_path = build_index(&config).await;
    let retriever = Retriever::open(index_path, embedder()).unwrap();
    (config, retriever)
}
