//! Embedding generation
//!
//! Every vector in one index must come from the same embedding model, so
//! each [`Embedder`] exposes a stable `model_id` that the index records.

use crate::config::{EmbeddingConfig, EmbeddingProvider, LlmConfig};
use crate::error::{Result, TutorError};
use crate::ml::similarity::normalize;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;
use std::hash::Hasher;
use std::sync::Arc;
use twox_hash::XxHash64;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Text embedding service
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model; stored alongside the index
    fn model_id(&self) -> &str;

    /// Embed a batch of documents, preserving order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.embed_documents(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| TutorError::ModelInvocation("Empty embedding response".to_string()))
    }
}

/// OpenAI-compatible embeddings client
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, llm: &LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(api_key) = &llm.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }
        if let Some(base_url) = &llm.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(batch.to_vec())
                .build()?;

            let response = self.client.embeddings().create(request).await?;
            let mut data = response.data;
            if data.len() != batch.len() {
                return Err(TutorError::ModelInvocation(format!(
                    "Requested {} embeddings, received {}",
                    batch.len(),
                    data.len()
                )));
            }
            data.sort_by_key(|item| item.index);
            embeddings.extend(data.into_iter().map(|item| item.embedding));
        }

        log::debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(embeddings)
    }
}

/// Deterministic bag-of-words embedder that needs no network
///
/// Each lower-cased word is hashed with xxHash into a signed bucket and the
/// result is normalized to unit length. Useful for tests and offline indexes.
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-{}", dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_text(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(word.to_lowercase().as_bytes());
            let hash = hasher.finish();

            let idx = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
        }

        normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Build the configured embedder
pub fn build_embedder(config: &EmbeddingConfig, llm: &LlmConfig) -> Arc<dyn Embedder> {
    match config.provider {
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::new(config, llm)),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(config.dimension)),
    }
}
