//! Language model access
//!
//! The pipeline sends one fully rendered prompt per request and reads back
//! plain text.

use crate::config::LlmConfig;
use crate::error::{Result, TutorError};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Text completion service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt; an empty completion is an error
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat-completions client for OpenAI-compatible APIs
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatModel {
    pub fn new(config: &LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(api_key) = &config.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                name: None,
            },
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                log::error!("No content in chat response from {}", self.model);
                TutorError::ModelInvocation("No content in response".to_string())
            })?;

        Ok(content.to_string())
    }
}

/// Build the configured language model client
pub fn build_language_model(config: &LlmConfig) -> Arc<dyn LanguageModel> {
    Arc::new(OpenAiChatModel::new(config))
}
