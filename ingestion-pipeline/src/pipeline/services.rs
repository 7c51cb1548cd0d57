use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use common::{error::AppError, utils::config::AppConfig};

use crate::utils::file_text_extraction::{extract_source, DocumentSource, ExtractedDocument};

/// External collaborators of the generation pipeline.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    async fn extract_document(
        &self,
        source: &DocumentSource,
    ) -> Result<ExtractedDocument, AppError>;

    /// One chat completion with a single user message, returning the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

pub struct DefaultPipelineServices {
    openai_client: Arc<Client<OpenAIConfig>>,
    completion_model: String,
}

impl DefaultPipelineServices {
    pub fn new(openai_client: Arc<Client<OpenAIConfig>>, completion_model: String) -> Self {
        Self {
            openai_client,
            completion_model,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        if config.openai_api_key.trim().is_empty() {
            return Err(AppError::Validation(
                "openai_api_key is required for QA generation".into(),
            ));
        }

        let openai_client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        );

        Ok(Self::new(
            Arc::new(openai_client),
            config.completion_model.clone(),
        ))
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn extract_document(
        &self,
        source: &DocumentSource,
    ) -> Result<ExtractedDocument, AppError> {
        extract_source(source).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.completion_model)
            .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
            .temperature(0.0)
            .build()?;

        let response = self.openai_client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
    }
}
