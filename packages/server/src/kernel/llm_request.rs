// BaseAI over an OpenAI-compatible chat endpoint
//
// Gemini, OpenAI and OpenRouter all accept the same request; the config
// picks the base URL and model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::OpenAIClient;

use super::BaseAI;
use crate::config::LlmConfig;

/// Chat model bound to one model id.
#[derive(Clone)]
pub struct ChatModel {
    client: OpenAIClient,
    model: String,
}

impl ChatModel {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build from config. Returns `None` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref() else {
            return Ok(None);
        };

        let client = OpenAIClient::new(api_key)
            .with_base_url(&config.base_url)
            .with_timeout(config.timeout)
            .context("Failed to create chat client")?;

        Ok(Some(Self::new(client, &config.model)))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl BaseAI for ChatModel {
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Calling chat model"
        );

        // Display keeps the provider's message; it ends up in the report's `error`
        self.client
            .complete_json(&self.model, prompt)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}
