//! Minimal client for OpenAI-compatible chat completion endpoints.
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI, Gemini's
//! compatibility layer, OpenRouter and most local inference servers.
//! No domain logic lives here.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, Message, OpenAIClient};
//!
//! let client = OpenAIClient::new(api_key)
//!     .with_base_url("https://generativelanguage.googleapis.com/v1beta/openai");
//!
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new("gemini-2.5-flash")
//!             .message(Message::user("Reply with {\"ok\": true}"))
//!             .json_mode(),
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

/// Default endpoint base.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completions client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a client for the given API key against the OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Returns the content of the first choice.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "Chat completion request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %body, "Chat completion API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let choice = raw
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OpenAIError::EmptyResponse("no choices returned".into()))?;

        let content = choice.message.content.ok_or_else(|| {
            OpenAIError::EmptyResponse(format!(
                "choice has no content (finish_reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            response_chars = content.chars().count(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            finish_reason: choice.finish_reason,
            usage: raw.usage,
        })
    }

    /// Single-prompt completion in JSON mode, returning the raw text.
    pub async fn complete_json(&self, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(model)
            .message(Message::user(prompt))
            .json_mode();

        Ok(self.chat_completion(request).await?.content)
    }
}
