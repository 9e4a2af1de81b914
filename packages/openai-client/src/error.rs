//! Error types for the chat client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// Chat client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Missing API key or invalid client settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the endpoint
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The endpoint answered 2xx but without usable content
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Whether the endpoint rejected the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, OpenAIError::Api { status: 401 | 403, .. })
    }
}
