//! Error types for the WebDriver client.

use thiserror::Error;

/// Result type for WebDriver operations.
pub type Result<T> = std::result::Result<T, WebDriverError>;

/// WebDriver client errors.
#[derive(Debug, Error)]
pub enum WebDriverError {
    /// Could not reach the driver
    #[error("Network error: {0}")]
    Network(String),

    /// Driver answered with a W3C error object
    #[error("WebDriver error `{error}` ({status}): {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    /// Response was not the shape we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WebDriverError {
    /// Navigation or script exceeded its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WebDriverError::Protocol { error, .. } if error == "timeout" || error == "script timeout")
    }
}
