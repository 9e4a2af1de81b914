//! Thin W3C WebDriver REST client.
//!
//! Covers the handful of endpoints needed to drive a browser for text
//! extraction: session lifecycle, timeouts, navigation and synchronous
//! script execution. Works against chromedriver, geckodriver and Selenium.
//!
//! # Example
//!
//! ```rust,ignore
//! use webdriver_client::{Capabilities, WebDriverClient};
//!
//! let driver = WebDriverClient::new("http://localhost:9515");
//! let session = driver.new_session(&Capabilities::chrome().headless()).await?;
//!
//! let result = async {
//!     session.goto("https://example.com").await?;
//!     session.execute::<String>("return document.title;", vec![]).await
//! }
//! .await;
//!
//! session.delete().await?;
//! let title = result?;
//! ```

pub mod error;

pub use error::{Result, WebDriverError};

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Response envelope: every W3C response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Requested browser capabilities.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    browser_name: String,
    args: Vec<String>,
}

impl Capabilities {
    /// Chrome / Chromium.
    pub fn chrome() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            args: Vec::new(),
        }
    }

    pub fn headless(mut self) -> Self {
        self.args.push("--headless=new".to_string());
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.args.push(format!("--user-agent={}", user_agent));
        self
    }

    /// Add a raw browser command line argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Body of a `POST /session` request.
    pub fn to_json(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": self.browser_name,
                    "goog:chromeOptions": { "args": self.args },
                }
            }
        })
    }
}

/// Client for a WebDriver endpoint.
#[derive(Clone)]
pub struct WebDriverClient {
    http_client: Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Bound every driver request by `timeout`.
    ///
    /// Page-load timeouts only bind the browser; a driver that stops
    /// answering would otherwise hold the caller forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebDriverError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a browser session.
    ///
    /// The caller owns the session and must call [`Session::delete`] on
    /// every exit path; the driver keeps the browser alive otherwise.
    pub async fn new_session(&self, capabilities: &Capabilities) -> Result<Session> {
        let value = self
            .send(
                self.http_client
                    .post(format!("{}/session", self.base_url))
                    .json(&capabilities.to_json()),
            )
            .await?;

        let created: NewSessionValue = serde_json::from_value(value)
            .map_err(|e| WebDriverError::Parse(format!("Invalid new session response: {}", e)))?;

        debug!(session_id = %created.session_id, "WebDriver session created");

        Ok(Session {
            client: self.clone(),
            id: created.session_id,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| WebDriverError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WebDriverError::Network(e.to_string()))?;

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| {
            WebDriverError::Parse(format!("HTTP {}: {} ({})", status, text, e))
        })?;

        if !status.is_success() {
            let error: ErrorValue = serde_json::from_value(envelope.value).map_err(|_| {
                WebDriverError::Parse(format!("HTTP {} without error object: {}", status, text))
            })?;
            return Err(WebDriverError::Protocol {
                status: status.as_u16(),
                error: error.error,
                message: error.message,
            });
        }

        Ok(envelope.value)
    }
}

/// An open browser session.
pub struct Session {
    client: WebDriverClient,
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.client.base_url, self.id, suffix)
    }

    /// Limit how long navigation may wait for the page load.
    pub async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.client
            .send(
                self.client
                    .http_client
                    .post(self.url("/timeouts"))
                    .json(&json!({ "pageLoad": timeout.as_millis() as u64 })),
            )
            .await?;
        Ok(())
    }

    /// Navigate and wait for the load event.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client
            .send(
                self.client
                    .http_client
                    .post(self.url("/url"))
                    .json(&json!({ "url": url })),
            )
            .await?;
        Ok(())
    }

    /// Run a synchronous script and decode its return value.
    pub async fn execute<T: DeserializeOwned>(&self, script: &str, args: Vec<Value>) -> Result<T> {
        let value = self
            .client
            .send(
                self.client
                    .http_client
                    .post(self.url("/execute/sync"))
                    .json(&json!({ "script": script, "args": args })),
            )
            .await?;

        serde_json::from_value(value)
            .map_err(|e| WebDriverError::Parse(format!("Unexpected script result: {}", e)))
    }

    /// End the session and close the browser.
    pub async fn delete(self) -> Result<()> {
        let result = self
            .client
            .send(self.client.http_client.delete(self.url("")))
            .await;

        match &result {
            Ok(_) => debug!(session_id = %self.id, "WebDriver session deleted"),
            Err(e) => warn!(session_id = %self.id, error = %e, "Failed to delete WebDriver session"),
        }

        result.map(|_| ())
    }
}
