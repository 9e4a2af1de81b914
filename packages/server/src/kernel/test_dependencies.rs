// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{BaseAI, BaseContentExtractor, ServerDeps};
use crate::domains::analysis::insights::InsightExtractor;
use crate::domains::analysis::models::{AnalysisRecord, NewAnalysisRecord};
use crate::domains::analysis::store::{BaseResultStore, StoreError};

// =============================================================================
// Mock Content Extractor
// =============================================================================

#[derive(Debug, Clone)]
enum ExtractorResponse {
    Text(String),
    Failure(String),
    Panic(String),
}

pub struct MockContentExtractor {
    responses: Arc<Mutex<Vec<ExtractorResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockContentExtractor {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue page text to return
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(ExtractorResponse::Text(text.into()))
    }

    /// Queue an extraction failure (bad URL, timeout, blocked page)
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(ExtractorResponse::Failure(message.into()))
    }

    /// Queue a panic, standing in for a crash inside the browser adapter
    pub fn with_panic(self, message: impl Into<String>) -> Self {
        self.push(ExtractorResponse::Panic(message.into()))
    }

    fn push(self, response: ExtractorResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Get all URLs that were requested
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentExtractor for MockContentExtractor {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());

        let response = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };

        match response {
            Some(ExtractorResponse::Text(text)) => Ok(text),
            Some(ExtractorResponse::Failure(message)) => Err(anyhow::anyhow!(message)),
            Some(ExtractorResponse::Panic(message)) => panic!("{}", message),
            None => Ok("Mock page content. Customers say the product works.".to_string()),
        }
    }
}

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a raw model response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    /// Add a JSON response to the queue (will be serialized)
    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.with_response(json)
    }

    /// Make the next call fail with this message
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Err(message.into()));
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(r#"{"complaints": [], "hooks": []}"#.to_string());
        }

        responses.remove(0).map_err(|message| anyhow::anyhow!(message))
    }
}

// =============================================================================
// Failing Result Store
// =============================================================================

/// Store whose every operation fails, counting save attempts.
pub struct FailingStore {
    message: String,
    panics: bool,
    saves: Mutex<usize>,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            panics: false,
            saves: Mutex::new(0),
        }
    }

    /// Panic instead of returning an error
    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            panics: true,
            ..Self::new(message)
        }
    }

    pub fn save_attempts(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl BaseResultStore for FailingStore {
    async fn save(&self, _record: &NewAnalysisRecord) -> Result<i64, StoreError> {
        *self.saves.lock().unwrap() += 1;
        if self.panics {
            panic!("{}", self.message);
        }
        Err(StoreError::backend(self.message.clone()))
    }

    async fn get(&self, _id: i64) -> Result<AnalysisRecord, StoreError> {
        Err(StoreError::backend(self.message.clone()))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for ServerDeps wired entirely from mocks.
///
/// Defaults: mock extractor with canned text, mock insight strategy (as if
/// no model credential were set), no result store.
pub struct TestDependencies {
    pub extractor: Arc<MockContentExtractor>,
    pub ai: Option<Arc<MockAI>>,
    pub store: Option<Arc<dyn BaseResultStore>>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            extractor: Arc::new(MockContentExtractor::new()),
            ai: None,
            store: None,
        }
    }

    /// Set a mock content extractor
    pub fn mock_extractor(mut self, extractor: MockContentExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Analyze with a mock model instead of the mock strategy
    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Some(Arc::new(ai));
        self
    }

    /// Persist into the given store
    pub fn store(mut self, store: Arc<dyn BaseResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn into_deps(self) -> ServerDeps {
        let insights = match self.ai {
            Some(ai) => InsightExtractor::with_ai(ai),
            None => InsightExtractor::mock(),
        };

        ServerDeps::new(self.extractor, Arc::new(insights), self.store)
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
