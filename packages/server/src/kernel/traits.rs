// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// What to prompt for and how to read the answer lives in domains/analysis.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseContentExtractor)

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt expecting a JSON object back (returns raw text).
    /// The text may still need repair before parsing.
    async fn complete_json(&self, prompt: &str) -> Result<String>;
}

// =============================================================================
// Content Extractor Trait (Infrastructure - page text retrieval)
// =============================================================================

#[async_trait]
pub trait BaseContentExtractor: Send + Sync {
    /// Fetch the visible text of a page.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Fetch the visible text of a page, or `None` on any failure.
    ///
    /// Errors are logged here; callers treat every `None` as the same
    /// extraction failure. Whitespace-only text counts as no content.
    async fn extract(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!(url = %url, "Page yielded no text");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Content extraction failed");
                None
            }
        }
    }
}
