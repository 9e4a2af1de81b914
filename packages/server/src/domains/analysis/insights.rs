//! Insight extraction: scraped text in, complaints and hooks out.
//!
//! The extractor picks its strategy once, at construction: with a model
//! credential it prompts the model, without one it serves a fixed mock
//! report so the rest of the pipeline can run offline. Neither strategy
//! fails; problems are reported inside the returned [`InsightReport`].

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use openai_client::truncate_chars;
use tracing::{info, warn};

use super::models::{InsightItem, InsightReport, MAX_MODEL_INPUT_CHARS};
use super::sanitize::parse_report;
use crate::config::LlmConfig;
use crate::kernel::{BaseAI, ChatModel};

/// Turns page text into an [`InsightReport`]. Must not fail.
#[async_trait]
pub trait InsightStrategy: Send + Sync {
    async fn analyze(&self, text: &str) -> InsightReport;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Fixed report used when no model credential is configured.
pub struct MockInsights;

impl MockInsights {
    pub fn report() -> InsightReport {
        InsightReport::new(
            vec![InsightItem::new(
                "Missing API Key",
                "high",
                "Please set GEMINI_API_KEY",
            )],
            vec![InsightItem::new(
                "Great Error Handling",
                "high",
                "System expects keys",
            )],
        )
    }
}

#[async_trait]
impl InsightStrategy for MockInsights {
    async fn analyze(&self, _text: &str) -> InsightReport {
        Self::report()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Prompts a model and repairs its answer.
pub struct ModelInsights {
    ai: Arc<dyn BaseAI>,
}

impl ModelInsights {
    pub fn new(ai: Arc<dyn BaseAI>) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl InsightStrategy for ModelInsights {
    async fn analyze(&self, text: &str) -> InsightReport {
        let content = truncate_chars(text, MAX_MODEL_INPUT_CHARS);
        let prompt = build_prompt(content);

        let raw = match self.ai.complete_json(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Model call failed");
                return InsightReport::degraded(e.to_string());
            }
        };

        match parse_report(&raw) {
            Ok(report) => {
                info!(
                    complaints = report.complaints.len(),
                    hooks = report.hooks.len(),
                    "Model analysis parsed"
                );
                report
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_chars(&raw, 200),
                    "Model response could not be parsed"
                );
                InsightReport::degraded(e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "model"
    }
}

/// Prompt asking for the top complaints and hooks as bare JSON.
pub fn build_prompt(content: &str) -> String {
    format!(
        r#"You are a direct-response marketing expert. Analyze the following customer feedback/reviews for a product.

Identify the top 3 'Recurring Complaints' (Pain Points) and the top 3 'Emotional Triggers' (Hooks).

Return the response STRICTLY as a JSON object. Do not add any markdown formatting like ```json ... ```.
The JSON schema is:
{{
    "complaints": [{{"insight": "string", "frequency": "high/medium/low", "suggested_copy": "string"}}],
    "hooks": [{{"insight": "string", "frequency": "high/medium/low", "suggested_copy": "string"}}]
}}

Reviews/Content:
{content}
"#
    )
}

/// Insight extractor with the strategy chosen at construction.
#[derive(Clone)]
pub struct InsightExtractor {
    strategy: Arc<dyn InsightStrategy>,
}

impl InsightExtractor {
    /// Model-backed when `config.api_key` is set, mock otherwise.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match ChatModel::from_config(config)? {
            Some(model) => {
                info!(model = %model.model(), "Insight extractor using chat model");
                Ok(Self::with_ai(Arc::new(model)))
            }
            None => {
                warn!("No GEMINI_API_KEY found, insight extractor returns mock data");
                Ok(Self::mock())
            }
        }
    }

    pub fn with_ai(ai: Arc<dyn BaseAI>) -> Self {
        Self::with_strategy(Arc::new(ModelInsights::new(ai)))
    }

    pub fn mock() -> Self {
        Self::with_strategy(Arc::new(MockInsights))
    }

    pub fn with_strategy(strategy: Arc<dyn InsightStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub async fn analyze(&self, text: &str) -> InsightReport {
        self.strategy.analyze(text).await
    }
}
