//! Server dependencies (using traits for testability)
//!
//! The central dependency container shared by the HTTP handlers and the
//! CLI. Every external service sits behind a trait so tests can swap in
//! the mocks from `test_dependencies`.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use super::browser_scraper::WebDriverExtractor;
use super::simple_scraper::HttpExtractor;
use super::BaseContentExtractor;
use crate::config::{Config, ScraperConfig};
use crate::domains::analysis::insights::InsightExtractor;
use crate::domains::analysis::store::{connect_store, BaseResultStore};

#[derive(Clone)]
pub struct ServerDeps {
    pub content_extractor: Arc<dyn BaseContentExtractor>,
    pub insights: Arc<InsightExtractor>,
    /// `None` when no database is configured; analyses are then not persisted
    pub result_store: Option<Arc<dyn BaseResultStore>>,
}

impl ServerDeps {
    pub fn new(
        content_extractor: Arc<dyn BaseContentExtractor>,
        insights: Arc<InsightExtractor>,
        result_store: Option<Arc<dyn BaseResultStore>>,
    ) -> Self {
        Self {
            content_extractor,
            insights,
            result_store,
        }
    }

    /// Wire the real adapters selected by the configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let content_extractor = content_extractor(&config.scraper)?;
        let insights = InsightExtractor::from_config(&config.llm)?;
        let result_store = connect_store(&config.store)
            .await
            .context("Failed to connect result store")?;

        Ok(Self::new(content_extractor, Arc::new(insights), result_store))
    }
}

fn content_extractor(config: &ScraperConfig) -> Result<Arc<dyn BaseContentExtractor>> {
    match &config.webdriver_url {
        Some(url) => {
            info!(webdriver_url = %url, "Using browser content extractor");
            Ok(Arc::new(WebDriverExtractor::new(url, config)?))
        }
        None => {
            info!("No WEBDRIVER_URL set, using static HTTP content extractor");
            Ok(Arc::new(HttpExtractor::new(config.navigation_timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, StoreConfig};

    fn config(store: StoreConfig) -> Config {
        Config {
            port: 8000,
            llm: LlmConfig::default(),
            scraper: ScraperConfig::default(),
            store,
        }
    }

    #[tokio::test]
    async fn test_defaults_wire_mock_insights_without_store() {
        let deps = ServerDeps::from_config(&config(StoreConfig::None)).await.unwrap();

        assert_eq!(deps.insights.strategy_name(), "mock");
        assert!(deps.result_store.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_is_connected() {
        let deps = ServerDeps::from_config(&config(StoreConfig::Sqlite {
            url: "sqlite::memory:".into(),
        }))
        .await
        .unwrap();

        assert!(deps.result_store.is_some());
    }
}
