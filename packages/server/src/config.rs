use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub llm: LlmConfig,
    pub scraper: ScraperConfig,
    pub store: StoreConfig,
}

/// Model access for the insight extractor.
///
/// `api_key: None` puts the extractor in mock mode.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// WebDriver endpoint; without it pages are fetched as static HTML
    pub webdriver_url: Option<String>,
    pub navigation_timeout: Duration,
    pub settle: SettleConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            navigation_timeout: Duration::from_secs(60),
            settle: SettleConfig::default(),
        }
    }
}

/// How long to keep scrolling for lazy-loaded content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleConfig {
    /// Wall-clock cap on the whole settle phase
    pub budget: Duration,
    /// Pause after each scroll before re-measuring the page
    pub poll_interval: Duration,
    /// Consecutive unchanged measurements that count as settled
    pub stable_rounds: u32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            stable_rounds: 2,
        }
    }
}

/// Where analyses are persisted, if anywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    None,
    Sqlite { url: String },
    Supabase { url: String, key: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Blank values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_defaults = LlmConfig::default();
        let scraper_defaults = ScraperConfig::default();

        let llm = LlmConfig {
            api_key: var("GEMINI_API_KEY"),
            base_url: var("LLM_BASE_URL").unwrap_or(llm_defaults.base_url),
            model: var("LLM_MODEL").unwrap_or(llm_defaults.model),
            timeout: parse_or(&var, "LLM_TIMEOUT_SECS", 120).map(Duration::from_secs)?,
        };

        let scraper = ScraperConfig {
            webdriver_url: var("WEBDRIVER_URL"),
            navigation_timeout: parse_or(
                &var,
                "SCRAPE_NAV_TIMEOUT_SECS",
                scraper_defaults.navigation_timeout.as_secs(),
            )
            .map(Duration::from_secs)?,
            settle: SettleConfig {
                budget: parse_or(
                    &var,
                    "SCRAPE_SETTLE_BUDGET_SECS",
                    scraper_defaults.settle.budget.as_secs(),
                )
                .map(Duration::from_secs)?,
                poll_interval: parse_or(
                    &var,
                    "SCRAPE_POLL_INTERVAL_MS",
                    scraper_defaults.settle.poll_interval.as_millis() as u64,
                )
                .map(Duration::from_millis)?,
                stable_rounds: parse_or(
                    &var,
                    "SCRAPE_STABLE_ROUNDS",
                    scraper_defaults.settle.stable_rounds,
                )?,
            },
        };

        let store = match (var("DATABASE_URL"), var("SUPABASE_URL"), var("SUPABASE_KEY")) {
            (Some(url), _, _) => StoreConfig::Sqlite { url },
            (None, Some(url), Some(key)) => StoreConfig::Supabase { url, key },
            (None, Some(_), None) => {
                warn!("SUPABASE_URL is set without SUPABASE_KEY, results will not be stored");
                StoreConfig::None
            }
            (None, None, _) => StoreConfig::None,
        };

        Ok(Self {
            port: parse_or(&var, "PORT", 8000)?,
            llm,
            scraper,
            store,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 8000);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert!(config.scraper.webdriver_url.is_none());
        assert_eq!(config.scraper.navigation_timeout, Duration::from_secs(60));
        assert_eq!(config.scraper.settle, SettleConfig::default());
        assert_eq!(config.store, StoreConfig::None);
    }

    #[test]
    fn test_blank_api_key_means_mock_mode() {
        let config = config_from(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("GEMINI_API_KEY", "key"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("WEBDRIVER_URL", "http://localhost:9515"),
            ("SCRAPE_POLL_INTERVAL_MS", "500"),
            ("SCRAPE_STABLE_ROUNDS", "3"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.llm.api_key.as_deref(), Some("key"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(
            config.scraper.webdriver_url.as_deref(),
            Some("http://localhost:9515")
        );
        assert_eq!(config.scraper.settle.poll_interval, Duration::from_millis(500));
        assert_eq!(config.scraper.settle.stable_rounds, 3);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_store_selection() {
        let sqlite = config_from(&[
            ("DATABASE_URL", "sqlite://hunter.db"),
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(
            sqlite.store,
            StoreConfig::Sqlite {
                url: "sqlite://hunter.db".into()
            }
        );

        let supabase = config_from(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(
            supabase.store,
            StoreConfig::Supabase {
                url: "https://x.supabase.co".into(),
                key: "k".into()
            }
        );

        let missing_key = config_from(&[("SUPABASE_URL", "https://x.supabase.co")]).unwrap();
        assert_eq!(missing_key.store, StoreConfig::None);
    }
}
