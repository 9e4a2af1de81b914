//! Browser extractor - drives a real browser over WebDriver
//!
//! Review pages load their content lazily as the reader scrolls, so after
//! navigation the page is scrolled until its size stops changing (or the
//! settle budget runs out) before the text is read.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use webdriver_client::{Capabilities, Session, WebDriverClient};

use super::simple_scraper::{parse_target, DESKTOP_USER_AGENT};
use super::BaseContentExtractor;
use crate::config::{ScraperConfig, SettleConfig};

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

const FINGERPRINT_SCRIPT: &str = "return { scroll_height: document.body.scrollHeight, text_length: document.body.innerText.length };";

/// Text of the page with scripts and styles removed from a detached copy.
const EXTRACT_TEXT_SCRIPT: &str = r#"
const clone = document.body.cloneNode(true);
clone.querySelectorAll('script, style').forEach((el) => el.remove());
return clone.innerText;
"#;

/// Cheap measure of how much content a page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageFingerprint {
    pub scroll_height: u64,
    pub text_length: u64,
}

/// A page that can be scrolled and measured while it settles.
#[async_trait]
pub trait ScrollablePage: Send + Sync {
    async fn scroll_to_bottom(&self) -> Result<()>;
    async fn fingerprint(&self) -> Result<PageFingerprint>;
}

#[async_trait]
impl ScrollablePage for Session {
    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute::<Value>(SCROLL_SCRIPT, vec![])
            .await
            .context("Scroll failed")?;
        Ok(())
    }

    async fn fingerprint(&self) -> Result<PageFingerprint> {
        self.execute(FINGERPRINT_SCRIPT, vec![])
            .await
            .context("Failed to measure page")
    }
}

/// How settling ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleReport {
    pub rounds: u32,
    /// Content stopped changing before the budget ran out
    pub stable: bool,
    pub elapsed: Duration,
}

/// Scroll and re-measure until the page stops growing or the budget is spent.
///
/// A round that starts before the budget expires always completes, so the
/// loop can overrun by at most one poll interval. Scroll or measurement
/// errors end settling early; whatever has loaded is still extracted.
pub async fn settle(page: &dyn ScrollablePage, config: &SettleConfig) -> SettleReport {
    let started = Instant::now();
    let mut rounds = 0;
    let mut unchanged = 0;
    let mut last: Option<PageFingerprint> = None;
    let mut stable = false;

    while started.elapsed() < config.budget {
        rounds += 1;

        if let Err(e) = page.scroll_to_bottom().await {
            warn!(error = %e, rounds, "Stopping settle after scroll error");
            break;
        }

        tokio::time::sleep(config.poll_interval).await;

        let current = match page.fingerprint().await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!(error = %e, rounds, "Stopping settle after measurement error");
                break;
            }
        };

        if last == Some(current) {
            unchanged += 1;
        } else {
            unchanged = 0;
        }
        last = Some(current);

        debug!(
            rounds,
            unchanged,
            scroll_height = current.scroll_height,
            text_length = current.text_length,
            "Settle round"
        );

        if unchanged >= config.stable_rounds {
            stable = true;
            break;
        }
    }

    let report = SettleReport {
        rounds,
        stable,
        elapsed: started.elapsed(),
    };

    if report.stable {
        info!(rounds, elapsed_ms = report.elapsed.as_millis() as u64, "Page settled");
    } else {
        info!(
            rounds,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Settle budget spent before page stabilized"
        );
    }

    report
}

/// Slack on top of the navigation timeout for each driver request.
const DRIVER_REQUEST_MARGIN: Duration = Duration::from_secs(30);

/// Content extractor backed by a WebDriver browser session.
pub struct WebDriverExtractor {
    driver: WebDriverClient,
    navigation_timeout: Duration,
    settle: SettleConfig,
}

impl WebDriverExtractor {
    pub fn new(webdriver_url: &str, config: &ScraperConfig) -> Result<Self> {
        let driver = WebDriverClient::new(webdriver_url)
            .with_timeout(Self::request_timeout(config))
            .context("Failed to build WebDriver client")?;

        Ok(Self {
            driver,
            navigation_timeout: config.navigation_timeout,
            settle: config.settle,
        })
    }

    fn request_timeout(config: &ScraperConfig) -> Duration {
        config.navigation_timeout + DRIVER_REQUEST_MARGIN
    }

    fn capabilities() -> Capabilities {
        Capabilities::chrome()
            .headless()
            .user_agent(DESKTOP_USER_AGENT)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
    }

    async fn read_page(&self, session: &Session, url: &str) -> Result<String> {
        session
            .set_page_load_timeout(self.navigation_timeout)
            .await
            .context("Failed to set navigation timeout")?;

        if let Err(e) = session.goto(url).await {
            if e.is_timeout() {
                warn!(url = %url, timeout_secs = self.navigation_timeout.as_secs(), "Navigation timed out");
            }
            return Err(e).with_context(|| format!("Navigation to {} failed", url));
        }

        settle(session, &self.settle).await;

        session
            .execute(EXTRACT_TEXT_SCRIPT, vec![])
            .await
            .context("Failed to read page text")
    }
}

#[async_trait]
impl BaseContentExtractor for WebDriverExtractor {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = parse_target(url)?;
        debug!(url = %url, "Opening browser session");

        let session = self
            .driver
            .new_session(&Self::capabilities())
            .await
            .context("Failed to start browser session")?;

        let result = self.read_page(&session, url.as_str()).await;

        // Failure is logged by the client; the page result stands either way
        let _ = session.delete().await;

        result
    }
}
