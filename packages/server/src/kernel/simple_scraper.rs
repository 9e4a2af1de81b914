//! Static HTML extractor - plain HTTP GET + HTML parsing
//!
//! Used when no WebDriver endpoint is configured. Fetches the page with a
//! browser-like request and walks the parsed document for visible text.
//!
//! Limitations:
//! - No JavaScript rendering, so lazy-loaded reviews are missed

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::BaseContentExtractor;

/// Desktop Chrome user agent shared by both extractors.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Subtrees that never contribute visible text
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that start a new line of text
const BLOCK_TAGS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "p", "section",
    "tr",
];

/// Visible-text extractor over plain HTTP.
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DESKTOP_USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

#[async_trait]
impl BaseContentExtractor for HttpExtractor {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = parse_target(url)?;
        debug!(url = %url, "Fetching page over HTTP");

        let html = self.fetch_html(url.as_str()).await?;
        let text = visible_text(&html);

        debug!(url = %url, chars = text.chars().count(), "Extracted page text");
        Ok(text)
    }
}

/// Add `https://` when the URL has no scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Normalize and validate a user-supplied URL.
pub fn parse_target(url: &str) -> Result<Url> {
    let normalized = normalize_url(url);
    Url::parse(&normalized).with_context(|| format!("Invalid URL: {}", normalized))
}

/// Text a reader would see in `<body>`, one non-empty line per block.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    match Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        Some(body) => collect_text(body, &mut raw),
        None => collect_text(document.root_element(), &mut raw),
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRODUCT_PAGE: &str = r#"<html>
        <head><title>Widget</title><style>body { color: red; }</style></head>
        <body>
            <script>window.tracking = "ignore me";</script>
            <h1>Super   Widget</h1>
            <div class="review"><p>Great product but battery dies fast.</p></div>
            <noscript>Enable JavaScript</noscript>
            <ul><li>Too small</li><li>Arrived late</li></ul>
        </body>
    </html>"#;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let text = visible_text(PRODUCT_PAGE);

        assert_eq!(
            text,
            "Super Widget\nGreat product but battery dies fast.\nToo small\nArrived late"
        );
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Enable JavaScript"));
    }

    #[test]
    fn test_visible_text_of_empty_body_is_empty() {
        assert_eq!(visible_text("<html><body>   \n  </body></html>"), "");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_parse_target_rejects_garbage() {
        assert!(parse_target("not a url at all").is_err());
        assert_eq!(
            parse_target("shop.example/dp/X").unwrap().as_str(),
            "https://shop.example/dp/X"
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_visible_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B000"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
            .mount(&server)
            .await;

        let extractor = HttpExtractor::new(Duration::from_secs(5)).unwrap();
        let text = extractor
            .extract(&format!("{}/dp/B000", server.uri()))
            .await
            .unwrap();

        assert!(text.contains("battery dies fast"));
    }

    #[tokio::test]
    async fn test_http_error_is_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let extractor = HttpExtractor::new(Duration::from_secs(5)).unwrap();

        assert!(extractor.fetch(&server.uri()).await.is_err());
        assert!(extractor.extract(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn test_blank_page_is_no_content() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body><script>x()</script></body></html>"),
            )
            .mount(&server)
            .await;

        let extractor = HttpExtractor::new(Duration::from_secs(5)).unwrap();
        assert!(extractor.extract(&server.uri()).await.is_none());
    }
}
