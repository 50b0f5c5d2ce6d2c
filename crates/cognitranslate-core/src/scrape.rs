//! Web page text extraction.
//!
//! Only paragraph text is kept: every `<p>` element in document order,
//! joined by single spaces. Navigation, headings and scripts are ignored.

use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::{Error, Result};

#[allow(clippy::expect_used)]
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector is valid"));

/// Text pulled from a web page.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: Url,
    pub title: Option<String>,
    pub text: String,
}

/// Fetches pages and extracts their paragraph text.
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    /// Create a scraper with the configured timeout and user agent.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created (TLS backend unavailable).
    #[allow(clippy::expect_used)]
    pub fn new(config: &ScraperConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch `url` and return its paragraph text.
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let url = parse_http_url(url)?;
        info!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::ScrapeRequest {
                url: url.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ScrapeStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| Error::ScrapeRequest {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        let document = Html::parse_document(&html);
        let text = paragraph_text(&document);
        let title = page_title(&document);
        debug!("Extracted {} characters from {}", text.chars().count(), url);

        Ok(ScrapedPage { url, title, text })
    }
}

/// Parse and check that `raw` is an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| Error::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Text of every `<p>` element in `html`, joined by single spaces.
pub fn extract_paragraphs(html: &str) -> String {
    paragraph_text(&Html::parse_document(html))
}

fn paragraph_text(document: &Html) -> String {
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
