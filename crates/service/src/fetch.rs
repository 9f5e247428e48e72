//! Reference content fetching.

use crate::error::FetchError;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use slidegen_core::TextExtractor;
use std::time::Duration;

/// Browser-like agent string; some sites refuse unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Retrieves the readable text of a reference page.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its readable text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Outcome of fetching one URL. Exactly one of `content` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedPage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.content.is_some()
    }
}

/// Fetch every URL concurrently.
///
/// A failing URL is recorded on its own page and never aborts the others.
/// Results keep the order of `urls`.
pub async fn fetch_all(fetcher: &dyn ContentFetcher, urls: &[String]) -> Vec<FetchedPage> {
    let futures = urls.iter().map(|url| async move {
        match fetcher.fetch(url).await {
            Ok(content) => {
                log::debug!("Fetched {} ({} chars)", url, content.chars().count());
                FetchedPage {
                    url: url.clone(),
                    content: Some(content),
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", url, e);
                FetchedPage {
                    url: url.clone(),
                    content: None,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    join_all(futures).await
}

/// Join the successfully fetched contents with blank lines.
pub fn reference_text(pages: &[FetchedPage]) -> String {
    pages
        .iter()
        .filter_map(|page| page.content.as_deref())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fetches pages over HTTP and reduces them to plain text.
pub struct HttpContentFetcher {
    client: reqwest::Client,
    extractor: TextExtractor,
}

impl HttpContentFetcher {
    /// Create a fetcher with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            extractor: TextExtractor::new(),
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !is_http_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(self.extractor.extract(&html))
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    (lower.starts_with("http://") && lower.len() > "http://".len())
        || (lower.starts_with("https://") && lower.len() > "https://".len())
}
