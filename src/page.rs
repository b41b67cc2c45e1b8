// src/page.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

/// The document as it is rendered at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// The browsing context the companion lives in.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Current address, read synchronously like `location.href`.
    fn current_url(&self) -> String;

    /// Current document contents.
    async fn snapshot(&self) -> Result<PageSnapshot>;
}

/// In-memory page whose address and document can be swapped in place,
/// the way a single-page app navigates.
#[derive(Debug)]
pub struct StaticPage {
    inner: Mutex<PageSnapshot>,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(PageSnapshot::new(url, html)),
        }
    }

    pub fn navigate(&self, url: impl Into<String>, html: impl Into<String>) {
        let mut page = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *page = PageSnapshot::new(url, html);
    }

    /// Address-bar change without a document swap (pushState).
    pub fn push_state(&self, url: impl Into<String>) {
        let mut page = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        page.url = url.into();
    }
}

#[async_trait]
impl PageContext for StaticPage {
    fn current_url(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .url
            .clone()
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Page whose document is fetched over HTTP at snapshot time.
pub struct FetchedPage {
    client: Client,
    url: Mutex<String>,
}

impl FetchedPage {
    pub fn new(start_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: Mutex::new(start_url.into()),
        })
    }

    pub fn navigate(&self, url: impl Into<String>) {
        *self.url.lock().unwrap_or_else(PoisonError::into_inner) = url.into();
    }
}

#[async_trait]
impl PageContext for FetchedPage {
    fn current_url(&self) -> String {
        self.url.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let url = self.current_url();
        info!("Fetching page: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch page")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(PageSnapshot { url, html })
    }
}
