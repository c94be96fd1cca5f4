//! HTTP-backed page session using wreq for TLS fingerprint emulation.

use super::{PageError, PageState, RemotePage};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use scraper::Selector;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// One browser-like HTTP session, held for the duration of a run.
pub struct HttpPage {
    client: Client,
    delay_ms: u64,
    delay_jitter_ms: u64,
    page_timeout: Duration,
    poll_interval: Duration,
}

impl HttpPage {
    /// Creates a session from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_millis(config.page_timeout_ms))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            page_timeout: Duration::from_millis(config.page_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// Performs a GET with browser emulation headers.
    async fn get(&self, url: &str) -> Result<PageState, PageError> {
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PageError::Timeout(self.page_timeout)
                } else {
                    PageError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider increasing the delay or using a proxy.");
            return Err(PageError::Status(503));
        }
        if !status.is_success() {
            return Err(PageError::Status(status.as_u16()));
        }

        let final_url = response.uri().to_string();
        let html =
            response.text().await.map_err(|e| PageError::Transport(e.to_string()))?;

        Ok(PageState::new(final_url, html))
    }

    /// Adds a base delay plus random jitter between requests.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl RemotePage for HttpPage {
    async fn navigate(&self, url: &str) -> Result<PageState, PageError> {
        self.get(url).await
    }

    async fn submit_query(&self, endpoint: &str, query: &str) -> Result<PageState, PageError> {
        let url = format!("{}{}", endpoint, urlencoding::encode(query));
        self.get(&url).await
    }

    async fn wait_for(&self, state: &mut PageState, css: &Selector, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if state.has_match(css) {
                return true;
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                debug!("condition {:?} not met within {:?}", css, timeout);
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;

            // Refresh the snapshot; a transient fetch error just means we
            // keep waiting on the previous one.
            match self.get(&state.url).await {
                Ok(fresh) => *state = fresh,
                Err(e) => debug!("refresh failed while waiting: {}", e),
            }
        }
    }
}
