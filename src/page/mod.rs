//! Remote page session abstraction.
//!
//! The batch core never drives a page directly; it talks to [`RemotePage`],
//! and adapters extract candidates from the returned [`PageState`]. One
//! session is constructed per run and shared across every resolution.

pub mod http;

pub use http::HttpPage;

use crate::error::ResolveError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Failures raised by a page session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<PageError> for ResolveError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::Timeout(d) => ResolveError::RemoteTimeout(d),
            other => ResolveError::Remote(other.to_string()),
        }
    }
}

/// Snapshot of a loaded page: final URL plus raw HTML.
#[derive(Debug, Clone)]
pub struct PageState {
    pub url: String,
    pub html: String,
}

impl PageState {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self { url: url.into(), html: html.into() }
    }

    /// True when the snapshot contains at least one node matching the
    /// selector.
    pub fn has_match(&self, selector: &Selector) -> bool {
        Html::parse_document(&self.html).select(selector).next().is_some()
    }
}

/// A remote page session.
///
/// `wait_for` is the bounded-wait primitive: it returns once the CSS
/// condition holds or the timeout elapses, refreshing the snapshot as
/// needed. Candidate extraction from a given snapshot must be deterministic.
#[async_trait]
pub trait RemotePage: Send + Sync {
    /// Loads a page by URL.
    async fn navigate(&self, url: &str) -> Result<PageState, PageError>;

    /// Submits a search query against a source's search endpoint.
    async fn submit_query(&self, endpoint: &str, query: &str) -> Result<PageState, PageError>;

    /// Waits until `css` matches in the page, re-polling until `timeout`.
    async fn wait_for(&self, state: &mut PageState, css: &Selector, timeout: Duration) -> bool;
}
