//! ggdrop.com adapter: items-page search over a result grid.

use super::casedrop::finish_name_match;
use super::models::{Candidate, PriceResult};
use super::selectors::ggdrop as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::error::ResolveError;
use crate::identity::SkinIdentity;
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GgdropAdapter {
    base_url: String,
}

impl GgdropAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://ggdrop.com")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn search_endpoint(&self) -> String {
        format!("{}/items?name=", self.base_url)
    }

    fn resolve_from_html(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        let document = Html::parse_document(html);

        let mut candidates = Vec::new();
        for item in document.select(&sel::ITEM) {
            let Some(price) = item
                .select(&sel::PRICE)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
            else {
                continue;
            };
            // Grid cards sometimes render without a readable name; those can
            // only be told apart when there is exactly one of them.
            let name = item
                .select(&sel::NAME)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            candidates.push(Candidate::single(name, price));
        }

        // Nameless single hits are trusted: the search already pinned the
        // item down. Anything else goes through the name matcher.
        if candidates.len() == 1 && candidates[0].display.is_empty() {
            let raw = candidates[0].fragments[0].raw.clone();
            return match super::price::extract_price(&raw) {
                Ok(price) => PriceResult::matched(identity, SourceId::Ggdrop, price),
                Err(e) => failed(identity, SourceId::Ggdrop, e),
            };
        }
        if candidates.len() > 1 && candidates.iter().all(|c| c.display.is_empty()) {
            return PriceResult::ambiguous(identity, SourceId::Ggdrop);
        }

        finish_name_match(identity, SourceId::Ggdrop, &candidates)
    }
}

impl Default for GgdropAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for GgdropAdapter {
    fn id(&self) -> SourceId {
        SourceId::Ggdrop
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let query = match lookup_key(identity, SourceId::Ggdrop) {
            Ok(LookupKey::Query(query)) => query,
            Ok(LookupKey::Path(_)) => unreachable!("ggdrop is a search source"),
            Err(e) => return failed(identity, SourceId::Ggdrop, e),
        };

        let mut state = match page.submit_query(&self.search_endpoint(), &query).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Ggdrop, e.into()),
        };

        if !page.wait_for(&mut state, &sel::PRICE, WAIT_TIMEOUT).await {
            return failed(identity, SourceId::Ggdrop, ResolveError::RemoteTimeout(WAIT_TIMEOUT));
        }

        self.resolve_from_html(identity, &state.html)
    }
}
