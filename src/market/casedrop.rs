//! casedrop.eu adapter: shop search with a StatTrak badge on listings.

use super::matcher::{self, Selection};
use super::models::{Candidate, PriceResult};
use super::price::extract_price;
use super::selectors::casedrop as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::error::ResolveError;
use crate::identity::{SkinIdentity, STATTRAK_MARKER};
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const WAIT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct CasedropAdapter {
    base_url: String,
}

impl CasedropAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://casedrop.eu")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn search_endpoint(&self) -> String {
        format!("{}/shop?search=", self.base_url)
    }

    fn resolve_from_html(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        let document = Html::parse_document(html);

        // The shop renders an explicit placeholder for empty result sets.
        let no_items = document
            .select(&sel::EMPTY)
            .next()
            .map(|e| e.text().collect::<String>().to_uppercase().contains("NO ITEMS"))
            .unwrap_or(false);
        if no_items {
            return PriceResult::not_found(identity, SourceId::Casedrop);
        }

        let mut candidates = Vec::new();
        for item in document.select(&sel::ITEM) {
            let Some(name) = item
                .select(&sel::NAME)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
            else {
                continue;
            };
            let Some(price) = item
                .select(&sel::PRICE)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
            else {
                continue;
            };

            // StatTrak is a separate badge, not part of the listed name.
            let display = if item.select(&sel::TRACK_BADGE).next().is_some() {
                format!("{} {}", STATTRAK_MARKER, name)
            } else {
                name
            };
            candidates.push(Candidate::single(display, price));
        }

        finish_name_match(identity, SourceId::Casedrop, &candidates)
    }
}

impl Default for CasedropAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for CasedropAdapter {
    fn id(&self) -> SourceId {
        SourceId::Casedrop
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let query = match lookup_key(identity, SourceId::Casedrop) {
            Ok(LookupKey::Query(query)) => query,
            Ok(LookupKey::Path(_)) => unreachable!("casedrop is a search source"),
            Err(e) => return failed(identity, SourceId::Casedrop, e),
        };

        let mut state = match page.submit_query(&self.search_endpoint(), &query).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Casedrop, e.into()),
        };

        if !page.wait_for(&mut state, &sel::LIST, WAIT_TIMEOUT).await {
            return failed(identity, SourceId::Casedrop, ResolveError::RemoteTimeout(WAIT_TIMEOUT));
        }

        self.resolve_from_html(identity, &state.html)
    }
}

/// Shared tail for name-shaped sources: run the name matcher and parse the
/// chosen fragment.
pub(super) fn finish_name_match(
    identity: &SkinIdentity,
    source: SourceId,
    candidates: &[Candidate],
) -> PriceResult {
    match matcher::match_by_name(identity, candidates) {
        Selection::Matched { fragment, .. } => match extract_price(&fragment.raw) {
            Ok(price) => PriceResult::matched(identity, source, price),
            Err(e) => failed(identity, source, e),
        },
        Selection::NotFound => PriceResult::not_found(identity, source),
        Selection::Ambiguous => PriceResult::ambiguous(identity, source),
    }
}
