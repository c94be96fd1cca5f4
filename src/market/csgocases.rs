//! csgocases.com adapter: search with image alt-text names and a narrowing
//! retry when the result set is empty or too broad.

use super::casedrop::finish_name_match;
use super::models::{Candidate, PriceResult};
use super::selectors::csgocases as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::identity::{SkinIdentity, WearTier};
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result sets larger than this mean the query matched a whole family and
/// needs narrowing before name matching is trustworthy.
const MAX_DIRECT_RESULTS: usize = 2;

pub struct CsgocasesAdapter {
    base_url: String,
}

impl CsgocasesAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://csgocases.com")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn search_endpoint(&self) -> String {
        format!("{}/skins?search=", self.base_url)
    }

    fn extract_candidates(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for item in document.select(&sel::ITEM) {
            let Some(alt) = item
                .select(&sel::IMAGE)
                .next()
                .and_then(|img| img.value().attr("alt"))
                .map(str::trim)
                .filter(|alt| !alt.is_empty())
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
            candidates.push(Candidate::single(alt, price));
        }

        candidates
    }
}

impl Default for CsgocasesAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for CsgocasesAdapter {
    fn id(&self) -> SourceId {
        SourceId::Csgocases
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let query = match lookup_key(identity, SourceId::Csgocases) {
            Ok(LookupKey::Query(query)) => query,
            Ok(LookupKey::Path(_)) => unreachable!("csgocases is a search source"),
            Err(e) => return failed(identity, SourceId::Csgocases, e),
        };

        let mut state = match page.submit_query(&self.search_endpoint(), &query).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Csgocases, e.into()),
        };

        let mut candidates = if page.wait_for(&mut state, &sel::ITEM, WAIT_TIMEOUT).await {
            self.extract_candidates(&state.html)
        } else {
            Vec::new()
        };

        // Zero or too many hits: retry once with the wear suffix dropped.
        if candidates.is_empty() || candidates.len() > MAX_DIRECT_RESULTS {
            if let Some(narrowed) = narrow_query(identity, &query) {
                debug!(
                    "{} results for {:?}, retrying with {:?}",
                    candidates.len(),
                    query,
                    narrowed
                );
                match page.submit_query(&self.search_endpoint(), &narrowed).await {
                    Ok(fresh) => {
                        state = fresh;
                        if page.wait_for(&mut state, &sel::ITEM, WAIT_TIMEOUT).await {
                            candidates = self.extract_candidates(&state.html);
                        }
                    }
                    Err(e) => return failed(identity, SourceId::Csgocases, e.into()),
                }
            }
        }

        finish_name_match(identity, SourceId::Csgocases, &candidates)
    }
}

/// The narrower follow-up query: the display name without its wear suffix.
fn narrow_query(identity: &SkinIdentity, query: &str) -> Option<String> {
    if identity.wear_tier == WearTier::Unspecified {
        return None;
    }
    let suffix = format!(" ({})", identity.wear_tier.full_name());
    query.strip_suffix(&suffix).map(str::to_string)
}
