//! farmskins.com adapter: direct item pages with exterior statistics rows.

use super::keydrop::finish_tier_match;
use super::models::{Candidate, PriceFragment, PriceResult};
use super::price::extract_price;
use super::selectors::farmskins as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::error::ResolveError;
use crate::identity::{ItemCategory, SkinIdentity};
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FarmskinsAdapter {
    base_url: String,
}

impl FarmskinsAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://farmskins.com")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn resolve_from_html(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        let document = Html::parse_document(html);

        if identity.category == ItemCategory::Sticker {
            // Sticker pages show a flat span list; the second span is the price.
            let spans: Vec<String> = document
                .select(&sel::STICKER_SPAN)
                .map(|s| s.text().collect::<String>().trim().to_string())
                .collect();
            if spans.len() < 2 {
                return PriceResult::not_found(identity, SourceId::Farmskins);
            }
            return match extract_price(&spans[1]) {
                Ok(price) => PriceResult::matched(identity, SourceId::Farmskins, price),
                Err(e) => failed(identity, SourceId::Farmskins, e),
            };
        }

        let mut candidates = Vec::new();
        for row in document.select(&sel::ROW) {
            let cols: Vec<String> = row
                .select(&sel::COL)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();
            if cols.len() < 3 {
                continue;
            }
            candidates.push(Candidate::new(
                &cols[0],
                vec![PriceFragment::normal(&cols[1]), PriceFragment::stattrak(&cols[2])],
            ));
        }

        finish_tier_match(identity, SourceId::Farmskins, &candidates)
    }
}

impl Default for FarmskinsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for FarmskinsAdapter {
    fn id(&self) -> SourceId {
        SourceId::Farmskins
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let slug = match lookup_key(identity, SourceId::Farmskins) {
            Ok(LookupKey::Path(slug)) => slug,
            Ok(LookupKey::Query(_)) => unreachable!("farmskins is a direct-page source"),
            Err(e) => return failed(identity, SourceId::Farmskins, e),
        };

        let url = format!("{}/items/{}", self.base_url, slug);
        let mut state = match page.navigate(&url).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Farmskins, e.into()),
        };

        if !page.wait_for(&mut state, &sel::READY, WAIT_TIMEOUT).await {
            return failed(
                identity,
                SourceId::Farmskins,
                ResolveError::RemoteTimeout(WAIT_TIMEOUT),
            );
        }

        self.resolve_from_html(identity, &state.html)
    }
}
