//! wiki.skin.club adapter: direct wiki pages, wear encoded in the slug.

use super::keydrop::finish_tier_match;
use super::models::{Candidate, PriceFragment, PriceResult};
use super::price::extract_price;
use super::selectors::skinclub as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::error::ResolveError;
use crate::identity::{ItemCategory, SkinIdentity};
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SkinclubAdapter {
    base_url: String,
}

impl SkinclubAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://wiki.skin.club")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn resolve_from_html(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        let document = Html::parse_document(html);

        if identity.category == ItemCategory::Sticker {
            let Some(price) = document
                .select(&sel::STICKER_PRICE)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
            else {
                return PriceResult::not_found(identity, SourceId::Skinclub);
            };
            return match extract_price(&price) {
                Ok(price) => PriceResult::matched(identity, SourceId::Skinclub, price),
                Err(e) => failed(identity, SourceId::Skinclub, e),
            };
        }

        let Some(container) = document.select(&sel::CONTAINER).next() else {
            return PriceResult::not_found(identity, SourceId::Skinclub);
        };

        let mut candidates = Vec::new();
        for row in container.select(&sel::ROW) {
            let Some(label) = row
                .select(&sel::TIER_LABEL)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
            else {
                continue;
            };

            let mut fragments = Vec::new();
            if let Some(price) = row.select(&sel::PRICE).next() {
                fragments
                    .push(PriceFragment::normal(price.text().collect::<String>().trim()));
            }
            if let Some(price) = row.select(&sel::STATTRAK_PRICE).next() {
                fragments
                    .push(PriceFragment::stattrak(price.text().collect::<String>().trim()));
            }
            if fragments.is_empty() {
                continue;
            }
            candidates.push(Candidate::new(label, fragments));
        }

        finish_tier_match(identity, SourceId::Skinclub, &candidates)
    }
}

impl Default for SkinclubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for SkinclubAdapter {
    fn id(&self) -> SourceId {
        SourceId::Skinclub
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let slug = match lookup_key(identity, SourceId::Skinclub) {
            Ok(LookupKey::Path(slug)) => slug,
            Ok(LookupKey::Query(_)) => unreachable!("skinclub is a direct-page source"),
            Err(e) => return failed(identity, SourceId::Skinclub, e),
        };

        let url = format!("{}/en/items/{}", self.base_url, slug);
        let mut state = match page.navigate(&url).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Skinclub, e.into()),
        };

        let ready = if identity.category == ItemCategory::Sticker {
            &sel::STICKER_PRICE
        } else {
            &sel::CONTAINER
        };
        if !page.wait_for(&mut state, ready, WAIT_TIMEOUT).await {
            return failed(identity, SourceId::Skinclub, ResolveError::RemoteTimeout(WAIT_TIMEOUT));
        }

        self.resolve_from_html(identity, &state.html)
    }
}
