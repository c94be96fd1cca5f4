//! key-drop.com adapter: direct product pages with per-tier price tables.

use super::matcher::{self, Selection};
use super::models::{Candidate, PriceFragment, PriceResult};
use super::price::extract_price;
use super::selectors::keydrop as sel;
use super::slug::{lookup_key, LookupKey};
use super::{failed, SourceAdapter, SourceId};
use crate::error::ResolveError;
use crate::identity::{ItemCategory, SkinIdentity};
use crate::page::RemotePage;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KeydropAdapter {
    base_url: String,
}

impl KeydropAdapter {
    pub fn new() -> Self {
        Self::with_base_url("https://key-drop.com")
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn resolve_from_html(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        if identity.category == ItemCategory::Sticker {
            return self.resolve_sticker(identity, html);
        }

        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for row in document.select(&sel::ROW) {
            let cells: Vec<String> =
                row.select(&sel::CELL).map(|c| c.text().collect::<String>().trim().to_string()).collect();
            if cells.len() < 2 {
                continue;
            }
            let mut fragments = vec![PriceFragment::normal(&cells[1])];
            if cells.len() >= 3 {
                fragments.push(PriceFragment::stattrak(&cells[2]));
            }
            candidates.push(Candidate::new(&cells[0], fragments));
        }

        finish_tier_match(identity, SourceId::Keydrop, &candidates)
    }

    /// Sticker pages carry one price table; the heading must spell the exact
    /// item, since near-miss slugs land on a different sticker.
    fn resolve_sticker(&self, identity: &SkinIdentity, html: &str) -> PriceResult {
        let document = Html::parse_document(html);

        let title = document
            .select(&sel::STICKER_TITLE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_uppercase());
        let wanted = identity.display().trim().to_uppercase();
        if title.as_deref() != Some(wanted.as_str()) {
            debug!("sticker heading {:?} does not match {:?}", title, identity.display());
            return PriceResult::not_found(identity, SourceId::Keydrop);
        }

        let Some(table) = document.select(&sel::STICKER_TABLE).next() else {
            return PriceResult::not_found(identity, SourceId::Keydrop);
        };

        for row in table.select(&sel::ROW) {
            let cells: Vec<String> =
                row.select(&sel::CELL).map(|c| c.text().collect::<String>().trim().to_string()).collect();
            if cells.len() >= 2 && cells[1].contains('$') {
                return match extract_price(&cells[1]) {
                    Ok(price) => PriceResult::matched(identity, SourceId::Keydrop, price),
                    Err(e) => failed(identity, SourceId::Keydrop, e),
                };
            }
        }

        PriceResult::not_found(identity, SourceId::Keydrop)
    }
}

impl Default for KeydropAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for KeydropAdapter {
    fn id(&self) -> SourceId {
        SourceId::Keydrop
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult {
        let slug = match lookup_key(identity, SourceId::Keydrop) {
            Ok(LookupKey::Path(slug)) => slug,
            Ok(LookupKey::Query(_)) => unreachable!("keydrop is a direct-page source"),
            Err(e) => return failed(identity, SourceId::Keydrop, e),
        };

        let url = format!("{}/ru/skins/product/{}", self.base_url, slug);
        let mut state = match page.navigate(&url).await {
            Ok(state) => state,
            Err(e) => return failed(identity, SourceId::Keydrop, e.into()),
        };

        if !page.wait_for(&mut state, &sel::ROW, WAIT_TIMEOUT).await {
            return failed(identity, SourceId::Keydrop, ResolveError::RemoteTimeout(WAIT_TIMEOUT));
        }

        self.resolve_from_html(identity, &state.html)
    }
}

/// Shared tail for tier-shaped sources: run the tier matcher and parse the
/// chosen fragment.
pub(super) fn finish_tier_match(
    identity: &SkinIdentity,
    source: SourceId,
    candidates: &[Candidate],
) -> PriceResult {
    match matcher::match_by_tier(identity, candidates) {
        Selection::Matched { fragment, .. } => match extract_price(&fragment.raw) {
            Ok(price) => PriceResult::matched(identity, source, price),
            Err(e) => failed(identity, source, e),
        },
        Selection::NotFound => PriceResult::not_found(identity, source),
        Selection::Ambiguous => PriceResult::ambiguous(identity, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::normalize;
    use crate::market::Outcome;

    const WEAPON_PAGE: &str = r#"
        <html><body><table>
            <tr><td>Factory New</td><td>$30.00</td><td>$80.00</td></tr>
            <tr><td>Field-Tested</td><td>$12.34</td><td>$35.00</td></tr>
        </table></body></html>
    "#;

    #[test]
    fn test_weapon_row_by_tier() {
        let adapter = KeydropAdapter::new();
        let id = normalize("AK-47 | Redline (Field-Tested)");
        let result = adapter.resolve_from_html(&id, WEAPON_PAGE);
        assert_eq!(result.outcome, Outcome::Matched(12.34));
    }

    #[test]
    fn test_weapon_stattrak_column() {
        let adapter = KeydropAdapter::new();
        let id = normalize("StatTrak™ AK-47 | Redline (Field-Tested)");
        let result = adapter.resolve_from_html(&id, WEAPON_PAGE);
        assert_eq!(result.outcome, Outcome::Matched(35.0));
    }

    #[test]
    fn test_knife_page_has_two_columns() {
        let html = r#"
            <table>
                <tr><td>Factory New</td><td>$700.00</td></tr>
            </table>
        "#;
        let adapter = KeydropAdapter::new();
        let id = normalize("★ StatTrak™ M9 Bayonet | Doppler (Factory New)");
        let result = adapter.resolve_from_html(&id, html);
        assert_eq!(result.outcome, Outcome::Matched(700.0));
    }

    #[test]
    fn test_missing_tier_row() {
        let adapter = KeydropAdapter::new();
        let id = normalize("AK-47 | Redline (Well-Worn)");
        let result = adapter.resolve_from_html(&id, WEAPON_PAGE);
        assert_eq!(result.outcome, Outcome::NotFound);
    }

    const STICKER_PAGE: &str = r#"
        <html><body>
            <h2 class="text-xl">Sticker | Heroic | 2020 RMR</h2>
            <table class="grid">
                <tr><td>Suggested</td><td>$1.50</td></tr>
            </table>
        </body></html>
    "#;

    #[test]
    fn test_sticker_price() {
        let adapter = KeydropAdapter::new();
        let id = normalize("Sticker | Heroic | 2020 RMR");
        let result = adapter.resolve_from_html(&id, STICKER_PAGE);
        assert_eq!(result.outcome, Outcome::Matched(1.5));
    }

    #[test]
    fn test_sticker_title_mismatch() {
        let adapter = KeydropAdapter::new();
        let id = normalize("Sticker | Liquid | 2020 RMR");
        let result = adapter.resolve_from_html(&id, STICKER_PAGE);
        assert_eq!(result.outcome, Outcome::NotFound);
    }

    #[test]
    fn test_garbage_price_cell_is_parse_failure() {
        let html = r#"<table><tr><td>Field-Tested</td><td>soon</td></tr></table>"#;
        let adapter = KeydropAdapter::new();
        let id = normalize("AK-47 | Redline (Field-Tested)");
        let result = adapter.resolve_from_html(&id, html);
        assert!(matches!(result.outcome, Outcome::Error(_)));
    }
}
