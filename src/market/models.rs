//! Data models for catalog candidates and resolution results.

use super::SourceId;
use crate::error::ResolveError;
use crate::identity::SkinIdentity;
use serde::Serialize;

/// Which variant a price fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variant {
    Normal,
    StatTrak,
}

/// One raw price cell extracted from a candidate entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceFragment {
    pub variant: Variant,
    /// Price text exactly as it appeared in the page.
    pub raw: String,
}

impl PriceFragment {
    pub fn normal(raw: impl Into<String>) -> Self {
        Self { variant: Variant::Normal, raw: raw.into() }
    }

    pub fn stattrak(raw: impl Into<String>) -> Self {
        Self { variant: Variant::StatTrak, raw: raw.into() }
    }
}

/// One entry surfaced by a source for a lookup.
///
/// For search-style sources `display` is a full item name; for direct-page
/// sources it is the wear-tier label of a table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub display: String,
    pub fragments: Vec<PriceFragment>,
}

impl Candidate {
    pub fn new(display: impl Into<String>, fragments: Vec<PriceFragment>) -> Self {
        Self { display: display.into(), fragments }
    }

    /// Single-fragment convenience for sources with one price per entry.
    pub fn single(display: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(display, vec![PriceFragment::normal(raw)])
    }
}

/// Terminal state of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    /// A non-negative price, in the source's display currency.
    Matched(f64),
    NotFound,
    Ambiguous,
    #[serde(serialize_with = "serialize_error")]
    Error(ResolveError),
}

fn serialize_error<S: serde::Serializer>(err: &ResolveError, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&err.to_string())
}

/// Result of resolving one identity against one source. Created once per
/// (row, source) attempt and folded straight into the output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceResult {
    pub identity: SkinIdentity,
    pub source: SourceId,
    pub outcome: Outcome,
}

impl PriceResult {
    pub fn matched(identity: &SkinIdentity, source: SourceId, price: f64) -> Self {
        Self { identity: identity.clone(), source, outcome: Outcome::Matched(price) }
    }

    pub fn not_found(identity: &SkinIdentity, source: SourceId) -> Self {
        Self { identity: identity.clone(), source, outcome: Outcome::NotFound }
    }

    pub fn ambiguous(identity: &SkinIdentity, source: SourceId) -> Self {
        Self { identity: identity.clone(), source, outcome: Outcome::Ambiguous }
    }

    /// The resolved price, when there is one.
    pub fn price(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Matched(p) => Some(p),
            _ => None,
        }
    }
}
