//! Remote catalog sources and the price-resolution contract.

pub mod casedrop;
pub mod csgocases;
pub mod farmskins;
pub mod ggdrop;
pub mod keydrop;
pub mod matcher;
pub mod models;
pub mod price;
pub mod selectors;
pub mod skinclub;
pub mod slug;

pub use models::{Candidate, Outcome, PriceFragment, PriceResult, Variant};

use crate::error::ResolveError;
use crate::identity::SkinIdentity;
use crate::page::RemotePage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one remote catalog source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Keydrop,
    Farmskins,
    Skinclub,
    Ggdrop,
    Casedrop,
    Csgocases,
}

impl SourceId {
    /// All supported sources, in registry order.
    pub fn all() -> &'static [SourceId] {
        &[
            SourceId::Keydrop,
            SourceId::Farmskins,
            SourceId::Skinclub,
            SourceId::Ggdrop,
            SourceId::Casedrop,
            SourceId::Csgocases,
        ]
    }

    /// Name of the workbook column this source's prices land in.
    pub fn price_column(&self) -> String {
        format!("{}_price", self)
    }

    /// Whether the source is looked up by direct page URL or by search query.
    pub fn lookup_style(&self) -> &'static str {
        match self {
            SourceId::Keydrop | SourceId::Farmskins | SourceId::Skinclub => "direct page",
            SourceId::Ggdrop | SourceId::Casedrop | SourceId::Csgocases => "search query",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::Keydrop => "keydrop",
            SourceId::Farmskins => "farmskins",
            SourceId::Skinclub => "skinclub",
            SourceId::Ggdrop => "ggdrop",
            SourceId::Casedrop => "casedrop",
            SourceId::Csgocases => "csgocases",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keydrop" | "key-drop" => Ok(SourceId::Keydrop),
            "farmskins" => Ok(SourceId::Farmskins),
            "skinclub" | "skin.club" => Ok(SourceId::Skinclub),
            "ggdrop" => Ok(SourceId::Ggdrop),
            "casedrop" => Ok(SourceId::Casedrop),
            "csgocases" => Ok(SourceId::Csgocases),
            _ => Err(format!(
                "Unknown source: {}. Use: keydrop, farmskins, skinclub, ggdrop, casedrop, csgocases",
                s
            )),
        }
    }
}

/// One remote catalog source, reduced to a single capability: resolving the
/// price of an identity through a shared page session.
///
/// Adapters hold no state between calls beyond their base URL.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    /// Base URL queried by this adapter.
    fn base_url(&self) -> &str;

    async fn resolve_price(&self, page: &dyn RemotePage, identity: &SkinIdentity) -> PriceResult;
}

/// Builds the adapter for a source id.
pub fn make_adapter(source: SourceId) -> Box<dyn SourceAdapter> {
    match source {
        SourceId::Keydrop => Box::new(keydrop::KeydropAdapter::new()),
        SourceId::Farmskins => Box::new(farmskins::FarmskinsAdapter::new()),
        SourceId::Skinclub => Box::new(skinclub::SkinclubAdapter::new()),
        SourceId::Ggdrop => Box::new(ggdrop::GgdropAdapter::new()),
        SourceId::Casedrop => Box::new(casedrop::CasedropAdapter::new()),
        SourceId::Csgocases => Box::new(csgocases::CsgocasesAdapter::new()),
    }
}

/// Shorthand for adapters bailing out of a resolution.
pub(crate) fn failed(identity: &SkinIdentity, source: SourceId, err: ResolveError) -> PriceResult {
    PriceResult { identity: identity.clone(), source, outcome: Outcome::Error(err) }
}
