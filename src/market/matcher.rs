//! Selects the best candidate entry for a requested identity.

use super::models::{Candidate, PriceFragment, Variant};
use crate::identity::models::{has_souvenir_marker, strip_decorations};
use crate::identity::{SkinIdentity, WearTier};
use tracing::debug;

/// Outcome of matching a request against a candidate list.
#[derive(Debug, PartialEq)]
pub enum Selection<'a> {
    Matched { candidate: &'a Candidate, fragment: &'a PriceFragment },
    NotFound,
    Ambiguous,
}

/// Matches name-shaped candidates (search sources: display is a full item
/// name).
///
/// Priority order: souvenir filter, StatTrak marker parity, de-decorated
/// containment; the first qualifying candidate in list order wins. Two
/// qualifying entries with indistinguishable display text report
/// [`Selection::Ambiguous`] instead of guessing.
pub fn match_by_name<'a>(identity: &SkinIdentity, candidates: &'a [Candidate]) -> Selection<'a> {
    let wanted = identity.undecorated();

    let qualifying: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            if !identity.is_souvenir && has_souvenir_marker(&c.display) {
                return false;
            }
            if c.display.contains("StatTrak") != identity.is_stattrak {
                return false;
            }
            strip_decorations(&c.display).contains(&wanted)
        })
        .collect();

    match qualifying.as_slice() {
        [] => Selection::NotFound,
        [first, second, ..] if first.display == second.display => {
            debug!("{} qualifying entries share display text, refusing to guess", qualifying.len());
            Selection::Ambiguous
        }
        [first, ..] => match first.fragments.first() {
            Some(fragment) => Selection::Matched { candidate: first, fragment },
            None => Selection::NotFound,
        },
    }
}

/// Matches tier-shaped candidates (direct-page sources: display is a
/// wear-tier label, fragments are the row's price columns).
///
/// The label must case-insensitively contain the requested tier; knife and
/// glove pages expose a single price column, so the first fragment always
/// wins there, while a StatTrak request otherwise takes the StatTrak-tagged
/// fragment when the row carries one.
pub fn match_by_tier<'a>(identity: &SkinIdentity, candidates: &'a [Candidate]) -> Selection<'a> {
    let tier = match identity.wear_tier {
        // Wearless names resolve like the sources' own default listing.
        WearTier::Unspecified => WearTier::FactoryNew,
        tier => tier,
    };
    let wanted = tier.full_name().to_lowercase();

    for candidate in candidates {
        if !candidate.display.to_lowercase().contains(&wanted) {
            continue;
        }
        let Some(fragment) = choose_fragment(identity, &candidate.fragments) else {
            continue;
        };
        return Selection::Matched { candidate, fragment };
    }

    Selection::NotFound
}

fn choose_fragment<'a>(
    identity: &SkinIdentity,
    fragments: &'a [PriceFragment],
) -> Option<&'a PriceFragment> {
    if identity.is_knife_or_glove {
        return fragments.first();
    }
    if identity.is_stattrak {
        return fragments.iter().find(|f| f.variant == Variant::StatTrak).or(fragments.first());
    }
    fragments.iter().find(|f| f.variant == Variant::Normal).or(fragments.first())
}
