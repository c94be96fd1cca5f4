//! Normalizes free-form item names into canonical identities.

use super::models::{has_souvenir_marker, SkinIdentity, WearTier};
use super::{STAR_MARKER, STATTRAK_MARKER};
use tracing::trace;

/// Keywords that mark an item as a knife or glove family.
const STAR_KEYWORDS: [&str; 6] =
    ["Knife", "Gloves", "Karambit", "Bayonet", "Shadow Daggers", "Hand Wraps"];

/// Canonicalizes a raw market name into a [`SkinIdentity`].
///
/// Normalizing an already-canonical name is a no-op: abbreviations are only
/// rewritten when present, full-form wear suffixes are recognized but left in
/// place, and markers are never doubled.
pub fn normalize(raw: &str) -> SkinIdentity {
    let mut name = collapse_whitespace(raw);

    // Wear abbreviation, bare ("... FT") or parenthesized ("... (FT)").
    let mut wear = WearTier::Unspecified;
    let mut rewrite_wear = false;
    for tier in WearTier::ALL {
        let abbrev = tier.abbrev();
        let parenthesized = format!("({})", abbrev);
        if let Some(stripped) =
            remove_token(&name, &parenthesized).or_else(|| remove_token(&name, abbrev))
        {
            wear = tier;
            rewrite_wear = true;
            name = stripped;
            break;
        }
    }
    if wear == WearTier::Unspecified {
        wear = trailing_wear(&name);
    }

    // Standalone "ST" token becomes the canonical StatTrak marker.
    let mut stattrak = name.contains(STATTRAK_MARKER);
    if let Some(stripped) = remove_token(&name, "ST") {
        name = stripped;
        if !stattrak {
            name = format!("{} {}", STATTRAK_MARKER, name);
            stattrak = true;
        }
    }

    // Knife/glove families carry the star marker.
    let mut knife = name.contains(STAR_MARKER);
    if !knife && contains_star_keyword(&name) {
        name = format!("{} {}", STAR_MARKER, name);
        knife = true;
    }

    if rewrite_wear {
        name = format!("{} ({})", name, wear.full_name());
    }

    let souvenir = has_souvenir_marker(&name);
    trace!("normalized {:?} -> {:?}", raw, name);
    SkinIdentity::new(name, wear, stattrak, souvenir, knife)
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a standalone word token, returning the remainder; `None` when the
/// token does not occur as its own word.
fn remove_token(name: &str, token: &str) -> Option<String> {
    let words: Vec<&str> = name.split(' ').collect();
    if !words.iter().any(|w| *w == token) {
        return None;
    }
    Some(words.into_iter().filter(|w| *w != token).collect::<Vec<_>>().join(" "))
}

/// Recognizes an already-canonical trailing "(Factory New)" style suffix.
fn trailing_wear(name: &str) -> WearTier {
    let Some(open) = name.rfind('(') else {
        return WearTier::Unspecified;
    };
    let Some(inner) = name[open + 1..].strip_suffix(')') else {
        return WearTier::Unspecified;
    };
    WearTier::from_full_name(inner).unwrap_or(WearTier::Unspecified)
}

fn contains_star_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    STAR_KEYWORDS.iter().any(|kw| lower.contains(&kw.to_lowercase()))
}
