//! Derives per-source lookup keys from canonical identities.

use super::SourceId;
use crate::error::ResolveError;
use crate::identity::{ItemCategory, SkinIdentity, WearTier, NAME_SEPARATOR};

/// Source-specific lookup key: a URL path fragment for direct-page sources,
/// a search string for form-driven ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Path(String),
    Query(String),
}

/// Sticker sub-variant qualifiers that keydrop folds into one product page.
const KEYDROP_DROPPED_QUALIFIERS: [&str; 4] = ["Gold", "Holo", "Foil", "Glitter"];

/// Builds the lookup key for an identity on a source.
///
/// Pure function of its inputs; identities without the family/pattern
/// separator are unsupported everywhere except as stickers.
pub fn lookup_key(identity: &SkinIdentity, source: SourceId) -> Result<LookupKey, ResolveError> {
    if identity.category == ItemCategory::Other {
        return Err(ResolveError::UnsupportedIdentity);
    }

    match source {
        SourceId::Keydrop => keydrop_path(identity).map(LookupKey::Path),
        SourceId::Farmskins => farmskins_path(identity).map(LookupKey::Path),
        SourceId::Skinclub => skinclub_path(identity).map(LookupKey::Path),
        SourceId::Ggdrop | SourceId::Casedrop | SourceId::Csgocases => {
            Ok(LookupKey::Query(identity.display().to_string()))
        }
    }
}

fn keydrop_path(identity: &SkinIdentity) -> Result<String, ResolveError> {
    let name = identity.undecorated();

    if identity.category == ItemCategory::Sticker {
        let mut name = name;
        for qualifier in KEYDROP_DROPPED_QUALIFIERS {
            name = name.replace(&format!(" ({})", qualifier), "");
        }
        return Ok(sticker_slug(&name, false));
    }

    let (weapon, pattern) = split_weapon(&name)?;
    let slug = format!("{}-{}", hyphenate(weapon), hyphenate(pattern));
    if identity.is_stattrak {
        Ok(format!("StatTrak-{}", slug))
    } else {
        Ok(slug)
    }
}

fn farmskins_path(identity: &SkinIdentity) -> Result<String, ResolveError> {
    let name = identity.undecorated();

    if identity.category == ItemCategory::Sticker {
        return Ok(sticker_slug(&name, true));
    }

    let (weapon, pattern) = split_weapon(&name)?;
    Ok(format!("{}-{}", hyphenate(weapon), hyphenate(pattern)).to_lowercase())
}

fn skinclub_path(identity: &SkinIdentity) -> Result<String, ResolveError> {
    let name = identity.undecorated();

    if identity.category == ItemCategory::Sticker {
        return Ok(sticker_slug(&name, true));
    }

    let (weapon, pattern) = split_weapon(&name)?;
    let wear = match identity.wear_tier {
        WearTier::Unspecified => WearTier::FactoryNew,
        tier => tier,
    };
    let slug =
        format!("{}-{}-{}", hyphenate(weapon), hyphenate(pattern), wear.slug()).to_lowercase();
    if identity.is_stattrak {
        Ok(format!("stattrak-{}", slug))
    } else {
        Ok(slug)
    }
}

/// Splits "Weapon | Pattern (Wear)" into ("Weapon", "Pattern").
fn split_weapon(name: &str) -> Result<(&str, &str), ResolveError> {
    let (weapon, rest) =
        name.split_once(NAME_SEPARATOR).ok_or(ResolveError::UnsupportedIdentity)?;
    let pattern = rest.split(" (").next().unwrap_or(rest);
    Ok((weapon.trim(), pattern.trim()))
}

fn hyphenate(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Expands "Sticker | Heroic (Holo) | 2020 RMR" into
/// "Sticker-Heroic-Holo-2020-RMR": every segment after the leading one emits
/// its non-parenthesized remainder followed by each parenthesized qualifier.
fn sticker_slug(name: &str, lowercase: bool) -> String {
    let mut parts = name.split(NAME_SEPARATOR);
    let base = hyphenate(parts.next().unwrap_or(name).trim());

    let mut tokens = vec![base];
    for part in parts {
        let (remainder, qualifiers) = split_qualifiers(part);
        if !remainder.is_empty() {
            tokens.push(hyphenate(&remainder));
        }
        for qualifier in qualifiers {
            tokens.push(hyphenate(&qualifier));
        }
    }

    let slug = tokens.join("-");
    if lowercase {
        slug.to_lowercase()
    } else {
        slug
    }
}

/// Splits a segment into its text outside parentheses and the contents of
/// each parenthesized group, in order.
fn split_qualifiers(segment: &str) -> (String, Vec<String>) {
    let mut remainder = String::new();
    let mut qualifiers = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in segment.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    qualifiers.push(current.trim().to_string());
                    current.clear();
                }
            }
            _ if depth > 0 => current.push(ch),
            _ => remainder.push(ch),
        }
    }

    (remainder.trim().to_string(), qualifiers)
}
