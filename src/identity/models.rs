//! Data models for item identities and wear tiers.

use super::{NAME_SEPARATOR, SOUVENIR_MARKER, STAR_MARKER, STATTRAK_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five standard condition grades, plus the absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WearTier {
    FactoryNew,
    MinimalWear,
    FieldTested,
    WellWorn,
    BattleScarred,
    #[default]
    Unspecified,
}

impl WearTier {
    /// All concrete tiers, in grade order.
    pub const ALL: [WearTier; 5] = [
        WearTier::FactoryNew,
        WearTier::MinimalWear,
        WearTier::FieldTested,
        WearTier::WellWorn,
        WearTier::BattleScarred,
    ];

    /// Two-letter market abbreviation.
    pub fn abbrev(&self) -> &'static str {
        match self {
            WearTier::FactoryNew => "FN",
            WearTier::MinimalWear => "MW",
            WearTier::FieldTested => "FT",
            WearTier::WellWorn => "WW",
            WearTier::BattleScarred => "BS",
            WearTier::Unspecified => "",
        }
    }

    /// Spelled-out name as it appears in market hash names.
    pub fn full_name(&self) -> &'static str {
        match self {
            WearTier::FactoryNew => "Factory New",
            WearTier::MinimalWear => "Minimal Wear",
            WearTier::FieldTested => "Field-Tested",
            WearTier::WellWorn => "Well-Worn",
            WearTier::BattleScarred => "Battle-Scarred",
            WearTier::Unspecified => "",
        }
    }

    /// Hyphenated lowercase form used in URL slugs.
    pub fn slug(&self) -> &'static str {
        match self {
            WearTier::FactoryNew => "factory-new",
            WearTier::MinimalWear => "minimal-wear",
            WearTier::FieldTested => "field-tested",
            WearTier::WellWorn => "well-worn",
            WearTier::BattleScarred => "battle-scarred",
            WearTier::Unspecified => "",
        }
    }

    /// Looks up a tier by its spelled-out name, case-insensitively.
    pub fn from_full_name(text: &str) -> Option<WearTier> {
        let text = text.trim();
        Self::ALL.into_iter().find(|t| t.full_name().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for WearTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Coarse item family, driving which lookup strategies apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Weapon,
    Knife,
    Sticker,
    Other,
}

/// Canonical, structured form of a market item name.
///
/// Built only by [`normalize`](super::normalize); a pure projection of the
/// raw string, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinIdentity {
    /// Weapon or sticker family segment ("AK-47", "Sticker").
    pub base_name: String,
    /// Pattern or sticker subject segment; empty when the name has no separator.
    pub variant_name: String,
    pub wear_tier: WearTier,
    pub is_stattrak: bool,
    pub is_souvenir: bool,
    pub is_knife_or_glove: bool,
    pub category: ItemCategory,
    display: String,
}

impl SkinIdentity {
    pub(super) fn new(
        display: String,
        wear_tier: WearTier,
        is_stattrak: bool,
        is_souvenir: bool,
        is_knife_or_glove: bool,
    ) -> Self {
        let undecorated = strip_decorations(&display);

        let (base_name, variant_name) = match undecorated.split_once(NAME_SEPARATOR) {
            Some((base, rest)) => (base.trim().to_string(), strip_wear_suffix(rest.trim())),
            None => (strip_wear_suffix(undecorated.trim()), String::new()),
        };

        let category = if undecorated.starts_with("Sticker") {
            ItemCategory::Sticker
        } else if is_knife_or_glove {
            ItemCategory::Knife
        } else if undecorated.contains(NAME_SEPARATOR) {
            ItemCategory::Weapon
        } else {
            ItemCategory::Other
        };

        Self {
            base_name,
            variant_name,
            wear_tier,
            is_stattrak,
            is_souvenir,
            is_knife_or_glove,
            category,
            display,
        }
    }

    /// Canonical market name, decorations and wear suffix included.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Canonical name with the star and StatTrak markers stripped.
    pub fn undecorated(&self) -> String {
        strip_decorations(&self.display)
    }

    /// True when the name never carried the family/pattern separator.
    pub fn has_separator(&self) -> bool {
        self.display.contains(NAME_SEPARATOR)
    }
}

impl fmt::Display for SkinIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

/// Removes star and StatTrak decorations from a market name.
pub fn strip_decorations(name: &str) -> String {
    name.replace(STATTRAK_MARKER, "").replace(STAR_MARKER, "").trim().to_string()
}

/// Tests whether a display text carries the souvenir marker.
pub fn has_souvenir_marker(text: &str) -> bool {
    text.contains(SOUVENIR_MARKER)
}

fn strip_wear_suffix(segment: &str) -> String {
    for tier in WearTier::ALL {
        if let Some(stripped) = segment.strip_suffix(&format!("({})", tier.full_name())) {
            return stripped.trim().to_string();
        }
    }
    segment.to_string()
}
