//! Canonical item identities parsed from raw market names.

pub mod models;
pub mod normalize;

pub use models::{ItemCategory, SkinIdentity, WearTier};
pub use normalize::normalize;

/// Marker prefix carried by knife and glove identities.
pub const STAR_MARKER: &str = "★";

/// Marker carried by StatTrak variants.
pub const STATTRAK_MARKER: &str = "StatTrak™";

/// Marker carried by souvenir variants.
pub const SOUVENIR_MARKER: &str = "Souvenir";

/// Separator between the weapon/family segment and the pattern segment.
pub const NAME_SEPARATOR: &str = " | ";
