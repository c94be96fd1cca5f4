//! Parses raw price text into a normalized numeric value.

use crate::error::ResolveError;

/// Currency markers stripped before numeric parsing.
const CURRENCY_MARKERS: [&str; 8] = ["$", "€", "£", "¥", "₴", "zł", "Kč", "kr"];

/// Extracts a non-negative price from heterogeneous, locale-inconsistent
/// text.
///
/// A comma is treated as the decimal separator when no dot is present;
/// otherwise commas are thousands separators. Failures come back as
/// [`ResolveError::ParseFailure`], never a panic.
pub fn extract_price(raw: &str) -> Result<f64, ResolveError> {
    let mut cleaned = raw.to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    // Whitespace includes NBSP and narrow NBSP used as digit grouping.
    cleaned.retain(|c| !c.is_whitespace());

    if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned = cleaned.replace(',', ".");
    } else {
        cleaned = cleaned.replace(',', "");
    }

    if cleaned.is_empty() {
        return Err(ResolveError::ParseFailure(raw.to_string()));
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.is_finite() => Ok(value),
        _ => Err(ResolveError::ParseFailure(raw.to_string())),
    }
}
