//! Text cleanup rules applied uniformly across extractors
//!
//! Rules: trim surrounding whitespace, strip a literal currency-symbol or
//! surcharge prefix when present, and collapse list-valued price fragments
//! into a single string by concatenation before cleanup.

/// Trim and return `None` for empty results.
pub fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Clean a price string: concatenation already done by the caller for
/// fragment lists; here we drop the surcharge marker and currency prefix the
/// sites render around the amount.
pub fn clean_price(raw: &str) -> Option<String> {
    let joined = raw.replace('+', "");
    let trimmed = joined.trim();
    let stripped = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        None
    } else {
        // Keep the currency symbol when it was present; normalization is the
        // sink's concern, the cleanup only removes the surcharge marker.
        Some(trimmed.to_string())
    }
}

/// Collapse extracted price fragments into one string, then clean.
pub fn join_price_fragments<I, S>(fragments: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: String = fragments
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect();
    clean_price(&joined)
}
