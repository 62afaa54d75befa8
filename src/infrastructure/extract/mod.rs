//! Page extraction
//!
//! Pure mapping functions from a page's HTML snapshot to partial records.
//! Extractors never touch the live session: the traversal controllers take a
//! snapshot through the driver and hand it here. Missing optional elements
//! are normal and yield `None`/empty collections, never failures; only a
//! structurally unusable payload (e.g. unparseable JSON-LD) is an error.

pub mod config;
pub mod details;
pub mod error;
pub mod listing;
pub mod products;
pub mod storefront;
pub mod text;

pub use config::ExtractorConfig;
pub use details::DetailParser;
pub use error::{ExtractError, ExtractResult};
pub use listing::ListingParser;
pub use products::ProductParser;
pub use storefront::StorefrontParser;

use scraper::{Html, Selector};
use tracing::warn;

/// Snapshot parser seam shared by all page types.
pub trait SnapshotParser {
    type Output;
    type Context;

    /// Map an HTML snapshot to partial records under the given context.
    fn parse(&self, html: &Html, context: &Self::Context) -> ExtractResult<Self::Output>;
}

/// Compile a fallback list of selector strings, tolerating individual
/// failures as long as at least one compiles.
pub(crate) fn compile_selectors(selector_strings: &[String]) -> ExtractResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ExtractError::invalid_selector(
            &selector_strings.join(", "),
            &errors.join(", "),
        ));
    }

    Ok(selectors)
}

/// First non-empty text match across a fallback selector list.
pub(crate) fn select_text(scope: &scraper::ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    for selector in selectors {
        if let Some(text) = scope
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        {
            return Some(text);
        }
    }
    None
}

/// First attribute match across a fallback selector list.
pub(crate) fn select_attr(
    scope: &scraper::ElementRef<'_>,
    selectors: &[Selector],
    attr: &str,
) -> Option<String> {
    for selector in selectors {
        if let Some(value) = scope
            .select(selector)
            .next()
            .and_then(|e| e.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            return Some(value);
        }
    }
    None
}

/// Whether any element in the document matches any of the selectors.
pub fn document_has_match(html: &Html, selectors: &[Selector]) -> bool {
    selectors.iter().any(|s| html.select(s).next().is_some())
}
