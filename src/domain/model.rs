//! Core data model for extracted menu records
//!
//! These are the shapes that travel from the page extractors through the
//! traversal controllers and out of the emission sink. Optional fields stay
//! optional end to end: absence of a price or an image on the page is normal
//! and must never fail a record.

use serde::{Deserialize, Serialize};

/// One card on a listing page, keyed by the dynamic path segment of its link.
///
/// Identifiers are NOT guaranteed unique by the source; the traversal
/// controller collapses duplicates before using one as a parent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Last path segment of the card's href, e.g. `burritos`.
    pub identifier: String,
    /// Visible card title, when the markup exposes one.
    pub display_name: Option<String>,
}

impl ListingEntry {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A product card extracted from a category detail page.
///
/// `name` is the minimum viability field; everything else is best-effort.
/// Identity for deduplication is the canonical detail URL, not the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Back-reference to the owning `ListingEntry::identifier`.
    #[serde(skip_serializing)]
    pub parent_identifier: String,
    /// Canonical detail-page URL; carried through the navigation context so
    /// detail results re-attach by key rather than by text re-matching.
    #[serde(skip_serializing)]
    pub detail_url: String,
    /// Customization groups collected from the product's detail page.
    pub details: Vec<DetailGroup>,
}

/// One customization/ingredient option inside a detail group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub name: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}

/// A named cluster of customization options on a product detail page.
/// Entry order reflects DOM order and is preserved through assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailGroup {
    pub category_name: Option<String>,
    pub entries: Vec<DetailEntry>,
}

/// Terminal emitted unit for the menu-board pipeline: one listing entry with
/// all of its products, each augmented with its detail groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledItem {
    #[serde(rename = "name")]
    pub parent_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub products: Vec<ProductSummary>,
}

// ---------------------------------------------------------------------------
// Storefront pipeline record (single combined document per run)
// ---------------------------------------------------------------------------

/// Restaurant metadata plus the full menu, emitted once per storefront run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(rename = "Context")]
    pub context: Option<String>,
    #[serde(rename = "Id")]
    pub id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    pub serves_cuisine: Option<serde_json::Value>,
    #[serde(rename = "restaurantAddress")]
    pub address: StoreAddress,
    pub geo: GeoPoint,
    pub telephone: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<serde_json::Value>,
    pub review_count: Option<serde_json::Value>,
    pub images: Vec<String>,
    pub opening_hours: Vec<OpeningHours>,
    pub categories: Vec<MenuSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAddress {
    #[serde(rename = "Type")]
    pub address_type: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub geo_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One flattened `{day, opens, closes}` row per weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub day: String,
    pub opens: Option<String>,
    pub closes: Option<String>,
}

/// A menu section from the JSON-LD skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSection {
    pub title: Option<String>,
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub offers: Vec<Offer>,
    /// Populated by the click-through detail collection; `None` until the
    /// item's detail round-trip completes (or is counted as received-empty).
    #[serde(rename = "ingredientsGroups")]
    pub ingredients_groups: Option<Vec<DetailGroup>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
    pub price: Option<serde_json::Value>,
    pub price_currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Canonical product identity
// ---------------------------------------------------------------------------

/// Glyphs stripped when canonicalizing a detail URL. Product names carry
/// trademark marks inconsistently across pages; identity must ignore them.
const TRADEMARK_GLYPHS: [char; 3] = ['\u{00AE}', '\u{2122}', '~'];

/// Strip trademark/registration glyphs from a string.
pub fn strip_trademark_glyphs(input: &str) -> String {
    input
        .chars()
        .filter(|c| !TRADEMARK_GLYPHS.contains(c))
        .collect()
}

/// Encode a product name as a URL path segment: lowercased, spaces to `-`.
pub fn product_url_segment(name: &str) -> String {
    name.trim().replace(' ', "-").to_lowercase()
}

/// Build the canonical detail URL for a product under a listing entry.
///
/// This is the run-wide dedup key: two products that canonicalize to the same
/// URL are the same product, and only the first-seen one is retained.
pub fn canonical_product_url(section_base: &str, parent_identifier: &str, name: &str) -> String {
    let raw = format!(
        "{}/{}/{}",
        section_base.trim_end_matches('/'),
        parent_identifier,
        product_url_segment(name)
    );
    strip_trademark_glyphs(&raw)
}

/// Build the detail URL for a listing entry itself.
pub fn parent_detail_url(section_base: &str, parent_identifier: &str) -> String {
    format!(
        "{}/{}",
        section_base.trim_end_matches('/'),
        parent_identifier
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trademark_glyphs_are_stripped() {
        assert_eq!(strip_trademark_glyphs("Baja Blast®"), "Baja Blast");
        assert_eq!(strip_trademark_glyphs("Doritos™ Locos~"), "Doritos Locos");
        assert_eq!(strip_trademark_glyphs("plain"), "plain");
    }

    #[test]
    fn product_segment_encoding() {
        assert_eq!(product_url_segment("Cheesy Bean Burrito"), "cheesy-bean-burrito");
        assert_eq!(product_url_segment("  Crunchwrap  "), "crunchwrap");
    }

    #[test]
    fn canonical_url_ignores_trademark_marks() {
        let a = canonical_product_url("https://example.com/food", "burritos", "Bean Burrito®");
        let b = canonical_product_url("https://example.com/food/", "burritos", "Bean Burrito");
        assert_eq!(a, b);
        assert_eq!(a, "https://example.com/food/burritos/bean-burrito");
    }

    #[test]
    fn parent_url_construction() {
        assert_eq!(
            parent_detail_url("https://example.com/food/", "tacos"),
            "https://example.com/food/tacos"
        );
    }

    proptest::proptest! {
        #[test]
        fn canonical_url_is_lowercase_and_glyph_free(name in "[A-Za-z®™~ ]{1,24}") {
            let url = canonical_product_url("https://example.com/food", "tacos", &name);
            for glyph in TRADEMARK_GLYPHS {
                proptest::prop_assert!(!url.contains(glyph));
            }
            proptest::prop_assert!(!url.trim().contains(' '));
            proptest::prop_assert_eq!(url.clone(), url.to_lowercase());
        }
    }
}
