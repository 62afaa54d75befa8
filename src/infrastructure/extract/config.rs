//! Selector configuration for the two site profiles
//!
//! Selectors are expected to break when site markup changes; keeping them in
//! configuration (with fallback lists, most specific first) means a broken
//! selector is an ops fix, not a code change. The defaults mirror the live
//! markup of the two targets at the time of writing.

use serde::{Deserialize, Serialize};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

/// Selector sets for both pipelines.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractorConfig {
    pub menu_board: MenuBoardSelectors,
    pub storefront: StorefrontSelectors,
}

/// Menu-board pipeline (listing → category page → customization page).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuBoardSelectors {
    /// One per visible listing card.
    pub listing_card: Vec<String>,
    /// Link inside a card; its href carries the category identifier.
    pub listing_link: Vec<String>,
    /// Visible card title (optional in the markup).
    pub listing_title: Vec<String>,

    /// Readiness marker for a category page.
    pub product_list_ready: Vec<String>,
    pub product_card: Vec<String>,
    pub product_name: Vec<String>,
    pub product_price: Vec<String>,
    pub product_description: Vec<String>,
    pub product_image: Vec<String>,

    /// Readiness marker for a product customization page.
    pub detail_ready: Vec<String>,
    pub detail_card: Vec<String>,
    pub detail_name: Vec<String>,
    /// Matches every price fragment; fragments are concatenated.
    pub detail_price: Vec<String>,
    pub detail_image: Vec<String>,
}

impl Default for MenuBoardSelectors {
    fn default() -> Self {
        Self {
            listing_card: strings(&["article[class*='styles_card__1se34']"]),
            listing_link: strings(&["a[href]"]),
            listing_title: strings(&["h4", "h3"]),

            product_list_ready: strings(&["article[class*='styles_product-list__3QLx5']"]),
            product_card: strings(&["div[class*='styles_product-card__1-cAT']"]),
            product_name: strings(&["a[class*='styles_product-title__6KCyw'] h4"]),
            product_price: strings(&[
                "p[class*='styles_product-details__2VdYf'] span:nth-of-type(1)",
            ]),
            product_description: strings(&[
                "p[class*='styles_product-details__2VdYf'] span:nth-of-type(2)",
            ]),
            product_image: strings(&["img[class*='styles_product-image__p-OZn']"]),

            detail_ready: strings(&["article[class*='styles_main-content__Av8Ro']"]),
            detail_card: strings(&["div[class*='styles_flex-card__-Gb6u']"]),
            detail_name: strings(&["span[class*='styles_name__3-08P']"]),
            detail_price: strings(&["span[class*='styles_price-and-calories__13gpI'] span"]),
            detail_image: strings(&["img[class*='styles_image__3bMG2']"]),
        }
    }
}

/// Storefront pipeline (single store page, JSON-LD skeleton + click-through).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontSelectors {
    pub json_ld: Vec<String>,
    /// Clickable menu-item elements.
    pub store_item: Vec<String>,
    /// Item title on the opened detail view. The obfuscated class is the
    /// live markup; the bare tag is the fallback when it rotates.
    pub item_title: Vec<String>,
    pub item_image: Vec<String>,
    pub customization_group: Vec<String>,
    pub group_label: Vec<String>,
    pub option: Vec<String>,
    pub option_name: Vec<String>,
    pub option_price: Vec<String>,
    pub dialog: Vec<String>,
    pub dialog_close: Vec<String>,
}

impl Default for StorefrontSelectors {
    fn default() -> Self {
        Self {
            json_ld: strings(&["script[type='application/ld+json']"]),
            store_item: strings(&["li[data-test^='store-item-']"]),
            item_title: strings(&["h1.ft.fv.fu.fs.al.cg", "h1"]),
            item_image: strings(&["div.cj.ae.bl.kx img", "picture img"]),
            customization_group: strings(&["div[data-testid='customization-pick-many']"]),
            group_label: strings(&["div.al.aq.b9.f3"]),
            option: strings(&["label"]),
            option_name: strings(&["div.be.bf.bg.bh.g3.or"]),
            option_price: strings(&["div.be.bf.g1.dj.g3.bn"]),
            dialog: strings(&["div[role='dialog']"]),
            dialog_close: strings(&["button[data-testid='close-button']"]),
        }
    }
}
