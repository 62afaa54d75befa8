//! Customization-page extraction (menu-board pipeline)
//!
//! The customization page shows one flat card per ingredient/option. Zero
//! matching elements is a legitimate page state (some products have no
//! customizations) and yields an empty group list, not an error.

use scraper::{Html, Selector};
use tracing::{debug, info};

use super::text::join_price_fragments;
use super::{compile_selectors, select_attr, select_text, ExtractResult, SnapshotParser};
use crate::domain::model::{DetailEntry, DetailGroup};

/// Context for detail extraction: the canonical product URL, for logging.
#[derive(Debug, Clone)]
pub struct DetailContext {
    pub product_url: String,
}

pub struct DetailParser {
    card_selectors: Vec<Selector>,
    name_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    image_selectors: Vec<Selector>,
}

impl DetailParser {
    pub fn with_config(selectors: &super::config::MenuBoardSelectors) -> ExtractResult<Self> {
        Ok(Self {
            card_selectors: compile_selectors(&selectors.detail_card)?,
            name_selectors: compile_selectors(&selectors.detail_name)?,
            price_selectors: compile_selectors(&selectors.detail_price)?,
            image_selectors: compile_selectors(&selectors.detail_image)?,
        })
    }

    /// All price fragments under the card, in DOM order.
    fn price_fragments(&self, card: &scraper::ElementRef<'_>) -> Vec<String> {
        let mut fragments = Vec::new();
        for selector in &self.price_selectors {
            for element in card.select(selector) {
                fragments.push(element.text().collect::<String>());
            }
            if !fragments.is_empty() {
                break;
            }
        }
        fragments
    }
}

impl SnapshotParser for DetailParser {
    type Output = Vec<DetailGroup>;
    type Context = DetailContext;

    fn parse(&self, html: &Html, context: &Self::Context) -> ExtractResult<Self::Output> {
        let mut entries = Vec::new();

        for selector in &self.card_selectors {
            let cards: Vec<_> = html.select(selector).collect();
            if cards.is_empty() {
                continue;
            }
            debug!(url = %context.product_url, count = cards.len(), "found option cards");

            for card in &cards {
                entries.push(DetailEntry {
                    name: select_text(card, &self.name_selectors),
                    price: join_price_fragments(self.price_fragments(card)),
                    image_url: select_attr(card, &self.image_selectors, "src"),
                });
            }
            break;
        }

        if entries.is_empty() {
            info!(url = %context.product_url, "no customization elements on page");
            return Ok(Vec::new());
        }

        // The menu-board site renders options as one flat list; they become
        // a single unnamed group, entries in DOM order.
        Ok(vec![DetailGroup {
            category_name: None,
            entries,
        }])
    }
}
