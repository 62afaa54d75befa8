//! Category-page product extraction
//!
//! Maps a category detail page to `ProductSummary` values. The name is the
//! minimum viability field: a card without one is skipped. Price,
//! description and image are best-effort optionals. Each summary carries the
//! canonical detail URL so the controller can dedup and later re-attach
//! detail results by key.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::text::{clean_price, clean_text};
use super::{compile_selectors, select_attr, select_text, ExtractResult, SnapshotParser};
use crate::domain::model::{canonical_product_url, ProductSummary};

/// Context carried into product extraction: which parent these products
/// belong to and the section base used to build canonical URLs.
#[derive(Debug, Clone)]
pub struct ProductContext {
    pub parent_identifier: String,
    pub section_base: String,
}

pub struct ProductParser {
    card_selectors: Vec<Selector>,
    name_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    description_selectors: Vec<Selector>,
    image_selectors: Vec<Selector>,
}

impl ProductParser {
    pub fn with_config(selectors: &super::config::MenuBoardSelectors) -> ExtractResult<Self> {
        Ok(Self {
            card_selectors: compile_selectors(&selectors.product_card)?,
            name_selectors: compile_selectors(&selectors.product_name)?,
            price_selectors: compile_selectors(&selectors.product_price)?,
            description_selectors: compile_selectors(&selectors.product_description)?,
            image_selectors: compile_selectors(&selectors.product_image)?,
        })
    }
}

impl SnapshotParser for ProductParser {
    type Output = Vec<ProductSummary>;
    type Context = ProductContext;

    fn parse(&self, html: &Html, context: &Self::Context) -> ExtractResult<Self::Output> {
        let mut products = Vec::new();

        for selector in &self.card_selectors {
            let cards: Vec<_> = html.select(selector).collect();
            if cards.is_empty() {
                continue;
            }
            debug!(
                parent = %context.parent_identifier,
                count = cards.len(),
                "found product cards"
            );

            for (index, card) in cards.iter().enumerate() {
                let Some(name) = select_text(card, &self.name_selectors).and_then(|n| clean_text(&n))
                else {
                    warn!(
                        parent = %context.parent_identifier,
                        index,
                        "product card has no name, skipping"
                    );
                    continue;
                };

                let detail_url =
                    canonical_product_url(&context.section_base, &context.parent_identifier, &name);

                products.push(ProductSummary {
                    price: select_text(card, &self.price_selectors)
                        .and_then(|p| clean_price(&p)),
                    description: select_text(card, &self.description_selectors)
                        .and_then(|d| clean_text(&d)),
                    image_url: select_attr(card, &self.image_selectors, "src"),
                    parent_identifier: context.parent_identifier.clone(),
                    detail_url,
                    details: Vec::new(),
                    name,
                });
            }
            break;
        }

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extract::config::MenuBoardSelectors;

    fn parser() -> ProductParser {
        ProductParser::with_config(&MenuBoardSelectors::default()).unwrap()
    }

    fn context() -> ProductContext {
        ProductContext {
            parent_identifier: "burritos".into(),
            section_base: "https://example.com/food".into(),
        }
    }

    const CATEGORY_PAGE: &str = r##"
        <article class="styles_container__yxQpy styles_product-list__3QLx5">
          <div class="styles_card__1DpUa styles_product-card__1-cAT">
            <a class="styles_product-title__6KCyw" href="#"><h4>Bean Burrito®</h4></a>
            <p class="styles_product-details__2VdYf">
              <span>$1.49</span><span>Warm tortilla, beans, onions.</span>
            </p>
            <img class="styles_image__3bMG2 styles_product-image__p-OZn" src="https://cdn/bean.jpg"/>
          </div>
          <div class="styles_card__1DpUa styles_product-card__1-cAT">
            <a class="styles_product-title__6KCyw" href="#"><h4>Cheesy Burrito</h4></a>
            <p class="styles_product-details__2VdYf"><span>$2.19</span></p>
          </div>
          <div class="styles_card__1DpUa styles_product-card__1-cAT">
            <p class="styles_product-details__2VdYf"><span>$9.99</span></p>
          </div>
        </article>"##;

    #[test]
    fn extracts_products_with_optional_fields() {
        let html = Html::parse_document(CATEGORY_PAGE);
        let products = parser().parse(&html, &context()).unwrap();

        assert_eq!(products.len(), 2);
        let bean = &products[0];
        assert_eq!(bean.name, "Bean Burrito®");
        assert_eq!(bean.price.as_deref(), Some("$1.49"));
        assert_eq!(
            bean.description.as_deref(),
            Some("Warm tortilla, beans, onions.")
        );
        assert_eq!(bean.image_url.as_deref(), Some("https://cdn/bean.jpg"));
        assert_eq!(bean.parent_identifier, "burritos");

        let cheesy = &products[1];
        assert_eq!(cheesy.price.as_deref(), Some("$2.19"));
        assert!(cheesy.description.is_none());
        assert!(cheesy.image_url.is_none());
    }

    #[test]
    fn detail_url_is_canonicalized() {
        let html = Html::parse_document(CATEGORY_PAGE);
        let products = parser().parse(&html, &context()).unwrap();
        // Trademark glyph stripped, name lowercased, spaces dashed.
        assert_eq!(
            products[0].detail_url,
            "https://example.com/food/burritos/bean-burrito"
        );
    }

    #[test]
    fn nameless_card_is_skipped() {
        let html = Html::parse_document(CATEGORY_PAGE);
        let products = parser().parse(&html, &context()).unwrap();
        assert!(products.iter().all(|p| !p.name.is_empty()));
    }

    #[test]
    fn zero_cards_is_not_an_error() {
        let html = Html::parse_document("<main>maintenance page</main>");
        assert!(parser().parse(&html, &context()).unwrap().is_empty());
    }
}
