//! Listing-page extraction
//!
//! Maps the site's top-level listing (one card per menu category) to
//! `ListingEntry` values. A card without a derivable identifier (no link,
//! no href, or an empty trailing path segment) is skipped with a warning
//! instead of failing the page.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::{compile_selectors, select_text, ExtractResult, SnapshotParser};
use crate::domain::model::ListingEntry;

/// Context for listing extraction. Currently just the page URL for logging.
#[derive(Debug, Clone)]
pub struct ListingContext {
    pub page_url: String,
}

pub struct ListingParser {
    card_selectors: Vec<Selector>,
    link_selectors: Vec<Selector>,
    title_selectors: Vec<Selector>,
}

impl ListingParser {
    pub fn with_config(selectors: &super::config::MenuBoardSelectors) -> ExtractResult<Self> {
        Ok(Self {
            card_selectors: compile_selectors(&selectors.listing_card)?,
            link_selectors: compile_selectors(&selectors.listing_link)?,
            title_selectors: compile_selectors(&selectors.listing_title)?,
        })
    }

    /// Derive the category identifier from the card link: the last non-empty
    /// path segment of its href.
    fn identifier_from_card(&self, card: &scraper::ElementRef<'_>) -> Option<String> {
        for selector in &self.link_selectors {
            if let Some(href) = card
                .select(selector)
                .next()
                .and_then(|e| e.value().attr("href"))
            {
                let segment = href
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                if let Some(segment) = segment {
                    return Some(segment.to_string());
                }
            }
        }
        None
    }
}

impl SnapshotParser for ListingParser {
    type Output = Vec<ListingEntry>;
    type Context = ListingContext;

    fn parse(&self, html: &Html, context: &Self::Context) -> ExtractResult<Self::Output> {
        let mut entries = Vec::new();

        for selector in &self.card_selectors {
            let cards: Vec<_> = html.select(selector).collect();
            if cards.is_empty() {
                continue;
            }
            debug!(url = %context.page_url, count = cards.len(), "found listing cards");

            for (index, card) in cards.iter().enumerate() {
                match self.identifier_from_card(card) {
                    Some(identifier) => {
                        let display_name = select_text(card, &self.title_selectors);
                        entries.push(ListingEntry {
                            identifier,
                            display_name,
                        });
                    }
                    None => {
                        warn!(
                            url = %context.page_url,
                            index,
                            "listing card has no derivable identifier, skipping"
                        );
                    }
                }
            }
            break;
        }

        if entries.is_empty() {
            warn!(url = %context.page_url, "no listing entries extracted");
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extract::config::MenuBoardSelectors;

    fn parser() -> ListingParser {
        ListingParser::with_config(&MenuBoardSelectors::default()).unwrap()
    }

    fn context() -> ListingContext {
        ListingContext {
            page_url: "https://example.com/food".into(),
        }
    }

    const LISTING_PAGE: &str = r#"
        <main>
          <article class="styles_card__1se34 extra">
            <a href="/food/burritos"><h4>Burritos</h4></a>
          </article>
          <article class="styles_card__1se34">
            <a href="/food/tacos/"><h4>Tacos</h4></a>
          </article>
          <article class="styles_card__1se34">
            <span>No link at all</span>
          </article>
        </main>"#;

    #[test]
    fn extracts_identifier_from_last_path_segment() {
        let html = Html::parse_document(LISTING_PAGE);
        let entries = parser().parse(&html, &context()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].identifier, "burritos");
        assert_eq!(entries[0].display_name.as_deref(), Some("Burritos"));
        assert_eq!(entries[1].identifier, "tacos");
    }

    #[test]
    fn card_without_href_is_skipped_not_fatal() {
        let html = Html::parse_document(
            r#"<article class="styles_card__1se34"><a>dead link</a></article>"#,
        );
        let entries = parser().parse(&html, &context()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn empty_page_yields_empty_list() {
        let html = Html::parse_document("<main></main>");
        assert!(parser().parse(&html, &context()).unwrap().is_empty());
    }
}
