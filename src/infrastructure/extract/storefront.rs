//! Storefront-page extraction
//!
//! The storefront renders its menu skeleton into an embedded
//! `application/ld+json` payload (schema.org Restaurant) and its per-item
//! customization details behind click-driven views. This parser handles
//! both snapshots: the store page (metadata + skeleton + clickable item
//! enumeration) and the opened item detail view.
//!
//! Correlation redesign: the (section, item) key for every clickable element
//! is resolved ONCE here, at enumeration time, and carried through the
//! click/extract/back round-trip. Detail results re-attach by that key,
//! never by re-matching text after the fact, since page content can shift
//! between requests.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::text::{clean_price, clean_text};
use super::{compile_selectors, select_attr, select_text, ExtractError, ExtractResult};
use crate::domain::model::{
    DetailEntry, DetailGroup, GeoPoint, MenuItem, MenuSection, Offer, OpeningHours, StoreAddress,
    StoreRecord,
};

/// Stable key of a menu item inside the JSON-LD skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub section: usize,
    pub item: usize,
}

/// One clickable item element, resolved against the skeleton at enumeration.
/// `key` is `None` when the element's text matches no skeleton item; the
/// slot still exists and still counts toward completion.
#[derive(Debug, Clone)]
pub struct ItemSlot {
    pub element_index: usize,
    pub key: Option<ItemKey>,
}

/// Extraction result of an opened item detail view.
#[derive(Debug, Clone, Default)]
pub struct ItemDetail {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub groups: Vec<DetailGroup>,
}

pub struct StorefrontParser {
    json_ld_selectors: Vec<Selector>,
    store_item_selectors: Vec<Selector>,
    item_title_selectors: Vec<Selector>,
    item_image_selectors: Vec<Selector>,
    group_selectors: Vec<Selector>,
    group_label_selectors: Vec<Selector>,
    option_selectors: Vec<Selector>,
    option_name_selectors: Vec<Selector>,
    option_price_selectors: Vec<Selector>,
}

impl StorefrontParser {
    pub fn with_config(selectors: &super::config::StorefrontSelectors) -> ExtractResult<Self> {
        Ok(Self {
            json_ld_selectors: compile_selectors(&selectors.json_ld)?,
            store_item_selectors: compile_selectors(&selectors.store_item)?,
            item_title_selectors: compile_selectors(&selectors.item_title)?,
            item_image_selectors: compile_selectors(&selectors.item_image)?,
            group_selectors: compile_selectors(&selectors.customization_group)?,
            group_label_selectors: compile_selectors(&selectors.group_label)?,
            option_selectors: compile_selectors(&selectors.option)?,
            option_name_selectors: compile_selectors(&selectors.option_name)?,
            option_price_selectors: compile_selectors(&selectors.option_price)?,
        })
    }

    /// Parse the store page's JSON-LD payload into the combined record
    /// skeleton. A missing or unparseable payload is fatal for the run:
    /// without the skeleton there is nothing to reconcile against.
    pub fn parse_store(&self, html: &Html) -> ExtractResult<StoreRecord> {
        let raw = self
            .json_ld_selectors
            .iter()
            .find_map(|s| html.select(s).next())
            .map(|e| e.text().collect::<String>())
            .ok_or_else(|| ExtractError::payload_malformed("no ld+json script element"))?;

        let data: Value = serde_json::from_str(&raw).map_err(ExtractError::payload_malformed)?;

        let address = data.get("address");
        let geo = data.get("geo");
        let rating = data.get("aggregateRating");

        Ok(StoreRecord {
            context: value_string(data.get("@context")),
            id: value_string(data.get("@id")),
            title: value_string(data.get("name")),
            serves_cuisine: data.get("servesCuisine").cloned(),
            address: StoreAddress {
                address_type: value_string(address.and_then(|a| a.get("@type"))),
                street: value_string(address.and_then(|a| a.get("streetAddress"))),
                city: value_string(address.and_then(|a| a.get("addressLocality"))),
                state: value_string(address.and_then(|a| a.get("addressRegion"))),
                postal_code: value_string(address.and_then(|a| a.get("postalCode"))),
                country: value_string(address.and_then(|a| a.get("addressCountry"))),
            },
            geo: GeoPoint {
                geo_type: value_string(geo.and_then(|g| g.get("@type"))),
                latitude: geo.and_then(|g| g.get("latitude")).and_then(Value::as_f64),
                longitude: geo.and_then(|g| g.get("longitude")).and_then(Value::as_f64),
            },
            telephone: value_string(data.get("telephone")),
            price_range: value_string(data.get("priceRange")),
            rating: rating.and_then(|r| r.get("ratingValue")).cloned(),
            review_count: rating.and_then(|r| r.get("reviewCount")).cloned(),
            images: string_list(data.get("image")),
            opening_hours: parse_opening_hours(data.get("openingHoursSpecification")),
            categories: parse_menu(data.get("hasMenu")),
        })
    }

    /// Count the clickable item elements and resolve each one's skeleton key
    /// by matching the element's visible text against the not-yet-claimed
    /// item names. Runs once per store page, before any click.
    pub fn enumerate_item_slots(&self, html: &Html, sections: &[MenuSection]) -> Vec<ItemSlot> {
        let elements: Vec<String> = self
            .store_item_selectors
            .iter()
            .find_map(|s| {
                let found: Vec<String> = html
                    .select(s)
                    .map(|e| e.text().collect::<String>())
                    .collect();
                if found.is_empty() {
                    None
                } else {
                    Some(found)
                }
            })
            .unwrap_or_default();

        let mut claimed: Vec<ItemKey> = Vec::new();
        let mut slots = Vec::with_capacity(elements.len());

        for (element_index, text) in elements.iter().enumerate() {
            let key = sections
                .iter()
                .enumerate()
                .flat_map(|(si, section)| {
                    section
                        .menu
                        .iter()
                        .enumerate()
                        .map(move |(ii, item)| (ItemKey { section: si, item: ii }, item))
                })
                .find(|(key, item)| {
                    !claimed.contains(key)
                        && item
                            .name
                            .as_deref()
                            .is_some_and(|name| !name.is_empty() && text.contains(name))
                })
                .map(|(key, _)| key);

            match key {
                Some(key) => claimed.push(key),
                None => warn!(
                    element_index,
                    "clickable item matches no menu skeleton entry"
                ),
            }
            slots.push(ItemSlot { element_index, key });
        }

        debug!(
            slots = slots.len(),
            matched = claimed.len(),
            "enumerated clickable item elements"
        );
        slots
    }

    /// Extract customization groups from an opened item detail view. Zero
    /// groups is a normal outcome (plain items have nothing to customize).
    pub fn parse_item_detail(&self, html: &Html) -> ItemDetail {
        let root = html.root_element();
        let title = select_text(&root, &self.item_title_selectors).and_then(|t| clean_text(&t));
        let image_url = select_attr(&root, &self.item_image_selectors, "src");

        let mut groups = Vec::new();
        for selector in &self.group_selectors {
            let elements: Vec<_> = html.select(selector).collect();
            if elements.is_empty() {
                continue;
            }

            for element in &elements {
                let category_name =
                    select_text(element, &self.group_label_selectors).and_then(|t| clean_text(&t));

                let mut entries = Vec::new();
                for option_selector in &self.option_selectors {
                    for option in element.select(option_selector) {
                        entries.push(DetailEntry {
                            name: select_text(&option, &self.option_name_selectors)
                                .and_then(|t| clean_text(&t)),
                            price: select_text(&option, &self.option_price_selectors)
                                .and_then(|p| clean_price(&p)),
                            image_url: None,
                        });
                    }
                    if !entries.is_empty() {
                        break;
                    }
                }

                groups.push(DetailGroup {
                    category_name,
                    entries,
                });
            }
            break;
        }

        if groups.is_empty() {
            info!("no customization groups on item detail view");
        }

        ItemDetail {
            title,
            image_url,
            groups,
        }
    }
}

fn value_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => clean_text(s),
        other => Some(other.to_string()),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Flatten `openingHoursSpecification` to one row per weekday. `dayOfWeek`
/// may be a scalar or a list; both are accepted.
fn parse_opening_hours(value: Option<&Value>) -> Vec<OpeningHours> {
    let Some(Value::Array(specs)) = value else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for spec in specs {
        let days: Vec<String> = match spec.get("dayOfWeek") {
            Some(Value::Array(days)) => days
                .iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(day)) => vec![day.clone()],
            _ => Vec::new(),
        };
        for day in days {
            rows.push(OpeningHours {
                day,
                opens: value_string(spec.get("opens")),
                closes: value_string(spec.get("closes")),
            });
        }
    }
    rows
}

/// Build the menu skeleton from `hasMenu.hasMenuSection[].hasMenuItem[]`.
fn parse_menu(value: Option<&Value>) -> Vec<MenuSection> {
    let Some(sections) = value
        .and_then(|m| m.get("hasMenuSection"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    sections
        .iter()
        .map(|section| {
            let menu = section
                .get("hasMenuItem")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(parse_menu_item).collect())
                .unwrap_or_default();
            MenuSection {
                title: value_string(section.get("name")),
                menu,
            }
        })
        .collect()
}

fn parse_menu_item(item: &Value) -> MenuItem {
    let offers = match item.get("offers") {
        Some(offer) if !offer.is_null() => vec![Offer {
            offer_type: value_string(offer.get("@type")),
            price: offer.get("price").cloned(),
            price_currency: value_string(offer.get("priceCurrency")),
        }],
        _ => Vec::new(),
    };

    MenuItem {
        item_type: value_string(item.get("@type")),
        name: value_string(item.get("name")),
        description: value_string(item.get("description")),
        image_url: None,
        offers,
        ingredients_groups: None,
    }
}
