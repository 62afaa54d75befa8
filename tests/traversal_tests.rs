//! End-to-end menu-board traversal over a scripted driver.
//!
//! The driver serves canned HTML snapshots per URL and evaluates wait
//! conditions against the current snapshot, so the full
//! listing → category → customization sequence runs without a browser.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use menu_crawler::application::sink::VecSink;
use menu_crawler::application::traversal::ParentState;
use menu_crawler::domain::model::AssembledItem;
use menu_crawler::infrastructure::config::{CrawlConfig, SiteProfile};
use menu_crawler::infrastructure::extract::ExtractorConfig;
use menu_crawler::{DriverError, MenuBoardCrawler, PageDriver, RunStatus, WaitCondition};

const SEED: &str = "https://example.com/food";

/// Serves canned pages keyed by URL. URLs not in the map fail navigation
/// recoverably; URLs in `fatal` lose the session.
struct ScriptedDriver {
    pages: HashMap<String, String>,
    fatal: HashSet<String>,
    current: Option<String>,
    loads: Vec<String>,
    shutdown_called: bool,
}

impl ScriptedDriver {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            fatal: HashSet::new(),
            current: None,
            loads: Vec::new(),
            shutdown_called: false,
        }
    }

    fn condition_holds(&self, condition: &WaitCondition) -> bool {
        let Some(html) = &self.current else {
            return false;
        };
        let document = Html::parse_document(html);
        match condition {
            WaitCondition::ElementPresent(sel) => Selector::parse(sel)
                .map(|s| document.select(&s).next().is_some())
                .unwrap_or(false),
            WaitCondition::ElementAbsent(sel) => Selector::parse(sel)
                .map(|s| document.select(&s).next().is_none())
                .unwrap_or(false),
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn load(&mut self, url: &str) -> Result<(), DriverError> {
        self.loads.push(url.to_string());
        if self.fatal.contains(url) {
            return Err(DriverError::SessionLost {
                reason: "scripted session loss".into(),
            });
        }
        match self.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => Err(DriverError::navigation(url, "no scripted page")),
        }
    }

    async fn wait_until(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        if self.condition_holds(condition) {
            Ok(())
        } else {
            Err(DriverError::timeout(condition, timeout))
        }
    }

    async fn page_html(&mut self) -> Result<String, DriverError> {
        self.current.clone().ok_or(DriverError::SessionLost {
            reason: "no page loaded".into(),
        })
    }

    async fn click(&mut self, _selector: &str, _index: usize) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedStep { step: "click" })
    }

    async fn scroll_to_bottom(
        &mut self,
        _max_rounds: u32,
        _settle: Duration,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn go_back(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedStep { step: "go_back" })
    }

    async fn shutdown(&mut self) -> Result<(), DriverError> {
        self.shutdown_called = true;
        Ok(())
    }
}

fn listing_page() -> String {
    // "tacos" appears twice; the traversal must collapse it to one parent.
    r#"<main>
        <article class="styles_card__1se34"><a href="/food/burritos"><h4>Burritos</h4></a></article>
        <article class="styles_card__1se34"><a href="/food/tacos"><h4>Tacos</h4></a></article>
        <article class="styles_card__1se34"><a href="/food/tacos"><h4>Tacos</h4></a></article>
    </main>"#
        .to_string()
}

fn burritos_page() -> String {
    // Both cards canonicalize to the same detail URL; the second is a dup.
    r##"<article class="styles_product-list__3QLx5">
        <div class="styles_product-card__1-cAT">
          <a class="styles_product-title__6KCyw" href="#"><h4>Bean Burrito®</h4></a>
          <p class="styles_product-details__2VdYf"><span>$1.49</span><span>Beans and onions.</span></p>
        </div>
        <div class="styles_product-card__1-cAT">
          <a class="styles_product-title__6KCyw" href="#"><h4>Bean Burrito</h4></a>
          <p class="styles_product-details__2VdYf"><span>$1.49</span></p>
        </div>
    </article>"##
        .to_string()
}

fn tacos_page() -> String {
    r##"<article class="styles_product-list__3QLx5">
        <div class="styles_product-card__1-cAT">
          <a class="styles_product-title__6KCyw" href="#"><h4>Crunchy Taco</h4></a>
          <p class="styles_product-details__2VdYf"><span>$1.89</span></p>
        </div>
    </article>"##
        .to_string()
}

fn bean_burrito_detail() -> String {
    r#"<article class="styles_main-content__Av8Ro">
        <div class="styles_flex-card__-Gb6u">
          <span class="styles_name__3-08P">Onions</span>
          <span class="styles_price-and-calories__13gpI"><span>+</span><span>$0.30</span></span>
        </div>
        <div class="styles_flex-card__-Gb6u">
          <span class="styles_name__3-08P">Extra Cheese</span>
          <span class="styles_price-and-calories__13gpI"><span>+$0.60</span></span>
        </div>
    </article>"#
        .to_string()
}

fn empty_detail() -> String {
    r#"<article class="styles_main-content__Av8Ro"></article>"#.to_string()
}

fn full_site() -> HashMap<String, String> {
    HashMap::from([
        (SEED.to_string(), listing_page()),
        (format!("{SEED}/burritos"), burritos_page()),
        (format!("{SEED}/tacos"), tacos_page()),
        (
            format!("{SEED}/burritos/bean-burrito"),
            bean_burrito_detail(),
        ),
        (format!("{SEED}/tacos/crunchy-taco"), empty_detail()),
    ])
}

fn config() -> CrawlConfig {
    let mut config = CrawlConfig::for_profile(SiteProfile::MenuBoard);
    config.seed_url = SEED.to_string();
    config
}

fn crawler(
    pages: HashMap<String, String>,
) -> MenuBoardCrawler<ScriptedDriver, VecSink<AssembledItem>> {
    MenuBoardCrawler::new(
        ScriptedDriver::new(pages),
        VecSink::new(),
        config(),
        &ExtractorConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn full_run_emits_one_record_per_unique_listing_entry() {
    let mut crawler = crawler(full_site());
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.parents_discovered, 2);
    assert_eq!(summary.parents_emitted, 2);
    // One duplicate listing identifier plus one duplicate canonical URL.
    assert_eq!(summary.duplicates_dropped, 2);
    assert_eq!(summary.products_found, 2);
    assert_eq!(summary.details_fetched, 2);
    assert_eq!(summary.units_skipped, 0);

    assert_eq!(crawler.parent_state("burritos"), Some(ParentState::Complete));
    assert_eq!(crawler.parent_state("tacos"), Some(ParentState::Complete));
    assert_eq!(crawler.parent_state("nachos"), None);

    let (driver, sink) = crawler.into_parts();
    assert_eq!(sink.records.len(), 2);

    let (key, burritos) = &sink.records[0];
    assert_eq!(key, "burritos");
    assert_eq!(burritos.display_name.as_deref(), Some("Burritos"));
    assert_eq!(burritos.products.len(), 1);
    assert_eq!(burritos.products[0].name, "Bean Burrito®");
    assert_eq!(burritos.products[0].details.len(), 1);
    assert_eq!(burritos.products[0].details[0].entries.len(), 2);

    let (key, tacos) = &sink.records[1];
    assert_eq!(key, "tacos");
    assert_eq!(tacos.products.len(), 1);
    assert!(tacos.products[0].details.is_empty());

    // Exactly one category-page request per unique identifier.
    let category_loads: Vec<_> = driver
        .loads
        .iter()
        .filter(|u| u.as_str() == format!("{SEED}/burritos") || u.as_str() == format!("{SEED}/tacos"))
        .collect();
    assert_eq!(category_loads.len(), 2);
}

#[tokio::test]
async fn missing_detail_page_counts_as_received_empty() {
    let mut pages = full_site();
    pages.remove(&format!("{SEED}/burritos/bean-burrito"));

    let mut crawler = crawler(pages);
    let summary = crawler.run().await.unwrap();

    // The parent still closes and emits; the product carries no details.
    assert_eq!(summary.parents_emitted, 2);
    assert_eq!(summary.units_skipped, 1);
    assert_eq!(summary.details_fetched, 1);
    assert_eq!(summary.error_count, 1);

    let (_, sink) = crawler.into_parts();
    let burritos = &sink.records[0].1;
    assert_eq!(burritos.products.len(), 1);
    assert!(burritos.products[0].details.is_empty());
}

#[tokio::test]
async fn zero_product_parent_emits_empty_record() {
    let mut pages = full_site();
    pages.insert(
        format!("{SEED}/tacos"),
        r#"<article class="styles_product-list__3QLx5"></article>"#.to_string(),
    );

    let mut crawler = crawler(pages);
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.parents_emitted, 2);
    let (_, sink) = crawler.into_parts();
    let tacos = &sink.records[1].1;
    assert_eq!(sink.records[1].0, "tacos");
    assert!(tacos.products.is_empty());
}

#[tokio::test]
async fn unreachable_category_page_skips_that_parent_only() {
    let mut pages = full_site();
    pages.remove(&format!("{SEED}/burritos"));

    let mut crawler = crawler(pages);
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.parents_emitted, 1);
    assert_eq!(summary.units_skipped, 1);

    let (_, sink) = crawler.into_parts();
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].0, "tacos");
}

#[tokio::test]
async fn unreachable_listing_page_completes_with_nothing_emitted() {
    let mut crawler = crawler(HashMap::new());
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.parents_discovered, 0);
    assert_eq!(summary.parents_emitted, 0);
    assert_eq!(summary.units_skipped, 1);

    let (_, sink) = crawler.into_parts();
    assert!(sink.records.is_empty());
}

#[tokio::test]
async fn session_loss_aborts_the_run_and_releases_the_session() {
    let mut driver = ScriptedDriver::new(full_site());
    driver.fatal.insert(format!("{SEED}/tacos"));

    let mut crawler = MenuBoardCrawler::new(
        driver,
        VecSink::new(),
        config(),
        &ExtractorConfig::default(),
    )
    .unwrap();

    assert!(crawler.run().await.is_err());
    let (driver, sink) = crawler.into_parts();
    assert!(driver.shutdown_called);
    // The parent processed before the loss was already emitted.
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].0, "burritos");
}

#[tokio::test]
async fn cancellation_stops_between_parents() {
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();

    let mut crawler = crawler(full_site()).with_cancellation(cancel);
    let summary = crawler.run().await.unwrap();

    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(summary.parents_emitted, 0);
    // Discovered but never requested: the run stopped before the first parent.
    assert_eq!(
        crawler.parent_state("burritos"),
        Some(ParentState::Discovered)
    );
}
