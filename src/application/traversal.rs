//! Menu-board traversal controller
//!
//! Drives the three-step navigation sequence (listing → category page →
//! customization page) over a single non-reentrant browser session and
//! assembles one record per listing entry. The controller owns all
//! run-scoped state: the seen-URL set, the per-parent state machine and the
//! assembly store, so runs are independent and tear down cleanly.
//!
//! Failure policy (per unit, never per run): a timed-out or failed child
//! step still consumes its completion slot as received-empty; a parent
//! must never be starved into a permanently incomplete state.

use std::collections::{HashMap, HashSet};

use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::error::CrawlResult;
use crate::application::sink::RecordSink;
use crate::domain::assembly::AssemblyStore;
use crate::domain::model::{
    parent_detail_url, AssembledItem, DetailGroup, ListingEntry, ProductSummary,
};
use crate::domain::session::{RunSession, RunStatus, RunSummary};
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::driver::{PageDriver, WaitCondition};
use crate::infrastructure::extract::details::DetailContext;
use crate::infrastructure::extract::listing::ListingContext;
use crate::infrastructure::extract::products::ProductContext;
use crate::infrastructure::extract::{
    DetailParser, ExtractorConfig, ListingParser, ProductParser, SnapshotParser,
};

/// Per-parent progression through the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentState {
    Discovered,
    DetailRequested,
    ProductsEnumerated,
    AwaitingChildren,
    Complete,
}

pub struct MenuBoardCrawler<D, S> {
    driver: D,
    sink: S,
    config: CrawlConfig,
    listing_parser: ListingParser,
    product_parser: ProductParser,
    detail_parser: DetailParser,
    listing_ready: Option<WaitCondition>,
    products_ready: Option<WaitCondition>,
    detail_ready: Option<WaitCondition>,
    store: AssemblyStore<ProductSummary>,
    seen_product_urls: HashSet<String>,
    states: HashMap<String, ParentState>,
    session: RunSession,
    cancel: CancellationToken,
}

fn ready_condition(selectors: &[String]) -> Option<WaitCondition> {
    selectors
        .first()
        .map(|s| WaitCondition::ElementPresent(s.clone()))
}

impl<D, S> MenuBoardCrawler<D, S>
where
    D: PageDriver,
    S: RecordSink<AssembledItem>,
{
    pub fn new(
        driver: D,
        sink: S,
        config: CrawlConfig,
        selectors: &ExtractorConfig,
    ) -> CrawlResult<Self> {
        let board = &selectors.menu_board;
        let session = RunSession::new(&config.seed_url);
        Ok(Self {
            driver,
            sink,
            listing_parser: ListingParser::with_config(board)?,
            product_parser: ProductParser::with_config(board)?,
            detail_parser: DetailParser::with_config(board)?,
            listing_ready: ready_condition(&board.listing_card),
            products_ready: ready_condition(&board.product_list_ready),
            detail_ready: ready_condition(&board.detail_ready),
            store: AssemblyStore::new(),
            seen_product_urls: HashSet::new(),
            states: HashMap::new(),
            session,
            config,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current state of a parent, for progress inspection.
    pub fn parent_state(&self, identifier: &str) -> Option<ParentState> {
        self.states.get(identifier).copied()
    }

    pub fn into_parts(self) -> (D, S) {
        (self.driver, self.sink)
    }

    /// Run the full traversal. Recoverable failures skip their unit; a
    /// fatal failure releases the session and propagates.
    pub async fn run(&mut self) -> CrawlResult<RunSummary> {
        match self.run_inner().await {
            Ok(status) => {
                let dangling = self.store.dangling_parents().await;
                if !dangling.is_empty() {
                    // Every opened parent must close; this is the silent
                    // data-loss class the assembly store exists to catch.
                    error!(?dangling, "run finished with unclosed parents");
                }
                let summary = self.session.clone().finish(status);
                info!(
                    run_id = %summary.run_id,
                    parents = summary.parents_emitted,
                    products = summary.products_found,
                    skipped = summary.units_skipped,
                    "menu-board run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                let summary = self.session.clone().finish(RunStatus::Failed);
                error!(
                    run_id = %summary.run_id,
                    emitted = summary.parents_emitted,
                    error = %e,
                    "fatal failure, releasing browser session"
                );
                if let Err(shutdown_err) = self.driver.shutdown().await {
                    warn!(error = %shutdown_err, "session release failed");
                }
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> CrawlResult<RunStatus> {
        let entries = match self.load_listing().await {
            Ok(entries) => entries,
            Err(e) if e.is_recoverable() => {
                self.session.record_skip("listing page", &e);
                return Ok(RunStatus::Completed);
            }
            Err(e) => return Err(e),
        };

        let unique = self.dedup_entries(entries);
        self.session.parents_discovered = unique.len() as u32;
        info!(parents = unique.len(), "listing enumerated");

        for entry in unique {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping before next parent");
                return Ok(RunStatus::Cancelled);
            }
            if let Err(e) = self.process_parent(&entry).await {
                if e.is_recoverable() {
                    self.session
                        .record_skip(&format!("category '{}'", entry.identifier), &e);
                } else {
                    return Err(e);
                }
            }
        }

        Ok(RunStatus::Completed)
    }

    async fn load_listing(&mut self) -> CrawlResult<Vec<ListingEntry>> {
        self.driver.load(&self.config.seed_url).await?;
        if let Some(cond) = self.listing_ready.clone() {
            self.driver
                .wait_until(&cond, self.config.wait_timeout())
                .await?;
        }
        // Reveal lazily-rendered cards; a scroll failure costs nothing.
        if let Err(e) = self
            .driver
            .scroll_to_bottom(self.config.max_scroll_rounds, self.config.scroll_settle())
            .await
        {
            if e.is_fatal() {
                return Err(e.into());
            }
            debug!(error = %e, "scroll-to-bottom unavailable, extracting as-is");
        }

        let html = Html::parse_document(&self.driver.page_html().await?);
        let context = ListingContext {
            page_url: self.config.seed_url.clone(),
        };
        Ok(self.listing_parser.parse(&html, &context)?)
    }

    /// Collapse duplicate identifiers, first occurrence wins.
    fn dedup_entries(&mut self, entries: Vec<ListingEntry>) -> Vec<ListingEntry> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(entries.len());
        for entry in entries {
            if seen.insert(entry.identifier.clone()) {
                self.states
                    .insert(entry.identifier.clone(), ParentState::Discovered);
                unique.push(entry);
            } else {
                debug!(identifier = %entry.identifier, "duplicate listing identifier dropped");
                self.session.duplicates_dropped += 1;
            }
        }
        unique
    }

    async fn process_parent(&mut self, entry: &ListingEntry) -> CrawlResult<()> {
        let id = &entry.identifier;
        let url = parent_detail_url(&self.config.seed_url, id);
        debug!(parent = %id, url = %url, "requesting category page");
        self.states.insert(id.clone(), ParentState::DetailRequested);

        self.driver.load(&url).await?;
        if let Some(cond) = self.products_ready.clone() {
            self.driver
                .wait_until(&cond, self.config.wait_timeout())
                .await?;
        }

        let html = Html::parse_document(&self.driver.page_html().await?);
        let context = ProductContext {
            parent_identifier: id.clone(),
            section_base: self.config.seed_url.clone(),
        };
        let mut products = self.product_parser.parse(&html, &context)?;
        self.states.insert(id.clone(), ParentState::ProductsEnumerated);

        // Canonical-URL dedup across the whole run, first-seen wins.
        let mut retained = Vec::with_capacity(products.len());
        for product in products.drain(..) {
            if self.seen_product_urls.insert(product.detail_url.clone()) {
                retained.push(product);
            } else {
                debug!(url = %product.detail_url, "duplicate canonical product URL dropped");
                self.session.duplicates_dropped += 1;
            }
        }

        self.session.products_found += retained.len() as u32;
        self.store.open(id, retained.len()).await?;

        if retained.is_empty() {
            // Zero products: straight to Complete with an empty sequence.
            return self.emit_parent(entry).await;
        }

        self.states.insert(id.clone(), ParentState::AwaitingChildren);
        for mut product in retained {
            product.details = match self.fetch_details(&product.detail_url).await {
                Ok(groups) => {
                    self.session.details_fetched += 1;
                    groups
                }
                Err(e) if e.is_recoverable() => {
                    // The slot still counts: received-empty, never starved.
                    self.session
                        .record_skip(&format!("product '{}'", product.detail_url), &e);
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            let closes = self.store.record_child(id, product).await?;
            if closes {
                self.emit_parent(entry).await?;
            }
        }

        Ok(())
    }

    async fn fetch_details(&mut self, product_url: &str) -> CrawlResult<Vec<DetailGroup>> {
        self.driver.load(product_url).await?;
        if let Some(cond) = self.detail_ready.clone() {
            self.driver
                .wait_until(&cond, self.config.wait_timeout())
                .await?;
        }
        let html = Html::parse_document(&self.driver.page_html().await?);
        let context = DetailContext {
            product_url: product_url.to_string(),
        };
        Ok(self.detail_parser.parse(&html, &context)?)
    }

    async fn emit_parent(&mut self, entry: &ListingEntry) -> CrawlResult<()> {
        let id = &entry.identifier;
        let products = self.store.snapshot(id).await?;
        let item = AssembledItem {
            parent_identifier: id.clone(),
            display_name: entry.display_name.clone(),
            products,
        };
        self.sink.emit(id, &item)?;
        self.store.close(id).await?;
        self.states.insert(id.clone(), ParentState::Complete);
        self.session.parents_emitted += 1;
        info!(parent = %id, products = item.products.len(), "assembled item emitted");
        Ok(())
    }
}
