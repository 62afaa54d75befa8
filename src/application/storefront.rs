//! Storefront traversal controller
//!
//! One store page per run. The menu skeleton comes from the embedded
//! JSON-LD payload; per-item customization details come from clicking each
//! menu-item element, extracting the opened view and navigating back. The
//! (section, item) key for every clickable element is resolved once at
//! enumeration and carried through the round-trip; details re-attach by
//! key, never by re-matching text.
//!
//! Every clickable element consumes exactly one completion slot, whether
//! its round-trip succeeded, timed out, hit an unsupported step or matched
//! no skeleton item. The combined document is emitted when the counter
//! closes, zero-slot case included.

use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::error::CrawlResult;
use crate::application::sink::RecordSink;
use crate::domain::assembly::AssemblyStore;
use crate::domain::model::StoreRecord;
use crate::domain::session::{RunSession, RunStatus, RunSummary};
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::driver::{PageDriver, WaitCondition};
use crate::infrastructure::extract::storefront::{ItemDetail, ItemSlot};
use crate::infrastructure::extract::{ExtractorConfig, StorefrontParser};

pub struct StorefrontCrawler<D, S> {
    driver: D,
    sink: S,
    config: CrawlConfig,
    parser: StorefrontParser,
    item_selector: String,
    dialog_selector: String,
    dialog_close_selector: String,
    store: AssemblyStore<()>,
    session: RunSession,
    cancel: CancellationToken,
}

impl<D, S> StorefrontCrawler<D, S>
where
    D: PageDriver,
    S: RecordSink<StoreRecord>,
{
    pub fn new(
        driver: D,
        sink: S,
        config: CrawlConfig,
        selectors: &ExtractorConfig,
    ) -> CrawlResult<Self> {
        let front = &selectors.storefront;
        let session = RunSession::new(&config.seed_url);
        Ok(Self {
            driver,
            sink,
            parser: StorefrontParser::with_config(front)?,
            item_selector: front.store_item.first().cloned().unwrap_or_default(),
            dialog_selector: front.dialog.first().cloned().unwrap_or_default(),
            dialog_close_selector: front.dialog_close.first().cloned().unwrap_or_default(),
            store: AssemblyStore::new(),
            session,
            config,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn into_parts(self) -> (D, S) {
        (self.driver, self.sink)
    }

    pub async fn run(&mut self) -> CrawlResult<RunSummary> {
        match self.run_inner().await {
            Ok(status) => {
                let dangling = self.store.dangling_parents().await;
                if !dangling.is_empty() {
                    error!(?dangling, "run finished with unclosed store record");
                }
                let summary = self.session.clone().finish(status);
                info!(
                    run_id = %summary.run_id,
                    details = summary.details_fetched,
                    skipped = summary.units_skipped,
                    "storefront run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                let summary = self.session.clone().finish(RunStatus::Failed);
                error!(
                    run_id = %summary.run_id,
                    details = summary.details_fetched,
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
        let seed_url = self.config.seed_url.clone();
        self.driver.load(&seed_url).await?;

        // The skeleton ships server-side; the clickable list may lag. A
        // missed wait means no click-through details, not a dead run.
        let items_present = WaitCondition::ElementPresent(self.item_selector.clone());
        if let Err(e) = self
            .driver
            .wait_until(&items_present, self.config.wait_timeout())
            .await
        {
            if e.is_fatal() {
                return Err(e.into());
            }
            self.session.record_skip("store item list", &e);
        }

        let html = Html::parse_document(&self.driver.page_html().await?);
        // Malformed top-level payload is fatal: nothing to reconcile against.
        let mut record = self.parser.parse_store(&html)?;
        let slots = self.parser.enumerate_item_slots(&html, &record.categories);

        let store_key = record
            .id
            .clone()
            .or_else(|| record.title.clone())
            .unwrap_or_else(|| self.config.seed_url.clone());

        self.session.parents_discovered = 1;
        self.session.products_found = record
            .categories
            .iter()
            .map(|s| s.menu.len() as u32)
            .sum();
        let slot_count = slots.len();
        self.store.open(&store_key, slot_count).await?;

        for slot in slots {
            if self.cancel.is_cancelled() {
                // Consume the remaining slots as received-empty so the
                // record still closes and emits before we stop.
                debug!("cancellation requested, counting remaining slots empty");
                let closes = self.store.record_child(&store_key, ()).await?;
                if closes {
                    self.emit(&store_key, &record).await?;
                }
                continue;
            }

            match self.collect_slot(&slot).await {
                Ok(Some(detail)) => {
                    self.session.details_fetched += 1;
                    attach_detail(&mut record, &slot, detail);
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    self.session
                        .record_skip(&format!("store item #{}", slot.element_index), &e);
                }
                Err(e) => return Err(e),
            }

            let closes = self.store.record_child(&store_key, ()).await?;
            if closes {
                self.emit(&store_key, &record).await?;
            }
        }

        if slot_count == 0 {
            // Zero clickable elements: skeleton-only record, emitted once.
            self.emit(&store_key, &record).await?;
        }

        Ok(if self.cancel.is_cancelled() {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        })
    }

    /// One click/extract/back round-trip. `Ok(None)` means the element had
    /// no skeleton key; the caller still consumes the completion slot.
    async fn collect_slot(&mut self, slot: &ItemSlot) -> CrawlResult<Option<ItemDetail>> {
        self.driver
            .click(&self.item_selector, slot.element_index)
            .await?;
        self.dismiss_popup().await;

        let html = Html::parse_document(&self.driver.page_html().await?);
        let detail = self.parser.parse_item_detail(&html);

        // Best-effort return to the listing; the next click degrades on its
        // own if this failed.
        if let Err(e) = self.driver.go_back().await {
            if e.is_fatal() {
                return Err(e.into());
            }
            warn!(error = %e, "go_back failed after item view");
        } else {
            let back_on_list = WaitCondition::ElementPresent(self.item_selector.clone());
            if let Err(e) = self
                .driver
                .wait_until(&back_on_list, self.config.wait_timeout())
                .await
            {
                if e.is_fatal() {
                    return Err(e.into());
                }
                warn!(error = %e, "item list did not reappear after go_back");
            }
        }

        Ok(slot.key.map(|_| detail))
    }

    /// Dismiss the interstitial dialog when it shows up. Absence and
    /// failure are both fine; the extraction proceeds either way.
    async fn dismiss_popup(&mut self) {
        if self.dialog_selector.is_empty() {
            return;
        }
        let visible = WaitCondition::ElementPresent(self.dialog_selector.clone());
        if self
            .driver
            .wait_until(&visible, self.config.popup_timeout())
            .await
            .is_err()
        {
            debug!("no popup to dismiss");
            return;
        }
        if let Err(e) = self.driver.click(&self.dialog_close_selector, 0).await {
            info!(error = %e, "popup close click failed");
            return;
        }
        let gone = WaitCondition::ElementAbsent(self.dialog_selector.clone());
        if let Err(e) = self
            .driver
            .wait_until(&gone, self.config.popup_timeout())
            .await
        {
            info!(error = %e, "popup still visible after close");
        }
    }

    async fn emit(&mut self, store_key: &str, record: &StoreRecord) -> CrawlResult<()> {
        self.sink.emit(store_key, record)?;
        self.store.close(store_key).await?;
        self.session.parents_emitted += 1;
        info!(
            store = store_key,
            sections = record.categories.len(),
            "combined store record emitted"
        );
        Ok(())
    }
}

/// Attach an item detail to its skeleton slot by the carried key.
fn attach_detail(record: &mut StoreRecord, slot: &ItemSlot, detail: ItemDetail) {
    let Some(key) = slot.key else { return };
    let Some(item) = record
        .categories
        .get_mut(key.section)
        .and_then(|s| s.menu.get_mut(key.item))
    else {
        warn!(?key, "carried key no longer resolves in skeleton");
        return;
    };
    // An empty group list from a successful round-trip means "determined to
    // have none" and is recorded as such.
    item.ingredients_groups = Some(detail.groups);
    if item.image_url.is_none() {
        item.image_url = detail.image_url;
    }
}
