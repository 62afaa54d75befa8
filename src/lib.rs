//! menu-crawler - structured menu extraction from client-side-rendered
//! restaurant ordering sites
//!
//! Two pipelines over one navigation-driver contract: a menu-board site
//! (listing → category page → customization page, one JSON line per
//! category) and a storefront (single store page with click-through item
//! details, one combined JSON document per run). The hard part lives in
//! [`application::traversal`] and [`domain::assembly`]: driving a
//! non-reentrant browser session through the multi-page sequence and
//! reconciling asynchronous detail results back onto the right parent
//! before anything is emitted.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::error::{CrawlError, CrawlResult};
pub use application::sink::RecordSink;
pub use application::storefront::StorefrontCrawler;
pub use application::traversal::MenuBoardCrawler;
pub use domain::model::{AssembledItem, DetailGroup, ListingEntry, ProductSummary, StoreRecord};
pub use domain::session::{RunStatus, RunSummary};
pub use infrastructure::config::{AppConfig, SiteProfile};
pub use infrastructure::driver::{DriverError, PageDriver, WaitCondition};
