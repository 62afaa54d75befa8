//! Application configuration
//!
//! Serde-backed config with per-struct defaults, loadable from an optional
//! TOML file plus `MENU_CRAWLER_*` environment overrides. The recognized
//! traversal option is `wait_time`: every navigation wait is bounded by it
//! so one stuck page cannot stall the rest of the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::extract::ExtractorConfig;
use super::http_driver::HttpDriverConfig;

/// Which site pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteProfile {
    /// Listing → category page → customization page; JSON line per category.
    MenuBoard,
    /// Single store page with click-through details; one combined document.
    Storefront,
}

impl std::str::FromStr for SiteProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "menu-board" | "menuboard" => Ok(Self::MenuBoard),
            "storefront" => Ok(Self::Storefront),
            other => {
                anyhow::bail!("unknown site profile '{other}' (expected menu-board | storefront)")
            }
        }
    }
}

/// Traversal settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub profile: SiteProfile,
    /// Site root listing page (menu board) or store page (storefront).
    pub seed_url: String,
    /// Bound for every navigation wait, in seconds.
    pub wait_time: u64,
    /// Shorter bound for popup/dialog dismissal waits.
    pub popup_wait: u64,
    /// Upper bound on scroll-to-bottom iterations.
    pub max_scroll_rounds: u32,
    /// Fixed settle delay between scroll iterations, in milliseconds.
    pub scroll_settle_ms: u64,
    /// Where the emission sink writes.
    pub output_path: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::for_profile(SiteProfile::MenuBoard)
    }
}

impl CrawlConfig {
    /// Profile defaults mirror the sites' observed latencies: the menu board
    /// needs the longer 15s bound, the storefront settles in 10s.
    pub fn for_profile(profile: SiteProfile) -> Self {
        match profile {
            SiteProfile::MenuBoard => Self {
                profile,
                seed_url: "https://www.tacobell.com/food".to_string(),
                wait_time: 15,
                popup_wait: 5,
                max_scroll_rounds: 10,
                scroll_settle_ms: 500,
                output_path: PathBuf::from("menu_items.jl"),
            },
            SiteProfile::Storefront => Self {
                profile,
                seed_url:
                    "https://www.ubereats.com/store/flintridge-pizza-kitchen/RxyR9w3aU-KVTHK2s9XGlg?ps=1"
                        .to_string(),
                wait_time: 10,
                popup_wait: 5,
                max_scroll_rounds: 10,
                scroll_settle_ms: 500,
                output_path: PathBuf::from("restaurant.json"),
            },
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_secs(self.popup_wait)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridable via `RUST_LOG`.
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub http: HttpDriverConfig,
    pub logging: LoggingConfig,
    pub selectors: ExtractorConfig,
}

impl AppConfig {
    /// Defaults for a profile, before file/env overrides.
    pub fn for_profile(profile: SiteProfile) -> Self {
        Self {
            crawl: CrawlConfig::for_profile(profile),
            ..Self::default()
        }
    }

    /// Layered load: profile defaults, then an optional config file, then
    /// `MENU_CRAWLER_*` environment variables (`__` as the nesting
    /// separator, e.g. `MENU_CRAWLER_CRAWL__WAIT_TIME=30`).
    pub fn load(profile: SiteProfile, config_file: Option<&Path>) -> Result<Self> {
        let defaults = Self::for_profile(profile);

        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&defaults).context("failed to seed config defaults")?,
        );

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MENU_CRAWLER")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = builder
            .build()
            .context("failed to assemble configuration")?
            .try_deserialize()
            .context("configuration did not match the expected shape")?;

        Ok(loaded)
    }
}
