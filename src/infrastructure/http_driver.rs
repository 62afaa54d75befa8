//! HTTP fallback implementation of the navigation-driver contract
//!
//! Loads pages as static snapshots over plain HTTP with rate limiting. No
//! script execution: waits are evaluated once against the fetched snapshot,
//! scrolling is a no-op (the document is already complete), and interactive
//! steps (click, back) report an unsupported-step error which the traversal
//! controllers degrade to received-empty. Useful for dry runs, for pages
//! that ship their data server-side, and as the reference implementation of
//! the contract.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info};

use super::driver::{DriverError, DriverResult, PageDriver, WaitCondition};
use super::extract::{compile_selectors, document_has_match};

/// HTTP driver configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HttpDriverConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpDriverConfig {
    fn default() -> Self {
        Self {
            user_agent: "menu-crawler/0.2 (+https://github.com/menu-crawler)".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 4,
            follow_redirects: true,
        }
    }
}

/// Rate-limited static-snapshot driver.
pub struct HttpDriver {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    current_url: Option<String>,
    snapshot: Option<String>,
}

impl HttpDriver {
    pub fn new(config: &HttpDriverConfig) -> DriverResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| DriverError::SessionLost {
                reason: format!("invalid user agent: {e}"),
            })?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| DriverError::SessionLost {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            current_url: None,
            snapshot: None,
        })
    }

    fn condition_holds(&self, condition: &WaitCondition) -> DriverResult<bool> {
        let Some(body) = &self.snapshot else {
            return Ok(false);
        };
        let html = Html::parse_document(body);
        let holds = match condition {
            WaitCondition::ElementPresent(selector) => {
                let compiled = compile_selectors(std::slice::from_ref(selector))
                    .map_err(|e| DriverError::navigation(selector, e))?;
                document_has_match(&html, &compiled)
            }
            WaitCondition::ElementAbsent(selector) => {
                let compiled = compile_selectors(std::slice::from_ref(selector))
                    .map_err(|e| DriverError::navigation(selector, e))?;
                !document_has_match(&html, &compiled)
            }
        };
        Ok(holds)
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn load(&mut self, url: &str) -> DriverResult<()> {
        self.rate_limiter.until_ready().await;
        info!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DriverError::navigation(url, e))?;

        if !response.status().is_success() {
            return Err(DriverError::navigation(
                url,
                format!("HTTP status {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DriverError::navigation(url, e))?;

        debug!(url, bytes = body.len(), "snapshot stored");
        self.current_url = Some(url.to_string());
        self.snapshot = Some(body);
        Ok(())
    }

    /// Static snapshots never change after load, so the predicate is
    /// evaluated once: unmet means it would never become true within any
    /// timeout.
    async fn wait_until(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> DriverResult<()> {
        if self.condition_holds(condition)? {
            Ok(())
        } else {
            Err(DriverError::timeout(condition, timeout))
        }
    }

    async fn page_html(&mut self) -> DriverResult<String> {
        self.snapshot.clone().ok_or_else(|| DriverError::SessionLost {
            reason: "no page loaded".to_string(),
        })
    }

    async fn click(&mut self, _selector: &str, _index: usize) -> DriverResult<()> {
        Err(DriverError::UnsupportedStep { step: "click" })
    }

    async fn scroll_to_bottom(&mut self, _max_rounds: u32, _settle: Duration) -> DriverResult<()> {
        // The full document arrived with the response; nothing to reveal.
        Ok(())
    }

    async fn go_back(&mut self) -> DriverResult<()> {
        Err(DriverError::UnsupportedStep { step: "go_back" })
    }

    async fn shutdown(&mut self) -> DriverResult<()> {
        self.current_url = None;
        self.snapshot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_with_snapshot(body: &str) -> HttpDriver {
        let mut driver = HttpDriver::new(&HttpDriverConfig::default()).unwrap();
        driver.snapshot = Some(body.to_string());
        driver.current_url = Some("https://example.com".to_string());
        driver
    }

    #[tokio::test]
    async fn wait_until_present_resolves_against_snapshot() {
        let mut driver = driver_with_snapshot("<article class='card'>x</article>");
        let present = WaitCondition::ElementPresent("article.card".into());
        assert!(driver
            .wait_until(&present, Duration::from_secs(1))
            .await
            .is_ok());

        let missing = WaitCondition::ElementPresent("div.nope".into());
        let err = driver
            .wait_until(&missing, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Timeout { .. }));
    }

    #[tokio::test]
    async fn interactive_steps_are_unsupported_not_fatal() {
        let mut driver = driver_with_snapshot("<html></html>");
        let click = driver.click("li", 0).await.unwrap_err();
        assert!(!click.is_fatal());
        let back = driver.go_back().await.unwrap_err();
        assert!(!back.is_fatal());
    }

    #[tokio::test]
    async fn page_html_before_load_is_session_error() {
        let mut driver = HttpDriver::new(&HttpDriverConfig::default()).unwrap();
        assert!(driver.page_html().await.unwrap_err().is_fatal());
    }
}
