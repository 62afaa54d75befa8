//! Navigation driver contract
//!
//! The browser session is an external collaborator: this module defines the
//! seam the traversal controllers drive it through, nothing more. Element
//! queries and text/attribute reads happen on the HTML snapshot returned by
//! [`PageDriver::page_html`], via the extractors in [`super::extract`];
//! the driver only navigates, waits, clicks and scrolls.
//!
//! The session is NOT reentrant: one navigation or wait may be in flight at
//! a time. Controllers hold the driver by `&mut`, which serializes access by
//! construction.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Predicate a driver waits on before a snapshot is considered ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one element matches the selector.
    ElementPresent(String),
    /// No element matches the selector (e.g. a dismissed dialog).
    ElementAbsent(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementPresent(sel) => write!(f, "present({sel})"),
            Self::ElementAbsent(sel) => write!(f, "absent({sel})"),
        }
    }
}

/// Driver failures, split along the recoverability line: everything except
/// a lost session degrades to a skipped unit, never a dead run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("wait for {condition} timed out after {timeout:?}")]
    Timeout {
        condition: String,
        timeout: Duration,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("step '{step}' is not supported by this driver")]
    UnsupportedStep { step: &'static str },

    #[error("browser session lost: {reason}")]
    SessionLost { reason: String },
}

impl DriverError {
    pub fn timeout(condition: &WaitCondition, timeout: Duration) -> Self {
        Self::Timeout {
            condition: condition.to_string(),
            timeout,
        }
    }

    pub fn navigation(url: &str, reason: impl fmt::Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// A fatal error ends the run; anything else is a per-unit skip.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost { .. })
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Contract for the live browser session.
///
/// `scroll_to_bottom` implementations must be bounded: scroll, wait a fixed
/// settle delay, compare the new scroll extent with the previous one, and
/// stop either when it no longer grows or after `max_rounds` iterations.
/// Sticky/infinite pages must not spin forever.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate the session to `url`.
    async fn load(&mut self, url: &str) -> DriverResult<()>;

    /// Block until `condition` holds, at most `timeout`. Timeout is a
    /// recoverable failure: the caller logs and skips the unit.
    async fn wait_until(&mut self, condition: &WaitCondition, timeout: Duration)
        -> DriverResult<()>;

    /// Snapshot of the current page's HTML for extraction.
    async fn page_html(&mut self) -> DriverResult<String>;

    /// Click the `index`-th element matching `selector`.
    async fn click(&mut self, selector: &str, index: usize) -> DriverResult<()>;

    /// Scroll until the page stops growing, bounded by `max_rounds`.
    async fn scroll_to_bottom(&mut self, max_rounds: u32, settle: Duration) -> DriverResult<()>;

    /// Navigate back in session history.
    async fn go_back(&mut self) -> DriverResult<()>;

    /// Release the underlying session. Must be called on the fatal path
    /// before the error propagates.
    async fn shutdown(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_session_loss_is_fatal() {
        let cond = WaitCondition::ElementPresent("article.card".into());
        assert!(!DriverError::timeout(&cond, Duration::from_secs(15)).is_fatal());
        assert!(!DriverError::navigation("https://x", "dns").is_fatal());
        assert!(!DriverError::UnsupportedStep { step: "click" }.is_fatal());
        assert!(DriverError::SessionLost {
            reason: "disconnected".into()
        }
        .is_fatal());
    }

    #[test]
    fn wait_condition_display() {
        assert_eq!(
            WaitCondition::ElementAbsent("div[role=dialog]".into()).to_string(),
            "absent(div[role=dialog])"
        );
    }
}
