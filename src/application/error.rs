//! Run-level error type for the traversal controllers
//!
//! Wraps the per-layer errors and carries the propagation policy:
//! recoverable failures cost one unit and the run continues; everything
//! else ends the run after the session is released.

use thiserror::Error;

use crate::application::sink::SinkError;
use crate::domain::assembly::AssemblyError;
use crate::infrastructure::driver::DriverError;
use crate::infrastructure::extract::ExtractError;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl CrawlError {
    /// Whether the failure degrades to a skipped unit. Extraction gaps
    /// degrade to `None` inside the extractors before they ever become
    /// errors, so a surfaced extract error is structural; assembly and sink
    /// errors are protocol violations. All three end the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Driver(e) => !e.is_fatal(),
            Self::Extract(_) | Self::Assembly(_) | Self::Sink(_) => false,
        }
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::infrastructure::driver::WaitCondition;

    #[test]
    fn recoverability_follows_layer_classification() {
        let timeout: CrawlError = DriverError::timeout(
            &WaitCondition::ElementPresent("li".into()),
            Duration::from_secs(10),
        )
        .into();
        assert!(timeout.is_recoverable());

        let lost: CrawlError = DriverError::SessionLost {
            reason: "gone".into(),
        }
        .into();
        assert!(!lost.is_recoverable());

        let assembly: CrawlError = AssemblyError::ParentClosed { key: "x".into() }.into();
        assert!(!assembly.is_recoverable());

        let payload: CrawlError = ExtractError::payload_malformed("bad").into();
        assert!(!payload.is_recoverable());
    }
}
