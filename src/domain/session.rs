//! Run-scoped session state
//!
//! One crawl run owns one `RunSession`: counters updated as the traversal
//! progresses and a summary produced at the end. State lives here, not in
//! globals, so multiple runs can coexist and tear down cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    Cancelled,
    Failed,
}

/// Live counters for a single crawl run.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub run_id: String,
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub parents_discovered: u32,
    pub parents_emitted: u32,
    pub products_found: u32,
    pub details_fetched: u32,
    pub duplicates_dropped: u32,
    pub units_skipped: u32,
    pub errors: Vec<String>,
}

impl RunSession {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            seed_url: seed_url.into(),
            started_at: Utc::now(),
            parents_discovered: 0,
            parents_emitted: 0,
            products_found: 0,
            details_fetched: 0,
            duplicates_dropped: 0,
            units_skipped: 0,
            errors: Vec::new(),
        }
    }

    /// Record a recoverable per-unit failure. The unit is skipped, the run
    /// continues; the message is kept for the final summary.
    pub fn record_skip(&mut self, context: &str, error: impl std::fmt::Display) {
        self.units_skipped += 1;
        self.errors.push(format!("{context}: {error}"));
    }

    pub fn finish(self, status: RunStatus) -> RunSummary {
        let completed_at = Utc::now();
        RunSummary {
            run_id: self.run_id,
            seed_url: self.seed_url,
            status,
            parents_discovered: self.parents_discovered,
            parents_emitted: self.parents_emitted,
            products_found: self.products_found,
            details_fetched: self.details_fetched,
            duplicates_dropped: self.duplicates_dropped,
            units_skipped: self.units_skipped,
            error_count: self.errors.len() as u32,
            error_details: if self.errors.is_empty() {
                None
            } else {
                Some(self.errors.join("\n"))
            },
            started_at: self.started_at,
            completed_at,
            execution_time_seconds: (completed_at - self.started_at).num_seconds().max(0) as u32,
        }
    }
}

/// Final result of a crawl run, logged and returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub seed_url: String,
    pub status: RunStatus,
    pub parents_discovered: u32,
    pub parents_emitted: u32,
    pub products_found: u32,
    pub details_fetched: u32,
    pub duplicates_dropped: u32,
    pub units_skipped: u32,
    pub error_count: u32,
    pub error_details: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub execution_time_seconds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_rolls_up_counters_and_errors() {
        let mut session = RunSession::new("https://example.com/food");
        session.parents_discovered = 3;
        session.parents_emitted = 2;
        session.record_skip("detail page 'tacos'", "wait timed out");

        let summary = session.finish(RunStatus::Completed);
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.parents_discovered, 3);
        assert_eq!(summary.units_skipped, 1);
        assert_eq!(summary.error_count, 1);
        assert!(summary.error_details.unwrap().contains("wait timed out"));
    }

    #[test]
    fn clean_run_has_no_error_details() {
        let summary = RunSession::new("https://example.com").finish(RunStatus::Completed);
        assert_eq!(summary.error_count, 0);
        assert!(summary.error_details.is_none());
    }

    #[test]
    fn failed_run_keeps_partial_counters() {
        let mut session = RunSession::new("https://example.com/food");
        session.parents_discovered = 3;
        session.parents_emitted = 1;

        let summary = session.finish(RunStatus::Failed);
        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.parents_emitted, 1);
    }
}
