//! Extraction error types
//!
//! Gaps in optional fields never surface here at all (extractors degrade
//! them to `None` or skip the element). What remains is structural: a
//! selector set that cannot compile or a top-level payload that cannot be
//! parsed, and both are terminal for the run.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractError {
    #[error("invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("top-level payload malformed: {reason}")]
    PayloadMalformed { reason: String },
}

impl ExtractError {
    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn payload_malformed(reason: impl std::fmt::Display) -> Self {
        Self::PayloadMalformed {
            reason: reason.to_string(),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_failing_input() {
        let selector = ExtractError::invalid_selector("((", "parse error");
        assert!(selector.to_string().contains("(("));

        let payload = ExtractError::payload_malformed("expected value at line 1");
        assert!(payload.to_string().contains("expected value"));
    }
}
