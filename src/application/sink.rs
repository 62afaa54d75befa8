//! Emission sink port
//!
//! Assembled records leave the traversal through this seam. Sinks are
//! append-only; emission order across distinct parents carries no meaning,
//! but a second emission for the same parent key violates the at-most-once
//! contract and is a programming error, not a condition to tolerate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("duplicate emission for parent '{key}'")]
    DuplicateEmission { key: String },

    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Accepts one assembled record at a time, keyed for duplicate detection.
pub trait RecordSink<T>: Send {
    fn emit(&mut self, key: &str, record: &T) -> SinkResult<()>;
}

/// Test/support sink that buffers records in memory.
#[derive(Debug, Default)]
pub struct VecSink<T> {
    pub records: Vec<(String, T)>,
}

impl<T> VecSink<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Clone + Send> RecordSink<T> for VecSink<T> {
    fn emit(&mut self, key: &str, record: &T) -> SinkResult<()> {
        if self.records.iter().any(|(k, _)| k == key) {
            return Err(SinkError::DuplicateEmission { key: key.into() });
        }
        self.records.push((key.to_string(), record.clone()));
        Ok(())
    }
}
