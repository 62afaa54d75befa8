//! In-memory reconciliation of parent records across asynchronous fan-out
//!
//! Child detail pages complete one by one; the store is the single point
//! that decides when every child of a parent has been observed and the
//! assembled record may be emitted. Completion is explicit counting, never
//! structural matching: callers record a slot for every child they issued,
//! including the ones that timed out and degraded to empty.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors from the assembly store. None of these are recoverable by retry:
/// each one indicates the traversal controller broke the open/record/close
/// protocol and is a programming error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("parent '{key}' is not open")]
    ParentNotOpen { key: String },

    #[error("parent '{key}' is already open")]
    ParentAlreadyOpen { key: String },

    #[error("parent '{key}' was already closed and must never reopen")]
    ParentClosed { key: String },

    #[error("parent '{key}' received more children than expected ({expected})")]
    ChildOverflow { key: String, expected: usize },

    #[error("parent '{key}' snapshot before completion ({received}/{expected})")]
    Incomplete {
        key: String,
        received: usize,
        expected: usize,
    },
}

pub type AssemblyResult<T> = Result<T, AssemblyError>;

#[derive(Debug)]
struct ParentLedger<C> {
    expected: usize,
    received: usize,
    children: Vec<C>,
}

/// Process-lifetime mapping from parent key to its accumulated children and
/// completion counter. Generic over the child record type so both pipelines
/// (product summaries, menu-item detail slots) share the same accounting.
#[derive(Debug)]
pub struct AssemblyStore<C> {
    open: Arc<RwLock<HashMap<String, ParentLedger<C>>>>,
    closed: Arc<RwLock<HashSet<String>>>,
}

impl<C: Clone> Default for AssemblyStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone> AssemblyStore<C> {
    pub fn new() -> Self {
        Self {
            open: Arc::new(RwLock::new(HashMap::new())),
            closed: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Open a parent with the number of child slots the controller issued.
    /// A key may be opened at most once per run; a closed key never reopens.
    pub async fn open(&self, key: &str, expected: usize) -> AssemblyResult<()> {
        if self.closed.read().await.contains(key) {
            return Err(AssemblyError::ParentClosed { key: key.into() });
        }
        let mut open = self.open.write().await;
        if open.contains_key(key) {
            return Err(AssemblyError::ParentAlreadyOpen { key: key.into() });
        }
        debug!(parent = key, expected, "opened parent ledger");
        open.insert(
            key.to_string(),
            ParentLedger {
                expected,
                received: 0,
                children: Vec::with_capacity(expected),
            },
        );
        Ok(())
    }

    /// Record one completed child slot. Returns `true` when this closes the
    /// parent, i.e. every issued slot has now been observed.
    pub async fn record_child(&self, key: &str, child: C) -> AssemblyResult<bool> {
        let mut open = self.open.write().await;
        let ledger = open
            .get_mut(key)
            .ok_or_else(|| AssemblyError::ParentNotOpen { key: key.into() })?;
        if ledger.received >= ledger.expected {
            return Err(AssemblyError::ChildOverflow {
                key: key.into(),
                expected: ledger.expected,
            });
        }
        ledger.children.push(child);
        ledger.received += 1;
        debug!(
            parent = key,
            received = ledger.received,
            expected = ledger.expected,
            "recorded child"
        );
        Ok(ledger.received == ledger.expected)
    }

    /// Whether every issued slot for the parent has been observed. A parent
    /// opened with zero slots is complete immediately.
    pub async fn is_complete(&self, key: &str) -> AssemblyResult<bool> {
        let open = self.open.read().await;
        let ledger = open
            .get(key)
            .ok_or_else(|| AssemblyError::ParentNotOpen { key: key.into() })?;
        Ok(ledger.received == ledger.expected)
    }

    /// Clone out the accumulated children. Guarded: snapshotting an
    /// incomplete parent is a completeness-invariant violation, not a race
    /// to tolerate.
    pub async fn snapshot(&self, key: &str) -> AssemblyResult<Vec<C>> {
        let open = self.open.read().await;
        let ledger = open
            .get(key)
            .ok_or_else(|| AssemblyError::ParentNotOpen { key: key.into() })?;
        if ledger.received != ledger.expected {
            return Err(AssemblyError::Incomplete {
                key: key.into(),
                received: ledger.received,
                expected: ledger.expected,
            });
        }
        Ok(ledger.children.clone())
    }

    /// Free the parent entry. Subsequent opens or records for this key are
    /// rejected: a closed parent must never be re-emitted.
    pub async fn close(&self, key: &str) -> AssemblyResult<()> {
        if self.closed.read().await.contains(key) {
            return Err(AssemblyError::ParentClosed { key: key.into() });
        }
        let removed = self.open.write().await.remove(key);
        if removed.is_none() {
            return Err(AssemblyError::ParentNotOpen { key: key.into() });
        }
        self.closed.write().await.insert(key.to_string());
        debug!(parent = key, "closed parent ledger");
        Ok(())
    }

    /// Keys that were opened but never closed. A non-empty result at the end
    /// of a run is the silent-data-loss bug class this store exists to catch.
    pub async fn dangling_parents(&self) -> Vec<String> {
        self.open.read().await.keys().cloned().collect()
    }
}
