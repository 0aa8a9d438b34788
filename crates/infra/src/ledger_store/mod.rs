//! Append-only storage for stock ledger entries.
//!
//! Entries are grouped into streams keyed by (item, warehouse). A stream's
//! version is the sequence number of its newest entry, so appends can be
//! guarded with an [`ExpectedVersion`] the same way an event stream is.

use std::sync::Arc;

use thiserror::Error;

use farmstock_core::{ExpectedVersion, ItemCode, LedgerEntryId};
use farmstock_inventory::{LedgerEntry, StockError, StreamKey};

pub mod in_memory;

pub use in_memory::InMemoryLedgerStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("ledger entry {0} not found")]
    NotFound(LedgerEntryId),

    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerStoreError> for StockError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::Concurrency(msg) => StockError::Conflict(msg),
            other => StockError::Store(other.to_string()),
        }
    }
}

/// Storage contract for ledger entries.
///
/// Implementations must:
/// - never modify an entry after append, except flipping its status to submitted
/// - reject an append whose `expected` version does not match the stream head
/// - require `entry.sequence == head + 1`
/// - return stream reads in posting order (posting time, then insertion order)
pub trait LedgerStore: Send + Sync {
    /// Newest entry of a stream: latest posting time, then latest insertion.
    fn latest(&self, key: &StreamKey) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    fn append(
        &self,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> Result<LedgerEntry, LedgerStoreError>;

    /// Confirm a draft. Confirming an already submitted entry is a no-op.
    fn mark_submitted(&self, id: LedgerEntryId) -> Result<LedgerEntry, LedgerStoreError>;

    fn get(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// All entries of one stream in posting order.
    fn stream(&self, key: &StreamKey) -> Result<Vec<LedgerEntry>, LedgerStoreError>;

    /// All entries of an item across warehouses in posting order.
    fn entries_for_item(&self, item: &ItemCode) -> Result<Vec<LedgerEntry>, LedgerStoreError>;

    /// Every stored entry in posting order (projection rebuilds).
    fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerStoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn latest(&self, key: &StreamKey) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        (**self).latest(key)
    }

    fn append(
        &self,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> Result<LedgerEntry, LedgerStoreError> {
        (**self).append(entry, expected)
    }

    fn mark_submitted(&self, id: LedgerEntryId) -> Result<LedgerEntry, LedgerStoreError> {
        (**self).mark_submitted(id)
    }

    fn get(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        (**self).get(id)
    }

    fn stream(&self, key: &StreamKey) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).stream(key)
    }

    fn entries_for_item(&self, item: &ItemCode) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).entries_for_item(item)
    }

    fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).all_entries()
    }
}
