use std::collections::HashMap;
use std::sync::RwLock;

use farmstock_core::{ExpectedVersion, ItemCode, LedgerEntryId};
use farmstock_inventory::{EntryStatus, LedgerEntry, StreamKey};

use super::{LedgerStore, LedgerStoreError};

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order.
    entries: Vec<LedgerEntry>,
    streams: HashMap<StreamKey, Vec<usize>>,
    by_id: HashMap<LedgerEntryId, usize>,
}

impl Inner {
    fn head(&self, key: &StreamKey) -> Option<&LedgerEntry> {
        self.streams.get(key).and_then(|idx| {
            idx.iter()
                .max_by_key(|i| (self.entries[**i].posting_at, **i))
                .map(|i| &self.entries[*i])
        })
    }

    fn collect_ordered(&self, mut indices: Vec<usize>) -> Vec<LedgerEntry> {
        indices.sort_by_key(|i| (self.entries[*i].posting_at, *i));
        indices.into_iter().map(|i| self.entries[i].clone()).collect()
    }
}

/// In-memory ledger store.
///
/// Intended for tests, fixtures and single-process use.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> LedgerStoreError {
    LedgerStoreError::Unavailable("lock poisoned".to_string())
}

impl LedgerStore for InMemoryLedgerStore {
    fn latest(&self, key: &StreamKey) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.head(key).cloned())
    }

    fn append(
        &self,
        entry: LedgerEntry,
        expected: ExpectedVersion,
    ) -> Result<LedgerEntry, LedgerStoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        if inner.by_id.contains_key(&entry.id) {
            return Err(LedgerStoreError::InvalidAppend(format!(
                "entry {} already stored",
                entry.id
            )));
        }

        let key = entry.stream_key();
        let head = inner.head(&key);
        let current = head.map(|e| e.sequence).unwrap_or(0);

        expected
            .check(current)
            .map_err(|e| LedgerStoreError::Concurrency(format!("stream {key}: {e}")))?;
        if entry.sequence != current + 1 {
            return Err(LedgerStoreError::InvalidAppend(format!(
                "stream {key}: sequence {} does not follow {current}",
                entry.sequence
            )));
        }
        if let Some(head) = head {
            if entry.posting_at < head.posting_at {
                return Err(LedgerStoreError::InvalidAppend(format!(
                    "stream {key}: posting time {} precedes head at {}",
                    entry.posting_at, head.posting_at
                )));
            }
        }

        let idx = inner.entries.len();
        inner.by_id.insert(entry.id, idx);
        inner.streams.entry(key).or_default().push(idx);
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    fn mark_submitted(&self, id: LedgerEntryId) -> Result<LedgerEntry, LedgerStoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let idx = *inner.by_id.get(&id).ok_or(LedgerStoreError::NotFound(id))?;
        let entry = &mut inner.entries[idx];
        entry.status = EntryStatus::Submitted;
        Ok(entry.clone())
    }

    fn get(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.by_id.get(&id).map(|i| inner.entries[*i].clone()))
    }

    fn stream(&self, key: &StreamKey) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let indices = inner.streams.get(key).cloned().unwrap_or_default();
        Ok(inner.collect_ordered(indices))
    }

    fn entries_for_item(&self, item: &ItemCode) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let indices = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.item_code == item)
            .map(|(i, _)| i)
            .collect();
        Ok(inner.collect_ordered(indices))
    }

    fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let indices = (0..inner.entries.len()).collect();
        Ok(inner.collect_ordered(indices))
    }
}
