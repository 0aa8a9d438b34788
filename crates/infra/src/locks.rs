//! Per-key mutual exclusion.
//!
//! Postings to the same (item, warehouse) stream are serialized through one
//! mutex per key; postings to different streams never contend.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per key, created on first use and kept for the life of the map.
///
/// Keys are never evicted, so memory grows with the number of distinct
/// streams ever posted. Item × warehouse sets are bounded master data, which
/// keeps this small; do not key it on unbounded values such as voucher numbers.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The guarded value is `()`, so a poisoned lock carries no broken state
    /// and is simply re-entered.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let handle = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub fn key_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
