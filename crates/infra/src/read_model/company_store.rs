use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use farmstock_core::CompanyName;

/// Company-partitioned key/value store for disposable read models.
///
/// `None` is the partition for records whose company is unknown.
pub trait CompanyStore<K, V>: Send + Sync {
    fn get(&self, company: Option<&CompanyName>, key: &K) -> Option<V>;
    fn upsert(&self, company: Option<&CompanyName>, key: K, value: V);
    fn list(&self, company: Option<&CompanyName>) -> Vec<V>;
    /// Drop every record (rebuild support).
    fn clear(&self);
}

impl<K, V, S> CompanyStore<K, V> for Arc<S>
where
    S: CompanyStore<K, V> + ?Sized,
{
    fn get(&self, company: Option<&CompanyName>, key: &K) -> Option<V> {
        (**self).get(company, key)
    }

    fn upsert(&self, company: Option<&CompanyName>, key: K, value: V) {
        (**self).upsert(company, key, value)
    }

    fn list(&self, company: Option<&CompanyName>) -> Vec<V> {
        (**self).list(company)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// In-memory company-partitioned store.
#[derive(Debug)]
pub struct InMemoryCompanyStore<K, V> {
    inner: RwLock<HashMap<(Option<CompanyName>, K), V>>,
}

impl<K, V> InMemoryCompanyStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryCompanyStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CompanyStore<K, V> for InMemoryCompanyStore<K, V>
where
    K: Clone + Eq + Hash + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, company: Option<&CompanyName>, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(company.cloned(), key.clone())).cloned()
    }

    fn upsert(&self, company: Option<&CompanyName>, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((company.cloned(), key), value);
        }
    }

    /// Records of one partition, ordered by key.
    fn list(&self, company: Option<&CompanyName>) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut rows: Vec<(&K, &V)> = map
            .iter()
            .filter(|((c, _), _)| c.as_ref() == company)
            .map(|((_, k), v)| (k, v))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows.into_iter().map(|(_, v)| v.clone()).collect()
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}
