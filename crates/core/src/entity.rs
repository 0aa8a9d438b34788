//! Stable keys of master data and ledger records.

/// A record addressed by a stable key.
///
/// Items are keyed by code, companies and warehouses by name, ledger entries
/// by their id. Stores index on this key.
pub trait Entity {
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
