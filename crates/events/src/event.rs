use chrono::{DateTime, Utc};

/// A fact about the ledger, published after it is stored.
///
/// Consumers route on `event_type()` and use `version()` to tell payload
/// shapes apart.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `"stock.ledger.entry_posted"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Posting time for postings, wall-clock time for confirmations.
    fn occurred_at(&self) -> DateTime<Utc>;
}
