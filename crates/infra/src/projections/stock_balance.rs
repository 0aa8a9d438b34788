//! Stock balance projection.
//!
//! Tracks the current balance of every (item, warehouse) stream from ledger
//! events, along with the drafts still waiting for reconciliation. Safe for
//! at-least-once delivery: postings are applied once per stream sequence.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use farmstock_core::{CompanyName, ItemCode, LedgerEntryId, WarehouseName};
use farmstock_events::EventEnvelope;
use farmstock_inventory::{LedgerEntry, StockLedgerEvent, StreamKey};

use crate::read_model::CompanyStore;

/// Read model: balance of one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockBalance {
    pub item_code: ItemCode,
    pub warehouse: WarehouseName,
    pub company: Option<CompanyName>,
    pub qty: Decimal,
    pub valuation_rate: Decimal,
    pub stock_value: Decimal,
    pub last_sequence: u64,
    pub last_posting_at: DateTime<Utc>,
    /// Stored entries that were not confirmed.
    pub drafts: BTreeSet<LedgerEntryId>,
}

impl StockBalance {
    fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            item_code: entry.item_code.clone(),
            warehouse: entry.warehouse.clone(),
            company: entry.company.clone(),
            qty: entry.qty_after_transaction,
            valuation_rate: entry.valuation_rate,
            stock_value: entry.stock_value,
            last_sequence: entry.sequence,
            last_posting_at: entry.posting_at,
            drafts: BTreeSet::new(),
        }
    }

    fn absorb(&mut self, entry: &LedgerEntry) {
        self.qty = entry.qty_after_transaction;
        self.valuation_rate = entry.valuation_rate;
        self.stock_value = entry.stock_value;
        self.last_sequence = entry.sequence;
        self.last_posting_at = entry.posting_at;
    }
}

/// Totals of one company's balances. Summing combines companies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockBalanceSummary {
    pub streams: usize,
    pub total_value: Decimal,
    pub negative_streams: usize,
    pub unreconciled_drafts: usize,
}

impl std::iter::Sum for StockBalanceSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, s| Self {
            streams: acc.streams + s.streams,
            total_value: acc.total_value + s.total_value,
            negative_streams: acc.negative_streams + s.negative_streams,
            unreconciled_drafts: acc.unreconciled_drafts + s.unreconciled_drafts,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockBalanceError {
    #[error("non-monotonic sequence number on {stream} (last={last}, found={found})")]
    NonMonotonicSequence {
        stream: String,
        last: u64,
        found: u64,
    },
}

#[derive(Debug)]
pub struct StockBalanceProjection<S>
where
    S: CompanyStore<StreamKey, StockBalance>,
{
    store: S,
    /// Last applied posting per stream.
    cursors: RwLock<HashMap<StreamKey, u64>>,
}

impl<S> StockBalanceProjection<S>
where
    S: CompanyStore<StreamKey, StockBalance>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn cursor(&self, key: &StreamKey) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => cursors.get(key).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    fn set_cursor(&self, key: StreamKey, sequence: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(key, sequence);
        }
    }

    pub fn get(&self, company: Option<&CompanyName>, key: &StreamKey) -> Option<StockBalance> {
        self.store.get(company, key)
    }

    pub fn list(&self, company: Option<&CompanyName>) -> Vec<StockBalance> {
        self.store.list(company)
    }

    /// Streams holding entries that still need manual reconciliation.
    pub fn list_unreconciled(&self, company: Option<&CompanyName>) -> Vec<StockBalance> {
        self.store
            .list(company)
            .into_iter()
            .filter(|b| !b.drafts.is_empty())
            .collect()
    }

    pub fn summary(&self, company: Option<&CompanyName>) -> StockBalanceSummary {
        let balances = self.store.list(company);
        StockBalanceSummary {
            streams: balances.len(),
            total_value: balances.iter().map(|b| b.stock_value).sum(),
            negative_streams: balances.iter().filter(|b| b.qty < Decimal::ZERO).count(),
            unreconciled_drafts: balances.iter().map(|b| b.drafts.len()).sum(),
        }
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<StockLedgerEvent>,
    ) -> Result<(), StockBalanceError> {
        let company = envelope.company();

        match envelope.payload() {
            StockLedgerEvent::EntryPosted(posted) => self.apply_posted(&posted.entry),
            StockLedgerEvent::EntryConfirmed(confirmed) => {
                if let Some(mut balance) = self.store.get(company, &confirmed.stream) {
                    if balance.drafts.remove(&confirmed.entry_id) {
                        self.store.upsert(company, confirmed.stream.clone(), balance);
                    }
                }
                Ok(())
            }
            // The entry was recorded as a draft when it was posted.
            StockLedgerEvent::ConfirmationFailed(_) => Ok(()),
        }
    }

    fn apply_posted(&self, entry: &LedgerEntry) -> Result<(), StockBalanceError> {
        let key = entry.stream_key();
        let seq = entry.sequence;
        let last = self.cursor(&key);

        if seq == 0 {
            return Err(StockBalanceError::NonMonotonicSequence {
                stream: key.to_string(),
                last,
                found: seq,
            });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(StockBalanceError::NonMonotonicSequence {
                stream: key.to_string(),
                last,
                found: seq,
            });
        }

        let company = entry.company.as_ref();
        let mut balance = match self.store.get(company, &key) {
            Some(mut existing) => {
                existing.absorb(entry);
                existing
            }
            None => StockBalance::from_entry(entry),
        };
        if !entry.is_submitted() {
            balance.drafts.insert(entry.id);
        }

        self.store.upsert(company, key.clone(), balance);
        self.set_cursor(key, seq);
        Ok(())
    }

    /// Rebuild from stored entries (posting order), discarding current state.
    ///
    /// Entries already submitted in the store do not count as drafts.
    pub fn rebuild_from_entries(
        &self,
        entries: impl IntoIterator<Item = LedgerEntry>,
    ) -> Result<(), StockBalanceError> {
        self.store.clear();
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }

        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.stream_key().cmp(&b.stream_key()).then(a.sequence.cmp(&b.sequence)));

        for entry in &entries {
            self.apply_posted(entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use farmstock_core::EventId;
    use farmstock_inventory::{CostQueue, EntryConfirmed, EntryPosted, EntryStatus, VoucherRef};

    use crate::read_model::InMemoryCompanyStore;

    fn farm() -> CompanyName {
        CompanyName::new("Savanna Farms").unwrap()
    }

    fn entry(sequence: u64, balance: Decimal, status: EntryStatus) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            item_code: ItemCode::new("LAYER-MASH").unwrap(),
            warehouse: WarehouseName::new("Stores - SF").unwrap(),
            company: Some(farm()),
            posting_at: Utc.with_ymd_and_hms(2024, 5, 6, 7, 0, 0).unwrap(),
            fiscal_year: None,
            voucher: VoucherRef::new("Nourishment Log", format!("NL-{sequence}")),
            actual_qty: balance,
            qty_after_transaction: balance,
            incoming_rate: dec!(5),
            outgoing_rate: Decimal::ZERO,
            valuation_rate: dec!(5),
            stock_value: balance * dec!(5),
            stock_value_difference: balance * dec!(5),
            stock_queue: CostQueue::single(balance, dec!(5)),
            sequence,
            status,
        }
    }

    fn posted(entry: &LedgerEntry) -> EventEnvelope<StockLedgerEvent> {
        StockLedgerEvent::EntryPosted(EntryPosted {
            entry: entry.clone(),
        })
        .into_envelope(entry)
    }

    fn projection() -> StockBalanceProjection<Arc<InMemoryCompanyStore<StreamKey, StockBalance>>> {
        StockBalanceProjection::new(Arc::new(InMemoryCompanyStore::new()))
    }

    #[test]
    fn tracks_latest_balance_and_is_idempotent() {
        let proj = projection();
        let first = entry(1, dec!(100), EntryStatus::Draft);
        let second = entry(2, dec!(70), EntryStatus::Draft);

        proj.apply_envelope(&posted(&first)).unwrap();
        proj.apply_envelope(&posted(&second)).unwrap();
        proj.apply_envelope(&posted(&first)).unwrap();

        let balance = proj.get(Some(&farm()), &second.stream_key()).unwrap();
        assert_eq!(balance.qty, dec!(70));
        assert_eq!(balance.stock_value, dec!(350));
        assert_eq!(balance.last_sequence, 2);
    }

    #[test]
    fn confirmation_clears_draft() {
        let proj = projection();
        let e = entry(1, dec!(10), EntryStatus::Draft);
        proj.apply_envelope(&posted(&e)).unwrap();
        assert_eq!(proj.summary(Some(&farm())).unreconciled_drafts, 1);

        let confirmed = EventEnvelope::new(
            EventId::new(),
            Some(farm()),
            e.stream_key().to_string(),
            "stock.ledger.entry_confirmed",
            1,
            StockLedgerEvent::EntryConfirmed(EntryConfirmed {
                entry_id: e.id,
                stream: e.stream_key(),
                occurred_at: Utc::now(),
            }),
        );
        proj.apply_envelope(&confirmed).unwrap();

        assert!(proj.list_unreconciled(Some(&farm())).is_empty());
        assert_eq!(proj.summary(Some(&farm())).streams, 1);
    }

    #[test]
    fn sequence_gap_is_rejected() {
        let proj = projection();
        proj.apply_envelope(&posted(&entry(1, dec!(1), EntryStatus::Draft)))
            .unwrap();
        let err = proj
            .apply_envelope(&posted(&entry(3, dec!(3), EntryStatus::Draft)))
            .unwrap_err();
        assert!(matches!(
            err,
            StockBalanceError::NonMonotonicSequence { last: 1, found: 3, .. }
        ));
    }

    #[test]
    fn rebuild_ignores_submitted_entries_as_drafts() {
        let proj = projection();
        let entries = vec![
            entry(2, dec!(4), EntryStatus::Draft),
            entry(1, dec!(6), EntryStatus::Submitted),
        ];

        proj.rebuild_from_entries(entries).unwrap();

        let summary = proj.summary(Some(&farm()));
        assert_eq!(summary.streams, 1);
        assert_eq!(summary.total_value, dec!(20));
        assert_eq!(summary.unreconciled_drafts, 1);
    }

    #[test]
    fn summaries_add_up_across_companies() {
        let proj = projection();
        let mut dairy = entry(1, dec!(-2), EntryStatus::Draft);
        dairy.company = Some(CompanyName::new("Hill Dairy").unwrap());
        dairy.warehouse = WarehouseName::new("Stores - HD").unwrap();
        proj.apply_envelope(&posted(&entry(1, dec!(10), EntryStatus::Submitted)))
            .unwrap();
        proj.apply_envelope(&posted(&dairy)).unwrap();

        let hill = CompanyName::new("Hill Dairy").unwrap();
        let total: StockBalanceSummary = [Some(farm()), Some(hill)]
            .iter()
            .map(|c| proj.summary(c.as_ref()))
            .sum();

        assert_eq!(total.streams, 2);
        assert_eq!(total.total_value, dec!(40));
        assert_eq!(total.negative_streams, 1);
        assert_eq!(total.unreconciled_drafts, 1);
    }
}
