//! Events describing what happened to ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use farmstock_core::{EventId, LedgerEntryId};
use farmstock_events::{Event, EventEnvelope};

use crate::ledger::{LedgerEntry, StreamKey};

/// Event: a draft entry was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPosted {
    pub entry: LedgerEntry,
}

/// Event: a stored entry was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfirmed {
    pub entry_id: LedgerEntryId,
    pub stream: StreamKey,
    pub occurred_at: DateTime<Utc>,
}

/// Event: confirmation failed and the entry stays a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfirmationFailed {
    pub entry_id: LedgerEntryId,
    pub stream: StreamKey,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLedgerEvent {
    EntryPosted(EntryPosted),
    EntryConfirmed(EntryConfirmed),
    ConfirmationFailed(EntryConfirmationFailed),
}

impl StockLedgerEvent {
    pub fn entry_id(&self) -> LedgerEntryId {
        match self {
            StockLedgerEvent::EntryPosted(e) => e.entry.id,
            StockLedgerEvent::EntryConfirmed(e) => e.entry_id,
            StockLedgerEvent::ConfirmationFailed(e) => e.entry_id,
        }
    }

    /// Wrap for publication, keyed on the entry's stream and sequence.
    pub fn into_envelope(self, entry: &LedgerEntry) -> EventEnvelope<StockLedgerEvent> {
        EventEnvelope::new(
            EventId::new(),
            entry.company.clone(),
            entry.stream_key().to_string(),
            self.event_type(),
            entry.sequence,
            self,
        )
    }
}

impl Event for StockLedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockLedgerEvent::EntryPosted(_) => "stock.ledger.entry_posted",
            StockLedgerEvent::EntryConfirmed(_) => "stock.ledger.entry_confirmed",
            StockLedgerEvent::ConfirmationFailed(_) => "stock.ledger.confirmation_failed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockLedgerEvent::EntryPosted(e) => e.entry.posting_at,
            StockLedgerEvent::EntryConfirmed(e) => e.occurred_at,
            StockLedgerEvent::ConfirmationFailed(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use farmstock_core::{CompanyName, ItemCode, WarehouseName};

    use crate::ledger::{CostQueue, EntryStatus, VoucherRef};

    fn entry() -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            item_code: ItemCode::new("EGGS").unwrap(),
            warehouse: WarehouseName::new("Stores - SF").unwrap(),
            company: Some(CompanyName::new("Savanna Farms").unwrap()),
            posting_at: Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap(),
            fiscal_year: None,
            voucher: VoucherRef::new("Poultry Batches", "BATCH-07"),
            actual_qty: dec!(30),
            qty_after_transaction: dec!(30),
            incoming_rate: Decimal::ZERO,
            outgoing_rate: Decimal::ZERO,
            valuation_rate: Decimal::ZERO,
            stock_value: Decimal::ZERO,
            stock_value_difference: Decimal::ZERO,
            stock_queue: CostQueue::single(dec!(30), Decimal::ZERO),
            sequence: 4,
            status: EntryStatus::Draft,
        }
    }

    #[test]
    fn envelope_carries_stream_and_sequence() {
        let e = entry();
        let envelope = StockLedgerEvent::EntryPosted(EntryPosted { entry: e.clone() }).into_envelope(&e);

        assert_eq!(envelope.event_type(), "stock.ledger.entry_posted");
        assert_eq!(envelope.stream(), e.stream_key().to_string());
        assert_eq!(envelope.sequence_number(), 4);
        assert_eq!(envelope.company(), e.company.as_ref());
        assert_eq!(envelope.payload().entry_id(), e.id);
    }

    #[test]
    fn posted_events_occur_at_posting_time() {
        let e = entry();
        let posted = StockLedgerEvent::EntryPosted(EntryPosted { entry: e.clone() });
        assert_eq!(posted.occurred_at(), e.posting_at);
        assert_eq!(posted.version(), 1);

        let failed = StockLedgerEvent::ConfirmationFailed(EntryConfirmationFailed {
            entry_id: e.id,
            stream: e.stream_key(),
            reason: "negative stock".to_string(),
            occurred_at: e.posting_at,
        });
        assert_eq!(failed.event_type(), "stock.ledger.confirmation_failed");
    }
}
