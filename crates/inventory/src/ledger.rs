//! Stock ledger entries: immutable, time-ordered quantity movements.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmstock_core::{CompanyName, Entity, ItemCode, LedgerEntryId, WarehouseName};

use crate::error::StockError;

/// Key of a ledger stream: one item in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamKey {
    pub item_code: ItemCode,
    pub warehouse: WarehouseName,
}

impl StreamKey {
    pub fn new(item_code: ItemCode, warehouse: WarehouseName) -> Self {
        Self {
            item_code,
            warehouse,
        }
    }
}

impl core::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.item_code, self.warehouse)
    }
}

/// The business document a movement originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRef {
    /// Kind of document, e.g. `"Nourishment Log"`.
    pub voucher_type: String,
    /// Identifier of the document.
    pub voucher_no: String,
    /// Optional finer reference (poultry batch, shed, row).
    #[serde(default)]
    pub voucher_detail_no: Option<String>,
}

impl VoucherRef {
    pub fn new(voucher_type: impl Into<String>, voucher_no: impl Into<String>) -> Self {
        Self {
            voucher_type: voucher_type.into(),
            voucher_no: voucher_no.into(),
            voucher_detail_no: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.voucher_detail_no = detail.filter(|d| !d.trim().is_empty());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StockError> {
        if self.voucher_type.trim().is_empty() {
            return Err(StockError::validation("voucher type cannot be empty"));
        }
        if self.voucher_no.trim().is_empty() {
            return Err(StockError::validation("voucher number cannot be empty"));
        }
        Ok(())
    }
}

/// Lifecycle of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Stored but not confirmed; needs manual reconciliation.
    Draft,
    /// Confirmed and final.
    Submitted,
}

/// One cost layer: `[qty, rate]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Decimal, Decimal)", into = "(Decimal, Decimal)")]
pub struct CostLayer {
    pub qty: Decimal,
    pub rate: Decimal,
}

impl From<(Decimal, Decimal)> for CostLayer {
    fn from((qty, rate): (Decimal, Decimal)) -> Self {
        Self { qty, rate }
    }
}

impl From<CostLayer> for (Decimal, Decimal) {
    fn from(layer: CostLayer) -> Self {
        (layer.qty, layer.rate)
    }
}

/// Serialized cost queue.
///
/// Always collapsed to a single layer (weighted-average carry-forward); the
/// list shape is kept so the stored form reads `[[qty, rate]]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostQueue(Vec<CostLayer>);

impl CostQueue {
    pub fn single(qty: Decimal, rate: Decimal) -> Self {
        Self(vec![CostLayer { qty, rate }])
    }

    pub fn layers(&self) -> &[CostLayer] {
        &self.0
    }
}

/// A stored stock ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub item_code: ItemCode,
    pub warehouse: WarehouseName,
    pub company: Option<CompanyName>,
    pub posting_at: DateTime<Utc>,
    pub fiscal_year: Option<String>,
    pub voucher: VoucherRef,

    /// Signed movement: positive = receipt/production, negative = issue.
    pub actual_qty: Decimal,
    /// Running balance after this entry.
    pub qty_after_transaction: Decimal,
    pub incoming_rate: Decimal,
    pub outgoing_rate: Decimal,
    pub valuation_rate: Decimal,
    /// `valuation_rate × qty_after_transaction`.
    pub stock_value: Decimal,
    /// `valuation_rate × actual_qty`.
    pub stock_value_difference: Decimal,
    pub stock_queue: CostQueue,

    /// Position in the (item, warehouse) stream, 1-based.
    pub sequence: u64,
    pub status: EntryStatus,
}

impl LedgerEntry {
    pub fn stream_key(&self) -> StreamKey {
        StreamKey::new(self.item_code.clone(), self.warehouse.clone())
    }

    pub fn is_submitted(&self) -> bool {
        self.status == EntryStatus::Submitted
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
