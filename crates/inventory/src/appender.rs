//! Running-balance arithmetic for new ledger entries.
//!
//! Pure functions: callers fetch the latest entry of the stream, hand it in
//! here, and persist what comes back. Valuation is a carried-forward average,
//! never a layer stack.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use farmstock_core::{CompanyName, ItemCode, LedgerEntryId, WarehouseName};

use crate::error::{ConfirmationFailed, StockError};
use crate::item::Item;
use crate::ledger::{CostQueue, EntryStatus, LedgerEntry, VoucherRef};

/// How the valuation rate of a new entry is chosen. One policy for every call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePolicy {
    /// Carry the previous entry's rate forward (opening rate for a first entry).
    #[default]
    CarryForward,
    /// A positive selling price overrides the valuation and outgoing rate.
    SellingPrice,
}

impl core::str::FromStr for RatePolicy {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "carry_forward" => Ok(RatePolicy::CarryForward),
            "selling_price" => Ok(RatePolicy::SellingPrice),
            other => Err(StockError::validation(format!("unknown rate policy '{other}'"))),
        }
    }
}

/// A quantity movement to post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub item_code: ItemCode,
    pub warehouse: WarehouseName,
    /// Signed quantity; zero is rejected.
    pub qty: Decimal,
    pub voucher: VoucherRef,
    pub posting_at: DateTime<Utc>,
}

/// Context resolved by the caller before computing an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingContext {
    /// Company to attribute a first entry to.
    pub company: Option<CompanyName>,
    /// Fiscal year containing the posting date, if one is configured.
    pub fiscal_year: Option<String>,
    pub rate_policy: RatePolicy,
    /// Latest selling price of the item, used by [`RatePolicy::SellingPrice`].
    pub selling_rate: Option<Decimal>,
}

/// Values carried into a new entry.
#[derive(Debug, Clone, PartialEq)]
struct Baseline {
    qty: Decimal,
    valuation_rate: Decimal,
    incoming_rate: Decimal,
    outgoing_rate: Decimal,
    company: Option<CompanyName>,
    fiscal_year: Option<String>,
    sequence: u64,
}

impl Baseline {
    fn carried(previous: &LedgerEntry) -> Self {
        Self {
            qty: previous.qty_after_transaction,
            valuation_rate: previous.valuation_rate,
            incoming_rate: previous.incoming_rate,
            outgoing_rate: previous.outgoing_rate,
            company: previous.company.clone(),
            fiscal_year: previous.fiscal_year.clone(),
            sequence: previous.sequence,
        }
    }

    fn opening(item: &Item, ctx: &PostingContext) -> Self {
        let rate = item.opening_rate();
        Self {
            qty: Decimal::ZERO,
            valuation_rate: rate,
            incoming_rate: rate,
            outgoing_rate: Decimal::ZERO,
            company: ctx.company.clone(),
            fiscal_year: None,
            sequence: 0,
        }
    }
}

/// Item-level checks, run before any warehouse lookup.
pub fn ensure_stock_item(item: &Item) -> Result<(), StockError> {
    if !item.is_stock_item {
        return Err(StockError::validation(format!(
            "item {} is not a stock item",
            item.code
        )));
    }
    Ok(())
}

/// Validate a located movement before its entry is computed.
pub fn validate_movement(item: &Item, movement: &Movement) -> Result<(), StockError> {
    if movement.qty.is_zero() {
        return Err(StockError::validation("quantity is required and must be non-zero"));
    }
    if item.code != movement.item_code {
        return Err(StockError::validation(format!(
            "movement targets item {} but item {} was supplied",
            movement.item_code, item.code
        )));
    }
    ensure_stock_item(item)?;
    movement.voucher.validate()
}

/// Compute the next entry of the stream that `previous` heads (if any).
///
/// The result is a [`EntryStatus::Draft`] with a fresh id; confirmation is a
/// separate step.
pub fn next_entry(
    item: &Item,
    movement: &Movement,
    previous: Option<&LedgerEntry>,
    ctx: &PostingContext,
) -> Result<LedgerEntry, StockError> {
    validate_movement(item, movement)?;

    let baseline = match previous {
        Some(prev) => {
            if prev.item_code != movement.item_code || prev.warehouse != movement.warehouse {
                return Err(StockError::validation(format!(
                    "previous entry belongs to {} not {}@{}",
                    prev.stream_key(),
                    movement.item_code,
                    movement.warehouse
                )));
            }
            if movement.posting_at < prev.posting_at {
                return Err(StockError::validation(format!(
                    "posting time {} precedes the latest entry at {} for {}; back-dated postings are not supported",
                    movement.posting_at,
                    prev.posting_at,
                    prev.stream_key()
                )));
            }
            Baseline::carried(prev)
        }
        None => {
            warn!(
                item = %movement.item_code,
                warehouse = %movement.warehouse,
                "no prior ledger entry; starting from zero balance and opening rate"
            );
            Baseline::opening(item, ctx)
        }
    };

    let (valuation_rate, outgoing_rate) = match ctx.rate_policy {
        RatePolicy::CarryForward => (baseline.valuation_rate, baseline.outgoing_rate),
        RatePolicy::SellingPrice => match ctx.selling_rate.filter(|r| *r > Decimal::ZERO) {
            Some(rate) => (rate, rate),
            None => (baseline.valuation_rate, Decimal::ZERO),
        },
    };

    let overflow = || StockError::validation("quantity or value exceeds decimal range");
    let qty_after = baseline.qty.checked_add(movement.qty).ok_or_else(overflow)?;
    let stock_value = valuation_rate.checked_mul(qty_after).ok_or_else(overflow)?;
    let stock_value_difference = valuation_rate
        .checked_mul(movement.qty)
        .ok_or_else(overflow)?;

    Ok(LedgerEntry {
        id: LedgerEntryId::new(),
        item_code: movement.item_code.clone(),
        warehouse: movement.warehouse.clone(),
        company: baseline.company,
        posting_at: movement.posting_at,
        fiscal_year: ctx.fiscal_year.clone().or(baseline.fiscal_year),
        voucher: movement.voucher.clone(),
        actual_qty: movement.qty,
        qty_after_transaction: qty_after,
        incoming_rate: baseline.incoming_rate,
        outgoing_rate,
        valuation_rate,
        stock_value,
        stock_value_difference,
        stock_queue: CostQueue::single(qty_after, valuation_rate),
        sequence: baseline.sequence + 1,
        status: EntryStatus::Draft,
    })
}

/// Fail unless the stream holds at least `required` units.
pub fn ensure_available(
    item_code: &ItemCode,
    warehouse: &WarehouseName,
    latest: Option<&LedgerEntry>,
    required: Decimal,
) -> Result<Decimal, StockError> {
    let available = latest
        .map(|e| e.qty_after_transaction)
        .unwrap_or(Decimal::ZERO);

    if available < required {
        return Err(StockError::InsufficientStock {
            item: item_code.clone(),
            warehouse: warehouse.clone(),
            requested: required,
            available,
        });
    }
    Ok(available)
}

/// Rules a draft must satisfy to be confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    #[serde(default)]
    pub allow_negative_stock: bool,
    /// Entries posted on or before this date cannot be confirmed.
    #[serde(default)]
    pub stock_frozen_upto: Option<NaiveDate>,
}

impl ConfirmationPolicy {
    pub fn check(&self, entry: &LedgerEntry) -> Result<(), ConfirmationFailed> {
        if let Some(frozen_upto) = self.stock_frozen_upto {
            let posting_date = entry.posting_at.date_naive();
            if posting_date <= frozen_upto {
                return Err(ConfirmationFailed::StockFrozen {
                    frozen_upto,
                    posting_date,
                });
            }
        }
        if !self.allow_negative_stock && entry.qty_after_transaction < Decimal::ZERO {
            return Err(ConfirmationFailed::NegativeStock {
                balance: entry.qty_after_transaction,
            });
        }
        Ok(())
    }
}
