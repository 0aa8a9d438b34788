//! Read-side stock queries over the ledger store.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use farmstock_core::{ItemCode, WarehouseName};
use farmstock_inventory::{EntryStatus, LedgerEntry, StockError};

use crate::ledger_store::LedgerStore;

/// Balance, value and rate as of the newest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSnapshot {
    pub qty_after_transaction: Decimal,
    pub stock_value: Decimal,
    pub valuation_rate: Decimal,
}

impl StockSnapshot {
    pub fn empty() -> Self {
        Self {
            qty_after_transaction: Decimal::ZERO,
            stock_value: Decimal::ZERO,
            valuation_rate: Decimal::ZERO,
        }
    }

    fn of(entry: &LedgerEntry) -> Self {
        Self {
            qty_after_transaction: entry.qty_after_transaction,
            stock_value: entry.stock_value,
            valuation_rate: entry.valuation_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub posting_at: DateTime<Utc>,
    pub posting_date: NaiveDate,
    pub warehouse: WarehouseName,
    pub actual_qty: Decimal,
    pub qty_after_transaction: Decimal,
    pub stock_value: Decimal,
    pub valuation_rate: Decimal,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockHistory {
    pub item_code: ItemCode,
    /// Oldest first.
    pub entries: Vec<HistoryPoint>,
    /// `None` when the item has never moved.
    pub current: Option<StockSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataset {
    pub name: String,
    pub values: Vec<Decimal>,
}

/// Chart-ready series: one label per week, one dataset per item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Current stock of an item, in one warehouse or across its newest entry anywhere.
pub fn current_stock<L>(
    ledger: &L,
    item: &ItemCode,
    warehouse: Option<&WarehouseName>,
) -> Result<StockSnapshot, StockError>
where
    L: LedgerStore + ?Sized,
{
    let latest = match warehouse {
        Some(wh) => {
            let key = farmstock_inventory::StreamKey::new(item.clone(), wh.clone());
            ledger.latest(&key)?
        }
        None => ledger.entries_for_item(item)?.pop(),
    };
    Ok(latest
        .as_ref()
        .map(StockSnapshot::of)
        .unwrap_or_else(StockSnapshot::empty))
}

pub fn stock_history<L>(ledger: &L, item: &ItemCode) -> Result<StockHistory, StockError>
where
    L: LedgerStore + ?Sized,
{
    let entries = ledger.entries_for_item(item)?;
    let current = entries.last().map(StockSnapshot::of);

    Ok(StockHistory {
        item_code: item.clone(),
        entries: entries
            .iter()
            .map(|e| HistoryPoint {
                posting_at: e.posting_at,
                posting_date: e.posting_at.date_naive(),
                warehouse: e.warehouse.clone(),
                actual_qty: e.actual_qty,
                qty_after_transaction: e.qty_after_transaction,
                stock_value: e.stock_value,
                valuation_rate: e.valuation_rate,
                status: e.status,
            })
            .collect(),
        current,
    })
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Stock value of each item's newest entry, bucketed by the week it was posted in.
///
/// Items without entries are left out. Datasets follow item code order.
pub fn weekly_stock_value<L>(ledger: &L, items: &[ItemCode]) -> Result<ChartData, StockError>
where
    L: LedgerStore + ?Sized,
{
    let mut weekly: BTreeMap<NaiveDate, BTreeMap<&ItemCode, Decimal>> = BTreeMap::new();
    for item in items {
        if let Some(latest) = ledger.entries_for_item(item)?.pop() {
            weekly
                .entry(week_start(latest.posting_at.date_naive()))
                .or_default()
                .insert(item, latest.stock_value);
        }
    }

    if weekly.is_empty() {
        return Ok(ChartData::default());
    }

    let mut products: Vec<&ItemCode> = weekly.values().flat_map(|v| v.keys().copied()).collect();
    products.sort();
    products.dedup();

    let labels = weekly
        .keys()
        .enumerate()
        .map(|(i, start)| {
            let end = *start + Duration::days(6);
            format!(
                "Week {}\n({}-{})",
                i + 1,
                start.format("%d/%m"),
                end.format("%d/%m")
            )
        })
        .collect();

    let datasets = products
        .into_iter()
        .map(|item| ChartDataset {
            name: item.to_string(),
            values: weekly
                .values()
                .map(|week| week.get(item).copied().unwrap_or(Decimal::ZERO))
                .collect(),
        })
        .collect();

    Ok(ChartData { labels, datasets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use farmstock_core::{ExpectedVersion, LedgerEntryId};
    use farmstock_inventory::{CostQueue, VoucherRef};

    use crate::ledger_store::InMemoryLedgerStore;

    fn code(s: &str) -> ItemCode {
        ItemCode::new(s).unwrap()
    }

    fn store_entry(
        store: &InMemoryLedgerStore,
        item: &str,
        sequence: u64,
        at: DateTime<Utc>,
        balance: Decimal,
        rate: Decimal,
    ) {
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            item_code: code(item),
            warehouse: WarehouseName::new("Stores - SF").unwrap(),
            company: None,
            posting_at: at,
            fiscal_year: None,
            voucher: VoucherRef::new("Cattle", format!("C-{sequence}")),
            actual_qty: balance,
            qty_after_transaction: balance,
            incoming_rate: rate,
            outgoing_rate: Decimal::ZERO,
            valuation_rate: rate,
            stock_value: balance * rate,
            stock_value_difference: balance * rate,
            stock_queue: CostQueue::single(balance, rate),
            sequence,
            status: EntryStatus::Submitted,
        };
        store.append(entry, ExpectedVersion::Any).unwrap();
    }

    #[test]
    fn current_stock_of_unmoved_item_is_zero() {
        let store = InMemoryLedgerStore::new();
        let snapshot = current_stock(&store, &code("MILK"), None).unwrap();
        assert_eq!(snapshot, StockSnapshot::empty());
    }

    #[test]
    fn history_is_oldest_first_with_current_snapshot() {
        let store = InMemoryLedgerStore::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 6, 6, 0, 0).unwrap();
        store_entry(&store, "MILK", 1, t, dec!(20), dec!(1));
        store_entry(&store, "MILK", 2, t + Duration::days(1), dec!(35), dec!(1));

        let history = stock_history(&store, &code("MILK")).unwrap();
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].qty_after_transaction, dec!(20));
        assert_eq!(
            history.current.unwrap().qty_after_transaction,
            dec!(35)
        );

        let empty = stock_history(&store, &code("EGGS")).unwrap();
        assert!(empty.entries.is_empty());
        assert!(empty.current.is_none());
    }

    #[test]
    fn week_start_is_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    }

    #[test]
    fn weekly_chart_buckets_latest_values() {
        let store = InMemoryLedgerStore::new();
        // Wednesday 2024-05-08 and Tuesday 2024-05-14.
        let week1 = Utc.with_ymd_and_hms(2024, 5, 8, 9, 0, 0).unwrap();
        let week2 = Utc.with_ymd_and_hms(2024, 5, 14, 9, 0, 0).unwrap();
        store_entry(&store, "MILK", 1, week1, dec!(10), dec!(2));
        store_entry(&store, "EGGS", 1, week2, dec!(30), dec!(0.5));

        let chart = weekly_stock_value(
            &store,
            &[code("MILK"), code("EGGS"), code("HONEY")],
        )
        .unwrap();

        assert_eq!(
            chart.labels,
            vec!["Week 1\n(06/05-12/05)", "Week 2\n(13/05-19/05)"]
        );
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].name, "EGGS");
        assert_eq!(chart.datasets[0].values, vec![dec!(0), dec!(15)]);
        assert_eq!(chart.datasets[1].name, "MILK");
        assert_eq!(chart.datasets[1].values, vec![dec!(20), dec!(0)]);
    }

    #[test]
    fn chart_without_entries_is_empty() {
        let store = InMemoryLedgerStore::new();
        let chart = weekly_stock_value(&store, &[code("MILK")]).unwrap();
        assert_eq!(chart, ChartData::default());
    }
}
