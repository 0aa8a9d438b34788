//! Replay of farm records from a JSON fixture.
//!
//! A fixture carries master data, optional settings and a list of records.
//! Records are posted in order; each one yields a report line, failures included.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use farmstock_core::{CompanyName, ItemCode, WarehouseName};
use farmstock_events::{EventEnvelope, InMemoryEventBus};
use farmstock_infra::projections::{StockBalance, StockBalanceProjection, StockBalanceSummary};
use farmstock_infra::read_model::InMemoryCompanyStore;
use farmstock_infra::reports::{ChartData, weekly_stock_value};
use farmstock_infra::{
    CatalogSnapshot, InMemoryCatalog, InMemoryLedgerStore, LedgerStore, MovementPoster,
    PostMovement, PostingOutcome, StockPostingService, StockSettings,
};
use farmstock_inventory::{StockError, StockLedgerEvent, StreamKey, VoucherRef};

use crate::{
    BatchOutcome, FarmError, FarmOperationLog, NourishmentLog, ProductCollection, SkippedRow,
    TreatmentLog, issue_feed, issue_materials, record_collection, record_treatment_usage,
};

/// A plain movement not tied to a farm record (opening stock, purchases).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMovement {
    pub item: String,
    pub qty: Decimal,
    pub voucher_type: String,
    pub voucher_no: String,
    #[serde(default)]
    pub warehouse: Option<WarehouseName>,
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub posting_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FarmRecord {
    Movement(RawMovement),
    FeedIssue(NourishmentLog),
    Treatment(TreatmentLog),
    Operation(FarmOperationLog),
    Collection(ProductCollection),
}

impl FarmRecord {
    fn label(&self) -> String {
        match self {
            FarmRecord::Movement(m) => format!("movement {}", m.voucher_no),
            FarmRecord::FeedIssue(l) => format!("feed_issue {}", l.name),
            FarmRecord::Treatment(l) => format!("treatment {}", l.name),
            FarmRecord::Operation(l) => format!("operation {}", l.name),
            FarmRecord::Collection(c) => format!(
                "collection {}",
                c.source_name.as_deref().unwrap_or("-")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub settings: Option<StockSettings>,
    #[serde(default)]
    pub catalog: CatalogSnapshot,
    #[serde(default)]
    pub records: Vec<FarmRecord>,
}

impl Fixture {
    /// Settings carried by the fixture; `load` runs only when there are none.
    pub fn settings_or_else<E>(
        &self,
        load: impl FnOnce() -> Result<StockSettings, E>,
    ) -> Result<StockSettings, E> {
        match &self.settings {
            Some(settings) => Ok(settings.clone()),
            None => load(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedView {
    pub entry_id: String,
    pub item_code: String,
    pub warehouse: String,
    pub actual_qty: Decimal,
    pub qty_after_transaction: Decimal,
    pub valuation_rate: Decimal,
    pub stock_value: Decimal,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_error: Option<String>,
}

impl From<&PostingOutcome> for PostedView {
    fn from(outcome: &PostingOutcome) -> Self {
        let e = &outcome.entry;
        Self {
            entry_id: e.id.to_string(),
            item_code: e.item_code.to_string(),
            warehouse: e.warehouse.to_string(),
            actual_qty: e.actual_qty,
            qty_after_transaction: e.qty_after_transaction,
            valuation_rate: e.valuation_rate,
            stock_value: e.stock_value,
            confirmed: outcome.confirmed,
            confirmation_error: outcome.confirmation_error.as_ref().map(|c| c.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub record: String,
    pub posted: Vec<PostedView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub records: Vec<RecordReport>,
    pub balances: Vec<StockBalance>,
    pub summary: StockBalanceSummary,
    /// Weekly stock value of every catalog item that moved.
    pub weekly_value: ChartData,
}

type Service = StockPostingService<
    InMemoryCatalog,
    Arc<InMemoryLedgerStore>,
    Arc<InMemoryEventBus<EventEnvelope<StockLedgerEvent>>>,
>;

/// Post every record of `fixture` against a fresh in-memory ledger.
///
/// `settings` is used as given; see [`Fixture::settings_or_else`]. Fails only
/// on a broken catalog; record failures land in the report.
pub fn run_fixture(fixture: Fixture, settings: StockSettings) -> Result<RunReport, StockError> {
    let catalog = InMemoryCatalog::from_snapshot(fixture.catalog)?;
    let item_codes: Vec<ItemCode> = catalog.items().map(|i| i.code.clone()).collect();
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let service: Service = StockPostingService::new(
        catalog,
        Arc::clone(&ledger),
        Arc::new(InMemoryEventBus::new()),
        settings,
    );

    let records = fixture
        .records
        .iter()
        .map(|record| run_record(&service, record))
        .collect();

    let store: InMemoryCompanyStore<StreamKey, StockBalance> = InMemoryCompanyStore::new();
    let projection = StockBalanceProjection::new(store);
    let entries = ledger.all_entries()?;
    let companies: Vec<Option<CompanyName>> = {
        let mut c: Vec<_> = entries.iter().map(|e| e.company.clone()).collect();
        c.sort();
        c.dedup();
        c
    };
    projection
        .rebuild_from_entries(entries)
        .map_err(|e| StockError::Store(e.to_string()))?;

    let balances: Vec<StockBalance> = companies
        .iter()
        .flat_map(|c| projection.list(c.as_ref()))
        .collect();
    let summary: StockBalanceSummary = companies
        .iter()
        .map(|c| projection.summary(c.as_ref()))
        .sum();

    let weekly_value = weekly_stock_value(ledger.as_ref(), &item_codes)?;

    Ok(RunReport {
        records,
        balances,
        summary,
        weekly_value,
    })
}

fn run_record(service: &Service, record: &FarmRecord) -> RecordReport {
    let label = record.label();
    let result: Result<BatchOutcome, FarmError> = match record {
        FarmRecord::Movement(m) => {
            let mut request = PostMovement::new(
                &m.item,
                m.qty,
                VoucherRef::new(&m.voucher_type, &m.voucher_no),
            )
            .in_warehouse(m.warehouse.clone())
            .for_company(m.company.clone());
            request.posting_at = m.posting_at;
            service.post_movement(request).map(single).map_err(FarmError::from)
        }
        FarmRecord::FeedIssue(log) => issue_feed(service, log).map(single),
        FarmRecord::Treatment(log) => record_treatment_usage(service, log).map(single),
        FarmRecord::Operation(log) => issue_materials(service, log),
        FarmRecord::Collection(c) => record_collection(service, c),
    };

    match result {
        Ok(batch) => RecordReport {
            record: label,
            posted: batch.posted.iter().map(PostedView::from).collect(),
            skipped: batch.skipped,
            error: None,
        },
        Err(err) => {
            warn!(record = %label, error = %err, "record not posted");
            RecordReport {
                record: label,
                posted: vec![],
                skipped: vec![],
                error: Some(err.to_string()),
            }
        }
    }
}

fn single(outcome: PostingOutcome) -> BatchOutcome {
    BatchOutcome {
        posted: vec![outcome],
        skipped: vec![],
    }
}
