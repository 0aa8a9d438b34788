//! Stock ledger domain: items, warehouses, warehouse resolution and the
//! running-balance arithmetic of ledger entries.
//!
//! Deterministic domain logic only (no IO, no storage). Persistence and
//! serialization of postings live in `farmstock-infra`.

pub mod appender;
pub mod catalog;
pub mod error;
pub mod event;
pub mod item;
pub mod ledger;
pub mod resolver;
pub mod warehouse;

pub use appender::{
    ConfirmationPolicy, Movement, PostingContext, RatePolicy, ensure_available, ensure_stock_item,
    next_entry, validate_movement,
};
pub use catalog::StockCatalog;
pub use error::{ConfirmationFailed, NoLocationFound, Remediation, StockError};
pub use event::{EntryConfirmationFailed, EntryConfirmed, EntryPosted, StockLedgerEvent};
pub use item::{Item, ItemDefault, ItemPrice, latest_selling_rate};
pub use ledger::{CostLayer, CostQueue, EntryStatus, LedgerEntry, StreamKey, VoucherRef};
pub use resolver::{GlobalDefaults, ResolutionSource, ResolvedLocation, WarehouseResolver};
pub use warehouse::{Company, FiscalYear, Warehouse, fiscal_year_for};
