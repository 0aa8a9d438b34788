//! Read models built from ledger events.
//!
//! Projections are rebuildable from the ledger store, partitioned by company,
//! and idempotent under at-least-once delivery.

pub mod stock_balance;

pub use stock_balance::{
    StockBalance, StockBalanceError, StockBalanceProjection, StockBalanceSummary,
};
