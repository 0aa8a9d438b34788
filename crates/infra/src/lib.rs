//! Infrastructure layer: settings, master data, ledger storage, the posting
//! pipeline, read models and workers.

pub mod catalog;
pub mod config;
pub mod ledger_store;
pub mod locks;
pub mod posting;
pub mod projections;
pub mod read_model;
pub mod reports;
pub mod workers;

pub use catalog::{CatalogSnapshot, InMemoryCatalog};
pub use config::{ConfigError, StockSettings};
pub use ledger_store::{InMemoryLedgerStore, LedgerStore, LedgerStoreError};
pub use posting::{MovementPoster, PostMovement, PostingOutcome, StockPostingService};
