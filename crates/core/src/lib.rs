//! `farmstock-core`: identifiers, keys and stream versions shared by the stock crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyName, EventId, ItemCode, LedgerEntryId, WarehouseName};
pub use version::ExpectedVersion;
