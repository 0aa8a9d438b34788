//! Farm records that move stock.
//!
//! Each module turns one kind of farm record into ledger postings through a
//! [`MovementPoster`](farmstock_infra::MovementPoster). None of them compute
//! balances themselves.

pub mod collection;
pub mod error;
pub mod fixture;
pub mod nourishment;
pub mod operations;
pub mod treatment;

pub use collection::{CollectedProduct, CollectionSource, ProductCollection, record_collection};
pub use error::FarmError;
pub use fixture::{FarmRecord, Fixture, RunReport, run_fixture};
pub use nourishment::{NourishmentLog, issue_feed};
pub use operations::{FarmOperationLog, MaterialRow, issue_materials};
pub use treatment::{TreatmentLog, record_treatment_usage};

use rust_decimal::Decimal;
use serde::Serialize;

use farmstock_infra::PostingOutcome;

/// Per-row result of a record that posts several movements.
///
/// Failed rows are skipped, the rest still post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub posted: Vec<PostingOutcome>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based row number.
    pub row: usize,
    pub item: String,
    pub reason: String,
}

pub(crate) fn require_text(
    record: &'static str,
    name: &str,
    field: &'static str,
    value: &str,
) -> Result<(), FarmError> {
    if value.trim().is_empty() {
        return Err(FarmError::MissingField {
            record,
            name: name.to_string(),
            field,
        });
    }
    Ok(())
}

pub(crate) fn require_positive(
    record: &'static str,
    name: &str,
    qty: Decimal,
) -> Result<(), FarmError> {
    if qty <= Decimal::ZERO {
        return Err(FarmError::NonPositiveQuantity {
            record,
            name: name.to_string(),
            qty,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support;
