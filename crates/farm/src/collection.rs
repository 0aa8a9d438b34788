//! Animal product collection (milk, eggs, honey).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use farmstock_core::CompanyName;
use farmstock_infra::{MovementPoster, PostMovement};
use farmstock_inventory::VoucherRef;

use crate::{BatchOutcome, FarmError, SkippedRow};

const RECORD: &str = "Product Collection";

/// Where collected products came from. Picks the voucher type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSource {
    Cattle,
    PoultryBatch,
}

impl CollectionSource {
    pub fn voucher_type(self) -> &'static str {
        match self {
            CollectionSource::Cattle => "Cattle",
            CollectionSource::PoultryBatch => "Poultry Batches",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedProduct {
    /// Animal or batch this row belongs to; falls back to the collection's.
    #[serde(default)]
    pub source_name: Option<String>,
    /// Item code or name of the product.
    pub product: String,
    pub qty: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCollection {
    pub source: CollectionSource,
    /// Default animal or batch for rows that name none.
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    pub rows: Vec<CollectedProduct>,
}

/// Post a receipt per product row, vouchered on the animal or batch.
///
/// An empty collection is an error. Row failures are logged and skipped.
pub fn record_collection<P>(poster: &P, collection: &ProductCollection) -> Result<BatchOutcome, FarmError>
where
    P: MovementPoster + ?Sized,
{
    let label = collection.source_name.clone().unwrap_or_default();
    if collection.rows.is_empty() {
        return Err(FarmError::MissingField {
            record: RECORD,
            name: label,
            field: "rows",
        });
    }

    let mut outcome = BatchOutcome::default();
    for (idx, row) in collection.rows.iter().enumerate() {
        let row_no = idx + 1;
        match post_row(poster, collection, row) {
            Ok(posted) => {
                info!(
                    product = %posted.entry.item_code,
                    qty = %posted.entry.actual_qty,
                    voucher_no = %posted.entry.voucher.voucher_no,
                    "product collection posted"
                );
                outcome.posted.push(posted);
            }
            Err(err) => {
                error!(row = row_no, product = %row.product, error = %err, "failed to post collected product; skipping");
                outcome.skipped.push(SkippedRow {
                    row: row_no,
                    item: row.product.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

fn post_row<P>(
    poster: &P,
    collection: &ProductCollection,
    row: &CollectedProduct,
) -> Result<farmstock_infra::PostingOutcome, FarmError>
where
    P: MovementPoster + ?Sized,
{
    let source_name = row
        .source_name
        .as_deref()
        .or(collection.source_name.as_deref())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FarmError::MissingField {
            record: RECORD,
            name: row.product.clone(),
            field: "source_name",
        })?;
    crate::require_text(RECORD, source_name, "product", &row.product)?;
    crate::require_positive(RECORD, source_name, row.qty)?;

    let voucher = VoucherRef::new(collection.source.voucher_type(), source_name);
    let mut request = PostMovement::new(&row.product, row.qty, voucher)
        .for_company(collection.company.clone())
        .with_uom(row.uom.clone());
    request.posting_at = collection.collected_at;

    Ok(poster.post_movement(request)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use farmstock_infra::StockSettings;
    use farmstock_inventory::{GlobalDefaults, RatePolicy};

    use crate::test_support::{co, morning, service, service_with};

    fn product(source: Option<&str>, name: &str, qty: Decimal) -> CollectedProduct {
        CollectedProduct {
            source_name: source.map(str::to_string),
            product: name.to_string(),
            qty,
            uom: None,
        }
    }

    #[test]
    fn rows_post_receipts_per_animal() {
        let service = service();
        let collection = ProductCollection {
            source: CollectionSource::Cattle,
            source_name: Some("COW-0001".to_string()),
            company: None,
            collected_at: Some(morning()),
            rows: vec![
                product(None, "Milk", dec!(12.5)),
                product(Some("COW-0002"), "MILK", dec!(9)),
                product(None, "Milk", dec!(-1)),
            ],
        };

        let outcome = record_collection(&service, &collection).unwrap();

        assert_eq!(outcome.posted.len(), 2);
        assert_eq!(outcome.posted[0].entry.voucher.voucher_type, "Cattle");
        assert_eq!(outcome.posted[0].entry.voucher.voucher_no, "COW-0001");
        assert_eq!(outcome.posted[1].entry.voucher.voucher_no, "COW-0002");
        assert_eq!(outcome.posted[1].entry.qty_after_transaction, dec!(21.5));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row, 3);
    }

    #[test]
    fn selling_price_values_collected_milk() {
        let service = service_with(StockSettings {
            defaults: GlobalDefaults {
                company: Some(co("Savanna Farms")),
                warehouse: None,
            },
            rate_policy: RatePolicy::SellingPrice,
            ..StockSettings::default()
        });
        let collection = ProductCollection {
            source: CollectionSource::PoultryBatch,
            source_name: Some("BATCH-07".to_string()),
            company: None,
            collected_at: Some(morning() + Duration::hours(3)),
            rows: vec![product(None, "MILK", dec!(10)), product(None, "EGGS", dec!(4))],
        };

        let outcome = record_collection(&service, &collection).unwrap();

        let milk = &outcome.posted[0].entry;
        assert_eq!(milk.voucher.voucher_type, "Poultry Batches");
        assert_eq!(milk.valuation_rate, dec!(1.2));
        assert_eq!(milk.stock_value, dec!(12));
        // Eggs have no selling price: carried-forward rate, zero outgoing.
        let eggs = &outcome.posted[1].entry;
        assert_eq!(eggs.valuation_rate, dec!(0));
        assert_eq!(eggs.outgoing_rate, dec!(0));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let service = service();
        let collection = ProductCollection {
            source: CollectionSource::Cattle,
            source_name: Some("COW-0001".to_string()),
            company: None,
            collected_at: None,
            rows: vec![],
        };
        assert!(matches!(
            record_collection(&service, &collection),
            Err(FarmError::MissingField { field: "rows", .. })
        ));
    }
}
