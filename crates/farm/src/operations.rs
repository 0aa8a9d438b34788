//! Materials consumed by field operations (spraying, fertilizing, planting).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use farmstock_core::CompanyName;
use farmstock_infra::{MovementPoster, PostMovement};
use farmstock_inventory::VoucherRef;

use crate::{BatchOutcome, FarmError, SkippedRow, require_text};

pub const VOUCHER_TYPE: &str = "Farm Operation Log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    /// Item code or name of the farm input.
    #[serde(default)]
    pub farm_input: String,
    #[serde(default)]
    pub qty_used: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmOperationLog {
    pub name: String,
    #[serde(default)]
    pub company: Option<CompanyName>,
    /// Plot or crop batch the operation ran on.
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub materials: Vec<MaterialRow>,
}

/// Post one issue per material row.
///
/// Rows without an input or with a zero quantity are not postings and are
/// ignored. Rows that fail to post are logged and reported as skipped.
pub fn issue_materials<P>(poster: &P, log: &FarmOperationLog) -> Result<BatchOutcome, FarmError>
where
    P: MovementPoster + ?Sized,
{
    require_text(VOUCHER_TYPE, &log.name, "name", &log.name)?;

    let mut outcome = BatchOutcome::default();
    for (idx, row) in log.materials.iter().enumerate() {
        let row_no = idx + 1;
        if row.farm_input.trim().is_empty() || row.qty_used.is_zero() {
            debug!(log = %log.name, row = row_no, "material row without input or quantity ignored");
            continue;
        }

        let voucher = VoucherRef::new(VOUCHER_TYPE, &log.name).with_detail(log.plot.clone());
        // Quantities are consumption; a negative figure is taken by magnitude.
        let mut request = PostMovement::new(&row.farm_input, -row.qty_used.abs(), voucher)
            .for_company(log.company.clone())
            .with_uom(row.uom.clone());
        request.posting_at = log.performed_at;

        match poster.post_movement(request) {
            Ok(posted) => outcome.posted.push(posted),
            Err(err) => {
                error!(
                    log = %log.name,
                    row = row_no,
                    input = %row.farm_input,
                    error = %err,
                    "failed to post material row; skipping"
                );
                outcome.skipped.push(SkippedRow {
                    row: row_no,
                    item: row.farm_input.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::test_support::{morning, service};

    fn row(input: &str, qty: Decimal, uom: Option<&str>) -> MaterialRow {
        MaterialRow {
            farm_input: input.to_string(),
            qty_used: qty,
            uom: uom.map(str::to_string),
        }
    }

    #[test]
    fn failing_rows_are_skipped_and_the_rest_post() {
        let service = service();
        let log = FarmOperationLog {
            name: "FOL-0001".to_string(),
            company: None,
            plot: Some("Plot A".to_string()),
            performed_at: Some(morning()),
            materials: vec![
                row("UREA", dec!(12), Some("Kg")),
                row("GHOST-INPUT", dec!(3), None),
                row("", dec!(4), None),
                row("Urea", dec!(0), None),
                // Bag is not the stock unit; logged and posted as-is.
                row("Urea", dec!(2), Some("Bag")),
            ],
        };

        let outcome = issue_materials(&service, &log).unwrap();

        assert_eq!(outcome.posted.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row, 2);
        assert_eq!(outcome.skipped[0].item, "GHOST-INPUT");

        let last = &outcome.posted[1].entry;
        assert_eq!(last.actual_qty, dec!(-2));
        assert_eq!(last.qty_after_transaction, dec!(-14));
        assert_eq!(last.valuation_rate, dec!(3));
        assert_eq!(last.voucher.voucher_detail_no.as_deref(), Some("Plot A"));
    }

    #[test]
    fn empty_operation_posts_nothing() {
        let service = service();
        let log = FarmOperationLog {
            name: "FOL-0002".to_string(),
            company: None,
            plot: None,
            performed_at: None,
            materials: vec![],
        };

        let outcome = issue_materials(&service, &log).unwrap();
        assert_eq!(outcome, BatchOutcome::default());
    }
}
