//! Feed issues recorded in nourishment logs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use farmstock_core::CompanyName;
use farmstock_infra::{MovementPoster, PostMovement, PostingOutcome};
use farmstock_inventory::VoucherRef;

use crate::{FarmError, require_positive, require_text};

pub const VOUCHER_TYPE: &str = "Nourishment Log";

/// Feed handed out to a poultry batch, a poultry shed or a cattle shed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NourishmentLog {
    pub name: String,
    /// Item code or name of the feed.
    pub feed_item: String,
    pub qty_issued: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub poultry_batch: Option<String>,
    #[serde(default)]
    pub poultry_shed: Option<String>,
    #[serde(default)]
    pub cattle_shed: Option<String>,
    #[serde(default)]
    pub fed_at: Option<DateTime<Utc>>,
}

impl NourishmentLog {
    /// Voucher detail is the poultry batch, else the poultry shed.
    pub fn voucher(&self) -> VoucherRef {
        VoucherRef::new(VOUCHER_TYPE, &self.name)
            .with_detail(self.poultry_batch.clone().or_else(|| self.poultry_shed.clone()))
    }
}

/// Post the feed issue, refusing to take the feed store below zero.
pub fn issue_feed<P>(poster: &P, log: &NourishmentLog) -> Result<PostingOutcome, FarmError>
where
    P: MovementPoster + ?Sized,
{
    require_text(VOUCHER_TYPE, &log.name, "name", &log.name)?;
    require_text(VOUCHER_TYPE, &log.name, "feed_item", &log.feed_item)?;
    require_positive(VOUCHER_TYPE, &log.name, log.qty_issued)?;

    let mut request = PostMovement::new(&log.feed_item, -log.qty_issued, log.voucher())
        .for_company(log.company.clone())
        .with_uom(log.uom.clone())
        .require_available();
    request.posting_at = log.fed_at;

    let outcome = poster.post_movement(request)?;
    info!(
        log = %log.name,
        feed = %outcome.entry.item_code,
        warehouse = %outcome.entry.warehouse,
        cattle_shed = ?log.cattle_shed,
        remaining = %outcome.entry.qty_after_transaction,
        "feed issued"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use farmstock_infra::LedgerStore;
    use farmstock_inventory::StockError;

    use crate::test_support::{code, morning, service, wh};

    fn log(name: &str, qty: Decimal) -> NourishmentLog {
        NourishmentLog {
            name: name.to_string(),
            feed_item: "Layer Mash".to_string(),
            qty_issued: qty,
            uom: Some("Kg".to_string()),
            company: None,
            poultry_batch: Some("BATCH-07".to_string()),
            poultry_shed: Some("Shed 2".to_string()),
            cattle_shed: None,
            fed_at: Some(morning() + Duration::hours(1)),
        }
    }

    fn stock_feed(service: &crate::test_support::Service, qty: Decimal) {
        service
            .post_movement(
                PostMovement::new("LAYER-MASH", qty, VoucherRef::new("Purchase Receipt", "PR-1"))
                    .at(morning()),
            )
            .unwrap();
    }

    #[test]
    fn issue_posts_negative_qty_to_feed_store() {
        let service = service();
        stock_feed(&service, dec!(100));

        let outcome = issue_feed(&service, &log("NL-0001", dec!(30))).unwrap();

        assert!(outcome.confirmed);
        assert_eq!(outcome.entry.warehouse, wh("Feed Store - SF"));
        assert_eq!(outcome.entry.actual_qty, dec!(-30));
        assert_eq!(outcome.entry.qty_after_transaction, dec!(70));
        assert_eq!(outcome.entry.stock_value, dec!(350));
        assert_eq!(outcome.entry.voucher.voucher_type, VOUCHER_TYPE);
        assert_eq!(outcome.entry.voucher.voucher_detail_no.as_deref(), Some("BATCH-07"));
    }

    #[test]
    fn shed_is_detail_when_no_batch() {
        let mut l = log("NL-0002", dec!(1));
        l.poultry_batch = None;
        assert_eq!(l.voucher().voucher_detail_no.as_deref(), Some("Shed 2"));
    }

    #[test]
    fn insufficient_feed_is_rejected_without_posting() {
        let service = service();
        stock_feed(&service, dec!(10));

        let err = issue_feed(&service, &log("NL-0003", dec!(25))).unwrap_err();
        assert!(matches!(
            err,
            FarmError::Stock(StockError::InsufficientStock { available, .. }) if available == dec!(10)
        ));

        let history = service.ledger().entries_for_item(&code("LAYER-MASH")).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn record_level_validation() {
        let service = service();

        let mut blank = log("NL-0004", dec!(1));
        blank.feed_item = " ".to_string();
        assert!(matches!(
            issue_feed(&service, &blank),
            Err(FarmError::MissingField { field: "feed_item", .. })
        ));

        assert!(matches!(
            issue_feed(&service, &log("NL-0005", dec!(0))),
            Err(FarmError::NonPositiveQuantity { .. })
        ));
    }
}
