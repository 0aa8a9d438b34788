//! Vaccine and medicine usage from treatment logs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use farmstock_core::CompanyName;
use farmstock_infra::{MovementPoster, PostMovement, PostingOutcome};
use farmstock_inventory::VoucherRef;

use crate::{FarmError, require_positive, require_text};

pub const VOUCHER_TYPE: &str = "Treatment and Vaccination Logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentLog {
    pub name: String,
    /// Item code or name of the vaccine or medicine.
    pub vaccine_item: String,
    pub qty_used: Decimal,
    #[serde(default)]
    pub uom: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub poultry_batch: Option<String>,
    #[serde(default)]
    pub administered_at: Option<DateTime<Utc>>,
}

/// Post the consumed doses. Stock may go negative; that surfaces as an
/// unconfirmed draft rather than a refusal.
pub fn record_treatment_usage<P>(poster: &P, log: &TreatmentLog) -> Result<PostingOutcome, FarmError>
where
    P: MovementPoster + ?Sized,
{
    require_text(VOUCHER_TYPE, &log.name, "name", &log.name)?;
    require_text(VOUCHER_TYPE, &log.name, "vaccine_item", &log.vaccine_item)?;
    require_positive(VOUCHER_TYPE, &log.name, log.qty_used)?;

    let voucher = VoucherRef::new(VOUCHER_TYPE, &log.name).with_detail(log.poultry_batch.clone());
    let mut request = PostMovement::new(&log.vaccine_item, -log.qty_used, voucher)
        .for_company(log.company.clone())
        .with_uom(log.uom.clone());
    request.posting_at = log.administered_at;

    let outcome = poster.post_movement(request)?;
    info!(
        log = %log.name,
        vaccine = %outcome.entry.item_code,
        confirmed = outcome.confirmed,
        "treatment usage posted"
    );
    Ok(outcome)
}
