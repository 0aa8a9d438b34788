use rust_decimal::Decimal;
use thiserror::Error;

use farmstock_inventory::StockError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FarmError {
    #[error("{record} {name}: {field} is required")]
    MissingField {
        record: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("{record} {name}: quantity must be positive, got {qty}")]
    NonPositiveQuantity {
        record: &'static str,
        name: String,
        qty: Decimal,
    },

    #[error(transparent)]
    Stock(#[from] StockError),
}
