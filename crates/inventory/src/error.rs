//! Errors surfaced by stock postings.

use rust_decimal::Decimal;
use thiserror::Error;

use farmstock_core::{CompanyName, DomainError, ItemCode, WarehouseName};

/// Corrective action an operator can take when no warehouse resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Add an item-default row with a default warehouse for the company.
    CreateItemDefault,
    /// Create the conventional `"Stores - {abbr}"` warehouse.
    CreateConventionalStore,
    /// Configure a global default warehouse.
    SetGlobalDefaultWarehouse,
}

impl Remediation {
    pub const ALL: [Remediation; 3] = [
        Remediation::CreateItemDefault,
        Remediation::CreateConventionalStore,
        Remediation::SetGlobalDefaultWarehouse,
    ];
}

impl core::fmt::Display for Remediation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Remediation::CreateItemDefault => f.write_str(
                "create an item default row with a default warehouse for the correct company",
            ),
            Remediation::CreateConventionalStore => f.write_str(
                "create a warehouse named \"Stores - {abbr}\" where {abbr} is the company abbreviation",
            ),
            Remediation::SetGlobalDefaultWarehouse => {
                f.write_str("set a global default warehouse")
            }
        }
    }
}

/// No warehouse could be resolved for an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct NoLocationFound {
    pub item: ItemCode,
    pub company: Option<CompanyName>,
    pub remediation: Vec<Remediation>,
}

impl NoLocationFound {
    pub fn new(item: ItemCode, company: Option<CompanyName>) -> Self {
        Self {
            item,
            company,
            remediation: Remediation::ALL.to_vec(),
        }
    }
}

impl core::fmt::Display for NoLocationFound {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "could not determine a warehouse for item {}", self.item)?;
        if let Some(company) = &self.company {
            write!(f, " (company {company})")?;
        }
        f.write_str("; either:")?;
        for (idx, action) in self.remediation.iter().enumerate() {
            write!(f, " ({}) {action}", idx + 1)?;
        }
        Ok(())
    }
}

/// Posting failure. None of these are retried automatically.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StockError {
    /// Bad caller input: zero quantity, blank identifier, non-stock item.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no item found with code or name '{0}'")]
    ItemNotFound(String),

    #[error(transparent)]
    NoLocationFound(#[from] NoLocationFound),

    #[error(
        "insufficient stock for {item} at {warehouse}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        item: ItemCode,
        warehouse: WarehouseName,
        requested: Decimal,
        available: Decimal,
    },

    /// The stream moved underneath the posting and retries were exhausted.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("ledger store failure: {0}")]
    Store(String),
}

impl StockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for StockError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(msg) => StockError::Conflict(msg),
            other @ DomainError::InvalidId(_) => StockError::Validation(other.to_string()),
        }
    }
}

/// Why a stored draft entry could not be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationFailed {
    #[error("negative stock is not allowed (balance after posting: {balance})")]
    NegativeStock { balance: Decimal },

    #[error("stock is frozen up to {frozen_upto}; posting date {posting_date} is not allowed")]
    StockFrozen {
        frozen_upto: chrono::NaiveDate,
        posting_date: chrono::NaiveDate,
    },

    #[error("ledger store rejected confirmation: {0}")]
    Store(String),
}
