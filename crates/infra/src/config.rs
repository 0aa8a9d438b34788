//! Runtime settings for stock postings.
//!
//! Settings can be deserialized (fixtures, config files) or read from
//! `FARMSTOCK_*` environment variables. Unset variables keep their defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use farmstock_core::{CompanyName, WarehouseName};
use farmstock_inventory::{ConfirmationPolicy, GlobalDefaults, RatePolicy};

pub const ENV_DEFAULT_COMPANY: &str = "FARMSTOCK_DEFAULT_COMPANY";
pub const ENV_DEFAULT_WAREHOUSE: &str = "FARMSTOCK_DEFAULT_WAREHOUSE";
pub const ENV_RATE_POLICY: &str = "FARMSTOCK_RATE_POLICY";
pub const ENV_ALLOW_NEGATIVE_STOCK: &str = "FARMSTOCK_ALLOW_NEGATIVE_STOCK";
pub const ENV_STOCK_FROZEN_UPTO: &str = "FARMSTOCK_STOCK_FROZEN_UPTO";
pub const ENV_MAX_APPEND_RETRIES: &str = "FARMSTOCK_MAX_APPEND_RETRIES";

const DEFAULT_MAX_APPEND_RETRIES: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings consulted by every posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSettings {
    /// Global default company and warehouse used by warehouse resolution.
    #[serde(default)]
    pub defaults: GlobalDefaults,
    #[serde(default)]
    pub rate_policy: RatePolicy,
    #[serde(default)]
    pub confirmation: ConfirmationPolicy,
    /// Extra attempts after an append loses a race on its stream.
    #[serde(default = "default_max_append_retries")]
    pub max_append_retries: u32,
}

fn default_max_append_retries() -> u32 {
    DEFAULT_MAX_APPEND_RETRIES
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            defaults: GlobalDefaults::default(),
            rate_policy: RatePolicy::default(),
            confirmation: ConfirmationPolicy::default(),
            max_append_retries: DEFAULT_MAX_APPEND_RETRIES,
        }
    }
}

impl StockSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup (tests, layered config).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = StockSettings::default();

        if let Some(v) = get(ENV_DEFAULT_COMPANY) {
            settings.defaults.company = Some(parse_code(ENV_DEFAULT_COMPANY, &v, |s| CompanyName::new(s))?);
        }
        if let Some(v) = get(ENV_DEFAULT_WAREHOUSE) {
            settings.defaults.warehouse =
                Some(parse_code(ENV_DEFAULT_WAREHOUSE, &v, |s| WarehouseName::new(s))?);
        }
        if let Some(v) = get(ENV_RATE_POLICY) {
            settings.rate_policy = v.parse().map_err(|e: farmstock_inventory::StockError| {
                invalid(ENV_RATE_POLICY, &v, e.to_string())
            })?;
        }
        if let Some(v) = get(ENV_ALLOW_NEGATIVE_STOCK) {
            settings.confirmation.allow_negative_stock = parse_bool(ENV_ALLOW_NEGATIVE_STOCK, &v)?;
        }
        if let Some(v) = get(ENV_STOCK_FROZEN_UPTO) {
            let date = NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| invalid(ENV_STOCK_FROZEN_UPTO, &v, e.to_string()))?;
            settings.confirmation.stock_frozen_upto = Some(date);
        }
        if let Some(v) = get(ENV_MAX_APPEND_RETRIES) {
            settings.max_append_retries = v
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(ENV_MAX_APPEND_RETRIES, &v, e.to_string()))?;
        }

        if settings.defaults.warehouse.is_none() {
            warn!("{ENV_DEFAULT_WAREHOUSE} not set; resolution relies on item defaults and company stores");
        }

        Ok(settings)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_code<T, E: core::fmt::Display>(
    key: &'static str,
    value: &str,
    ctor: impl Fn(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    ctor(value).map_err(|e| invalid(key, value, e.to_string()))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}
