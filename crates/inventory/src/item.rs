use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmstock_core::{CompanyName, Entity, ItemCode, WarehouseName};

/// One item-default row: the preferred warehouse for an item within a company.
///
/// Rows are kept in their configured order; the resolver walks them first to last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefault {
    /// Company the row applies to. `None` means "any company".
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub default_warehouse: Option<WarehouseName>,
}

/// A trackable good: feed, vaccine, farm input, animal product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub code: ItemCode,
    pub name: String,
    pub stock_uom: String,
    #[serde(default)]
    pub valuation_rate: Option<Decimal>,
    #[serde(default)]
    pub standard_rate: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_stock_item: bool,
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub defaults: Vec<ItemDefault>,
}

fn default_true() -> bool {
    true
}

impl Item {
    pub fn new(code: ItemCode, name: impl Into<String>, stock_uom: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            stock_uom: stock_uom.into(),
            valuation_rate: None,
            standard_rate: None,
            is_stock_item: true,
            company: None,
            defaults: Vec::new(),
        }
    }

    pub fn with_valuation_rate(mut self, rate: Decimal) -> Self {
        self.valuation_rate = Some(rate);
        self
    }

    pub fn with_standard_rate(mut self, rate: Decimal) -> Self {
        self.standard_rate = Some(rate);
        self
    }

    pub fn with_company(mut self, company: CompanyName) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_default(mut self, company: Option<CompanyName>, warehouse: WarehouseName) -> Self {
        self.defaults.push(ItemDefault {
            company,
            default_warehouse: Some(warehouse),
        });
        self
    }

    pub fn non_stock(mut self) -> Self {
        self.is_stock_item = false;
        self
    }

    /// Rate used to value the very first entry of a stream.
    ///
    /// Valuation rate, then standard rate; zero-valued rates count as unset.
    pub fn opening_rate(&self) -> Decimal {
        [self.valuation_rate, self.standard_rate]
            .into_iter()
            .flatten()
            .find(|r| !r.is_zero())
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether a caller-supplied unit differs from the stock unit.
    pub fn uom_differs(&self, uom: Option<&str>) -> bool {
        match uom.map(str::trim) {
            Some(u) if !u.is_empty() => !u.eq_ignore_ascii_case(self.stock_uom.trim()),
            _ => false,
        }
    }
}

impl Entity for Item {
    type Id = ItemCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }
}

/// A price-list row for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPrice {
    pub item_code: ItemCode,
    pub price_list: String,
    pub rate: Decimal,
    pub selling: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
}

/// Latest selling rate among `prices`: most recent `valid_from` first, undated rows last.
///
/// On equal dates the row listed later wins. A non-positive latest rate means
/// no selling price; older rows are not consulted.
pub fn latest_selling_rate<'a>(prices: impl IntoIterator<Item = &'a ItemPrice>) -> Option<Decimal> {
    prices
        .into_iter()
        .filter(|p| p.selling)
        .max_by_key(|p| p.valid_from)
        .map(|p| p.rate)
        .filter(|rate| *rate > Decimal::ZERO)
}
