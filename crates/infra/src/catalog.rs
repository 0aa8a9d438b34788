//! In-memory master data.
//!
//! Holds items, companies, warehouses, item prices and fiscal years. Loaded
//! once (builder calls or a deserialized [`CatalogSnapshot`]) and read
//! concurrently by postings afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use farmstock_core::{CompanyName, Entity, ItemCode, WarehouseName};
use farmstock_inventory::{
    Company, FiscalYear, Item, ItemPrice, StockCatalog, StockError, Warehouse,
};

/// Serializable form of the catalog, as found in fixture files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub item_prices: Vec<ItemPrice>,
    #[serde(default)]
    pub fiscal_years: Vec<FiscalYear>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: BTreeMap<ItemCode, Item>,
    companies: BTreeMap<CompanyName, Company>,
    /// Listing order is insertion order.
    warehouses: Vec<Warehouse>,
    item_prices: Vec<ItemPrice>,
    fiscal_years: Vec<FiscalYear>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot. Warehouses must name known companies.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, StockError> {
        let mut catalog = Self::new();
        for company in snapshot.companies {
            catalog = catalog.with_company(company);
        }
        for warehouse in snapshot.warehouses {
            if let Some(owner) = &warehouse.company {
                if !catalog.companies.contains_key(owner) {
                    return Err(StockError::validation(format!(
                        "warehouse {} references unknown company {owner}",
                        warehouse.name
                    )));
                }
            }
            catalog = catalog.with_warehouse(warehouse);
        }
        for item in snapshot.items {
            catalog = catalog.with_item(item);
        }
        for price in snapshot.item_prices {
            catalog = catalog.with_item_price(price);
        }
        for year in snapshot.fiscal_years {
            catalog = catalog.with_fiscal_year(year);
        }
        Ok(catalog)
    }

    pub fn with_company(mut self, company: Company) -> Self {
        self.companies.insert(company.id().clone(), company);
        self
    }

    /// Add a warehouse; re-adding a name replaces it in place.
    pub fn with_warehouse(mut self, warehouse: Warehouse) -> Self {
        match self.warehouses.iter_mut().find(|w| w.id() == warehouse.id()) {
            Some(existing) => *existing = warehouse,
            None => self.warehouses.push(warehouse),
        }
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id().clone(), item);
        self
    }

    pub fn with_item_price(mut self, price: ItemPrice) -> Self {
        self.item_prices.push(price);
        self
    }

    pub fn with_fiscal_year(mut self, year: FiscalYear) -> Self {
        self.fiscal_years.push(year);
        self
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

impl StockCatalog for InMemoryCatalog {
    fn item(&self, code: &ItemCode) -> Option<Item> {
        self.items.get(code).cloned()
    }

    fn find_item(&self, identifier: &str) -> Option<Item> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }
        if let Ok(code) = ItemCode::new(identifier) {
            if let Some(item) = self.items.get(&code) {
                return Some(item.clone());
            }
        }
        self.items
            .values()
            .find(|item| item.name == identifier)
            .cloned()
    }

    fn company(&self, name: &CompanyName) -> Option<Company> {
        self.companies.get(name).cloned()
    }

    fn warehouse(&self, name: &WarehouseName) -> Option<Warehouse> {
        self.warehouses.iter().find(|w| &w.name == name).cloned()
    }

    fn warehouses_of(&self, company: &CompanyName) -> Vec<Warehouse> {
        self.warehouses
            .iter()
            .filter(|w| w.company.as_ref() == Some(company))
            .cloned()
            .collect()
    }

    fn item_prices(&self, code: &ItemCode) -> Vec<ItemPrice> {
        self.item_prices
            .iter()
            .filter(|p| &p.item_code == code)
            .cloned()
            .collect()
    }

    fn fiscal_years(&self) -> Vec<FiscalYear> {
        self.fiscal_years.clone()
    }
}
