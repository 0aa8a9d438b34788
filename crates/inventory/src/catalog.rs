//! Read-only master data the stock core looks up (never creates).

use std::sync::Arc;

use farmstock_core::{CompanyName, ItemCode, WarehouseName};

use crate::item::{Item, ItemPrice};
use crate::warehouse::{Company, FiscalYear, Warehouse};

/// Lookup surface over items, companies, warehouses, prices and fiscal years.
///
/// Implementations must return listings in a stable order so that resolution
/// stays deterministic for identical data.
pub trait StockCatalog: Send + Sync {
    fn item(&self, code: &ItemCode) -> Option<Item>;

    /// Resolve a free-form identifier: item code first, then item name.
    fn find_item(&self, identifier: &str) -> Option<Item>;

    fn company(&self, name: &CompanyName) -> Option<Company>;

    fn warehouse(&self, name: &WarehouseName) -> Option<Warehouse>;

    /// Warehouses owned by `company`, in listing order.
    fn warehouses_of(&self, company: &CompanyName) -> Vec<Warehouse>;

    fn item_prices(&self, code: &ItemCode) -> Vec<ItemPrice>;

    fn fiscal_years(&self) -> Vec<FiscalYear>;
}

impl<C> StockCatalog for Arc<C>
where
    C: StockCatalog + ?Sized,
{
    fn item(&self, code: &ItemCode) -> Option<Item> {
        (**self).item(code)
    }

    fn find_item(&self, identifier: &str) -> Option<Item> {
        (**self).find_item(identifier)
    }

    fn company(&self, name: &CompanyName) -> Option<Company> {
        (**self).company(name)
    }

    fn warehouse(&self, name: &WarehouseName) -> Option<Warehouse> {
        (**self).warehouse(name)
    }

    fn warehouses_of(&self, company: &CompanyName) -> Vec<Warehouse> {
        (**self).warehouses_of(company)
    }

    fn item_prices(&self, code: &ItemCode) -> Vec<ItemPrice> {
        (**self).item_prices(code)
    }

    fn fiscal_years(&self) -> Vec<FiscalYear> {
        (**self).fiscal_years()
    }
}
