//! Warehouse resolution for stock postings.
//!
//! Given an item and an optional owning-unit hint, pick the warehouse a
//! movement should be posted to. The chain is ordered and the first match wins:
//!
//! 1. item-default rows for the target company
//! 2. the company's conventional store, `"Stores - {abbr}"`
//! 3. the global default warehouse
//! 4. the first warehouse owned by the target company
//!
//! Steps 2 and 3 only accept warehouses that are shared or owned by the target.
//! Resolution is read-only; failure is terminal for the posting that needed it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use farmstock_core::{CompanyName, WarehouseName};

use crate::catalog::StockCatalog;
use crate::error::NoLocationFound;
use crate::item::Item;

/// Site-wide defaults consulted when the item and the caller are silent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDefaults {
    #[serde(default)]
    pub company: Option<CompanyName>,
    #[serde(default)]
    pub warehouse: Option<WarehouseName>,
}

/// Which rule of the chain produced the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    ItemDefault,
    ConventionalStore,
    GlobalDefault,
    FirstCompanyWarehouse,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub warehouse: WarehouseName,
    /// Company the resolution was performed for.
    pub company: Option<CompanyName>,
    pub source: ResolutionSource,
}

/// Deterministic warehouse resolver over a catalog.
#[derive(Debug)]
pub struct WarehouseResolver<'a, C: ?Sized> {
    catalog: &'a C,
    defaults: &'a GlobalDefaults,
}

impl<'a, C> WarehouseResolver<'a, C>
where
    C: StockCatalog + ?Sized,
{
    pub fn new(catalog: &'a C, defaults: &'a GlobalDefaults) -> Self {
        Self { catalog, defaults }
    }

    /// Company a posting is attributed to.
    ///
    /// Explicit hint, then the global default company, then the item's own company.
    pub fn target_company(&self, item: &Item, hint: Option<&CompanyName>) -> Option<CompanyName> {
        hint.cloned()
            .or_else(|| self.defaults.company.clone())
            .or_else(|| item.company.clone())
    }

    /// Resolve the warehouse for `item`, optionally scoped by `owning_unit_hint`.
    pub fn resolve_location(
        &self,
        item: &Item,
        owning_unit_hint: Option<&CompanyName>,
    ) -> Result<ResolvedLocation, NoLocationFound> {
        let target = self.target_company(item, owning_unit_hint);
        let found = |warehouse: WarehouseName,
                     source: ResolutionSource|
         -> Result<ResolvedLocation, NoLocationFound> {
            debug!(item = %item.code, warehouse = %warehouse, ?source, "warehouse resolved");
            Ok(ResolvedLocation {
                warehouse,
                company: target.clone(),
                source,
            })
        };

        if let Some(wh) = self.from_item_defaults(item, target.as_ref()) {
            return found(wh, ResolutionSource::ItemDefault);
        }

        if let Some(wh) = self.from_conventional_store(target.as_ref()) {
            return found(wh, ResolutionSource::ConventionalStore);
        }

        if let Some(wh) = self.from_global_default(target.as_ref()) {
            return found(wh, ResolutionSource::GlobalDefault);
        }

        if let Some(company) = target.as_ref() {
            if let Some(first) = self.catalog.warehouses_of(company).into_iter().next() {
                return found(first.name, ResolutionSource::FirstCompanyWarehouse);
            }
        }

        Err(NoLocationFound::new(item.code.clone(), target))
    }

    fn from_item_defaults(&self, item: &Item, target: Option<&CompanyName>) -> Option<WarehouseName> {
        item.defaults
            .iter()
            .filter(|row| match (&row.company, target) {
                (None, _) => true,
                (Some(row_company), Some(t)) => row_company == t,
                (Some(_), None) => false,
            })
            .filter_map(|row| row.default_warehouse.as_ref())
            .find(|name| self.accepted(name, target))
            .cloned()
    }

    fn from_conventional_store(&self, target: Option<&CompanyName>) -> Option<WarehouseName> {
        let company = self.catalog.company(target?)?;
        let name = company.conventional_store()?;
        let warehouse = self.catalog.warehouse(&name)?;

        if warehouse.accepts(target) {
            Some(warehouse.name)
        } else {
            info!(
                warehouse = %name,
                owner = ?warehouse.company,
                expected = %company.name,
                "conventional store belongs to another company; skipping"
            );
            None
        }
    }

    fn from_global_default(&self, target: Option<&CompanyName>) -> Option<WarehouseName> {
        let name = self.defaults.warehouse.as_ref()?;
        self.accepted(name, target).then(|| name.clone())
    }

    /// Warehouse exists and is ownership-compatible with `target`.
    fn accepted(&self, name: &WarehouseName, target: Option<&CompanyName>) -> bool {
        self.catalog
            .warehouse(name)
            .is_some_and(|wh| wh.accepts(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use farmstock_core::ItemCode;

    use crate::error::Remediation;
    use crate::item::ItemPrice;
    use crate::warehouse::{Company, FiscalYear, Warehouse};

    #[derive(Default)]
    struct Fixture {
        companies: BTreeMap<CompanyName, Company>,
        warehouses: Vec<Warehouse>,
    }

    impl Fixture {
        fn company(mut self, name: &str, abbr: &str) -> Self {
            let c = Company::new(co(name), abbr);
            self.companies.insert(c.name.clone(), c);
            self
        }

        fn warehouse(mut self, name: &str, owner: Option<&str>) -> Self {
            self.warehouses.push(Warehouse::new(wh(name), owner.map(co)));
            self
        }
    }

    impl StockCatalog for Fixture {
        fn item(&self, _code: &ItemCode) -> Option<Item> {
            None
        }

        fn find_item(&self, _identifier: &str) -> Option<Item> {
            None
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

        fn item_prices(&self, _code: &ItemCode) -> Vec<ItemPrice> {
            vec![]
        }

        fn fiscal_years(&self) -> Vec<FiscalYear> {
            vec![]
        }
    }

    fn co(s: &str) -> CompanyName {
        CompanyName::new(s).unwrap()
    }

    fn wh(s: &str) -> WarehouseName {
        WarehouseName::new(s).unwrap()
    }

    fn milk() -> Item {
        Item::new(ItemCode::new("MILK").unwrap(), "Milk", "Litre")
    }

    #[test]
    fn item_default_for_matching_company_wins() {
        let catalog = Fixture::default()
            .company("Acme", "AC")
            .warehouse("Dairy Cold Room", Some("Acme"))
            .warehouse("Stores - AC", Some("Acme"));
        let defaults = GlobalDefaults::default();
        let item = milk().with_default(Some(co("Acme")), wh("Dairy Cold Room"));

        let resolved = WarehouseResolver::new(&catalog, &defaults)
            .resolve_location(&item, Some(&co("Acme")))
            .unwrap();

        assert_eq!(resolved.warehouse, wh("Dairy Cold Room"));
        assert_eq!(resolved.source, ResolutionSource::ItemDefault);
        assert_eq!(resolved.company, Some(co("Acme")));
    }

    #[test]
    fn item_default_for_other_company_is_not_found() {
        let catalog = Fixture::default()
            .company("Acme", "AC")
            .company("OtherCo", "OC")
            .warehouse("Dairy Cold Room", Some("Acme"));
        let defaults = GlobalDefaults::default();
        let item = milk().with_default(Some(co("Acme")), wh("Dairy Cold Room"));

        let err = WarehouseResolver::new(&catalog, &defaults)
            .resolve_location(&item, Some(&co("OtherCo")))
            .unwrap_err();

        assert_eq!(err.item.as_str(), "MILK");
        assert_eq!(err.company, Some(co("OtherCo")));
        assert_eq!(err.remediation, Remediation::ALL.to_vec());
    }

    #[test]
    fn default_row_pointing_at_foreign_warehouse_is_skipped() {
        let catalog = Fixture::default()
            .company("Acme", "AC")
            .warehouse("Borrowed Shed", Some("OtherCo"))
            .warehouse("Stores - AC", Some("Acme"));
        let defaults = GlobalDefaults::default();
        let item = milk().with_default(None, wh("Borrowed Shed"));

        let resolved = WarehouseResolver::new(&catalog, &defaults)
            .resolve_location(&item, Some(&co("Acme")))
            .unwrap();

        assert_eq!(resolved.warehouse, wh("Stores - AC"));
        assert_eq!(resolved.source, ResolutionSource::ConventionalStore);
    }

    #[test]
    fn conventional_store_owned_elsewhere_falls_through_to_global_default() {
        let catalog = Fixture::default()
            .company("Acme", "AC")
            .warehouse("Stores - AC", Some("OtherCo"))
            .warehouse("Shared Depot", None);
        let defaults = GlobalDefaults {
            company: None,
            warehouse: Some(wh("Shared Depot")),
        };

        let resolved = WarehouseResolver::new(&catalog, &defaults)
            .resolve_location(&milk(), Some(&co("Acme")))
            .unwrap();

        assert_eq!(resolved.warehouse, wh("Shared Depot"));
        assert_eq!(resolved.source, ResolutionSource::GlobalDefault);
    }

    #[test]
    fn first_company_warehouse_is_last_resort() {
        let catalog = Fixture::default()
            .company("Acme", "AC")
            .warehouse("Feed Loft", Some("Acme"))
            .warehouse("Egg Room", Some("Acme"));
        let defaults = GlobalDefaults::default();

        let resolver = WarehouseResolver::new(&catalog, &defaults);
        let first = resolver.resolve_location(&milk(), Some(&co("Acme"))).unwrap();
        let again = resolver.resolve_location(&milk(), Some(&co("Acme"))).unwrap();

        assert_eq!(first.warehouse, wh("Feed Loft"));
        assert_eq!(first.source, ResolutionSource::FirstCompanyWarehouse);
        assert_eq!(first, again);
    }

    #[test]
    fn target_company_falls_back_to_global_then_item() {
        let catalog = Fixture::default();
        let item = milk().with_company(co("ItemCo"));

        let none = GlobalDefaults::default();
        let resolver = WarehouseResolver::new(&catalog, &none);
        assert_eq!(resolver.target_company(&item, None), Some(co("ItemCo")));
        assert_eq!(resolver.target_company(&item, Some(&co("Hint"))), Some(co("Hint")));

        let global = GlobalDefaults {
            company: Some(co("GlobalCo")),
            warehouse: None,
        };
        let resolver = WarehouseResolver::new(&catalog, &global);
        assert_eq!(resolver.target_company(&item, None), Some(co("GlobalCo")));
    }

    #[test]
    fn nothing_configured_is_an_error_not_none() {
        let catalog = Fixture::default();
        let defaults = GlobalDefaults::default();

        let err = WarehouseResolver::new(&catalog, &defaults)
            .resolve_location(&milk(), None)
            .unwrap_err();

        assert_eq!(err.company, None);
        assert_eq!(err.remediation.len(), 3);
    }
}
