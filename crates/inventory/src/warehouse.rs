use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use farmstock_core::{CompanyName, Entity, WarehouseName};

/// Owning unit that scopes warehouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: CompanyName,
    /// Short code used in conventional warehouse names (e.g. `"SF"`).
    pub abbr: String,
}

impl Company {
    pub fn new(name: CompanyName, abbr: impl Into<String>) -> Self {
        Self {
            name,
            abbr: abbr.into(),
        }
    }

    /// The conventional main store for this company: `"Stores - {abbr}"`.
    pub fn conventional_store(&self) -> Option<WarehouseName> {
        let abbr = self.abbr.trim();
        if abbr.is_empty() {
            return None;
        }
        WarehouseName::new(format!("Stores - {abbr}")).ok()
    }
}

impl Entity for Company {
    type Id = CompanyName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// A named storage bucket, optionally owned by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub name: WarehouseName,
    /// `None` means the warehouse is shared across companies.
    #[serde(default)]
    pub company: Option<CompanyName>,
}

impl Warehouse {
    pub fn new(name: WarehouseName, company: Option<CompanyName>) -> Self {
        Self { name, company }
    }

    /// Ownership compatibility with a target company.
    ///
    /// Shared warehouses accept everyone; owned ones accept only their owner.
    pub fn accepts(&self, target: Option<&CompanyName>) -> bool {
        match &self.company {
            None => true,
            Some(owner) => target == Some(owner),
        }
    }
}

impl Entity for Warehouse {
    type Id = WarehouseName;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Fiscal period used to tag ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FiscalYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// First fiscal year (in listing order) whose range contains `date`.
pub fn fiscal_year_for(years: &[FiscalYear], date: NaiveDate) -> Option<&FiscalYear> {
    years.iter().find(|fy| fy.contains(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(name: &str) -> CompanyName {
        CompanyName::new(name).unwrap()
    }

    #[test]
    fn conventional_store_uses_abbreviation() {
        let c = Company::new(company("Savanna Farms"), "SF");
        assert_eq!(c.conventional_store().unwrap().as_str(), "Stores - SF");
        assert!(Company::new(company("Nameless"), " ").conventional_store().is_none());
    }

    #[test]
    fn shared_warehouses_accept_any_target() {
        let wh = Warehouse::new(WarehouseName::new("Main Barn").unwrap(), None);
        assert!(wh.accepts(None));
        assert!(wh.accepts(Some(&company("Acme"))));
    }

    #[test]
    fn owned_warehouses_accept_only_their_owner() {
        let wh = Warehouse::new(WarehouseName::new("Stores - AC").unwrap(), Some(company("Acme")));
        assert!(wh.accepts(Some(&company("Acme"))));
        assert!(!wh.accepts(Some(&company("OtherCo"))));
        assert!(!wh.accepts(None));
    }

    #[test]
    fn fiscal_year_lookup_is_inclusive() {
        let years = vec![FiscalYear {
            name: "2025".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        }];
        let last_day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(fiscal_year_for(&years, last_day).map(|f| f.name.as_str()), Some("2025"));
        assert!(fiscal_year_for(&years, next_day).is_none());
    }
}
