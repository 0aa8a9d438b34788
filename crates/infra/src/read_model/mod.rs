//! Company-partitioned read model storage.

pub mod company_store;

pub use company_store::{CompanyStore, InMemoryCompanyStore};
