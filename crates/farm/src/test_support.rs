use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use farmstock_core::{CompanyName, ItemCode, WarehouseName};
use farmstock_events::{EventEnvelope, InMemoryEventBus};
use farmstock_infra::{InMemoryCatalog, InMemoryLedgerStore, StockPostingService, StockSettings};
use farmstock_inventory::{Company, GlobalDefaults, Item, ItemPrice, StockLedgerEvent, Warehouse};

pub type Service = StockPostingService<
    InMemoryCatalog,
    Arc<InMemoryLedgerStore>,
    Arc<InMemoryEventBus<EventEnvelope<StockLedgerEvent>>>,
>;

pub fn co(s: &str) -> CompanyName {
    CompanyName::new(s).unwrap()
}

pub fn wh(s: &str) -> WarehouseName {
    WarehouseName::new(s).unwrap()
}

pub fn code(s: &str) -> ItemCode {
    ItemCode::new(s).unwrap()
}

pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap()
}

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_company(Company::new(co("Savanna Farms"), "SF"))
        .with_warehouse(Warehouse::new(wh("Stores - SF"), Some(co("Savanna Farms"))))
        .with_warehouse(Warehouse::new(wh("Feed Store - SF"), Some(co("Savanna Farms"))))
        .with_item(
            Item::new(code("LAYER-MASH"), "Layer Mash", "Kg")
                .with_valuation_rate(dec!(5))
                .with_default(Some(co("Savanna Farms")), wh("Feed Store - SF")),
        )
        .with_item(Item::new(code("NEWCASTLE-VAC"), "Newcastle Vaccine", "Dose").with_valuation_rate(dec!(2)))
        .with_item(Item::new(code("UREA"), "Urea", "Kg").with_standard_rate(dec!(3)))
        .with_item(Item::new(code("MILK"), "Milk", "Litre"))
        .with_item(Item::new(code("EGGS"), "Eggs", "Tray"))
        .with_item_price(ItemPrice {
            item_code: code("MILK"),
            price_list: "Standard Selling".to_string(),
            rate: dec!(1.2),
            selling: true,
            valid_from: None,
        })
}

pub fn service() -> Service {
    service_with(StockSettings {
        defaults: GlobalDefaults {
            company: Some(co("Savanna Farms")),
            warehouse: None,
        },
        ..StockSettings::default()
    })
}

pub fn service_with(settings: StockSettings) -> Service {
    StockPostingService::new(
        catalog(),
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(InMemoryEventBus::new()),
        settings,
    )
}
