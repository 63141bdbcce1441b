//! Wiring: one shared inventory store, supplier directory and event bus
//! behind every service.

use std::sync::Arc;

use rust_decimal::Decimal;

use galley_kitchen::Roster;
use galley_purchasing::Supplier;

use crate::error::ServiceResult;
use crate::fulfillment::FulfillmentCoordinator;
use crate::publisher::{DomainBus, EventPublisher};
use crate::purchasing::PurchaseService;
use crate::recipes::InMemoryRecipeCatalog;
use crate::settings::{DELIVERY_FEE, SettingValue, SettingsStore, TAX_RATE};
use crate::stock::StockService;
use crate::store::{InventoryStore, Repository};
use crate::waste::WasteService;

/// Startup values for pricing and the kitchen roster.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleyConfig {
    /// Percent, e.g. `8.5`.
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
    /// Canonical order; auto-assign breaks ties by position here.
    pub chefs: Vec<String>,
    pub stations: Vec<String>,
    pub tables: Vec<u32>,
}

impl Default for GalleyConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            chefs: vec!["Chef A".into(), "Chef B".into(), "Chef C".into()],
            stations: vec!["Grill".into(), "Saute".into(), "Fry".into(), "Cold".into()],
            tables: (1..=12).collect(),
        }
    }
}

pub struct GalleyServices {
    pub bus: Arc<DomainBus>,
    pub settings: Arc<SettingsStore>,
    pub recipes: Arc<InMemoryRecipeCatalog>,
    pub stock: Arc<StockService>,
    pub purchasing: Arc<PurchaseService>,
    pub waste: Arc<WasteService>,
    pub kitchen: Arc<FulfillmentCoordinator>,
}

impl GalleyServices {
    pub fn new(config: GalleyConfig) -> ServiceResult<Self> {
        let bus = Arc::new(DomainBus::new());
        let events = EventPublisher::new(bus.clone());

        let settings = Arc::new(SettingsStore::new());
        settings.set(TAX_RATE, SettingValue::Number(config.tax_rate))?;
        settings.set(DELIVERY_FEE, SettingValue::Number(config.delivery_fee))?;

        let suppliers: Arc<Repository<Supplier>> = Arc::new(Repository::new("supplier"));
        let stock = Arc::new(StockService::new(
            Arc::new(InventoryStore::new()),
            suppliers.clone(),
            events.clone(),
        ));
        let purchasing = Arc::new(PurchaseService::new(stock.clone(), suppliers));
        let waste = Arc::new(WasteService::new(stock.clone()));

        let recipes = Arc::new(InMemoryRecipeCatalog::new());
        let roster = Roster::new(config.chefs, config.stations, config.tables)?;
        let kitchen = Arc::new(FulfillmentCoordinator::new(
            roster,
            recipes.clone(),
            stock.clone(),
            stock.clone(),
            settings.clone(),
            events,
        ));

        tracing::info!(
            chefs = kitchen.roster()?.chefs().len(),
            stations = kitchen.roster()?.stations().len(),
            "galley services ready"
        );

        Ok(Self {
            bus,
            settings,
            recipes,
            stock,
            purchasing,
            waste,
            kitchen,
        })
    }
}
