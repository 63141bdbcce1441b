//! Infrastructure layer: owned stores, the services that coordinate stock
//! changes across contexts, and their wiring.

pub mod error;
pub mod fulfillment;
pub mod publisher;
pub mod purchasing;
pub mod recipes;
pub mod services;
pub mod settings;
pub mod stock;
pub mod store;
pub mod waste;

pub use error::{BatchError, BatchOutcome, ServiceError, ServiceResult};
pub use fulfillment::{DeductionOutcome, FulfillmentCoordinator, UnmatchedIngredient};
pub use publisher::{DomainBus, EventPublisher};
pub use purchasing::{
    CreatePurchase, LineItem, PurchaseFilter, PurchaseLineInput, PurchaseService, ReceiptOutcome,
    SetPurchaseStatus,
};
pub use recipes::InMemoryRecipeCatalog;
pub use services::{GalleyConfig, GalleyServices};
pub use settings::{SettingValue, SettingsStore};
pub use stock::{InventoryLookup, MAX_COMMIT_ATTEMPTS, StockService};
pub use waste::WasteService;
