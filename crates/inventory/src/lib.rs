//! Inventory domain module: item records, the stock ledger and stock alerts.
//!
//! This crate contains business rules only, implemented as deterministic
//! domain logic (no IO, no HTTP, no storage). Stock changes are *planned*
//! here; committing them atomically is the job of the adjustment service in
//! `galley-infra`.

pub mod adjustment;
pub mod alerts;
pub mod event;
pub mod item;
pub mod query;
pub mod transaction;

pub use adjustment::{AdjustStock, AdjustmentResult, StockChange, plan_adjustment};
pub use alerts::{AlertSummary, alert_summary, expired, expiring_soon, low_stock, out_of_stock};
pub use event::InventoryEvent;
pub use item::{InventoryItem, ItemPatch, NewItem};
pub use query::{
    ItemFilter, ItemListing, ItemSortBy, ItemSummary, SortOrder, StockStatus, TransactionFilter,
    filter_transactions, list_items,
};
pub use transaction::{Direction, Reference, ReferenceKind, StockTransaction, TransactionType};
