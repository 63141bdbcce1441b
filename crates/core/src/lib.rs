//! `galley-core`: domain building blocks shared by every crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod page;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{
    InventoryItemId, OrderId, PurchaseId, PurchaseItemId, RecipeId, SupplierId, TransactionId,
    WasteId,
};
pub use page::{Page, Paginated};

/// Round a monetary amount to cents, midpoint away from zero.
pub fn round_money(value: rust_decimal::Decimal) -> rust_decimal::Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
