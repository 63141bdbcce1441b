//! Purchasing domain module: supplier purchases and their receipt lifecycle.
//!
//! This crate contains business rules for purchases, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Turning received
//! quantities into stock is done by the receiving service in `galley-infra`.

pub mod number;
pub mod order;
pub mod supplier;

pub use number::{PurchaseNumber, next_purchase_number};
pub use order::{
    NewPurchase, NewPurchaseLine, PlannedReceipt, Purchase, PurchaseItem, PurchaseStatus,
    ReceiveLine,
};
pub use supplier::{ContactInfo, NewSupplier, Supplier};
