//! Waste domain module: write-offs of spoiled, damaged or surplus stock.
//!
//! A waste record freezes the item's unit cost at the moment it is recorded.
//! Stock itself is moved by the waste service in `galley-infra`.

pub mod record;

pub use record::{NewWaste, Waste, WasteFilter, WastePatch, WasteReason, cost_total};
