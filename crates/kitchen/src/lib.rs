//! Kitchen domain module: order tickets from placement to hand-off.
//!
//! Orders move forward through `new → preparing → ready → completed`, carry
//! an orthogonal urgency flag and a chef/station assignment, and are ranked
//! for the kitchen display by an age-tiered priority score. Everything here
//! is deterministic; the fulfillment coordinator in `galley-infra` owns the
//! storage and the optional stock deduction.

pub mod event;
pub mod notes;
pub mod order;
pub mod pricing;
pub mod priority;
pub mod recipe;
pub mod roster;

pub use event::KitchenEvent;
pub use notes::OrderNotes;
pub use order::{Assignment, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, OrderType};
pub use pricing::{OrderTotals, PricingSettings, price_order};
pub use priority::{BoardEntry, KdsSort, kitchen_board, priority_score, priority_tier};
pub use recipe::{DeductionPlan, Ingredient, IngredientDemand, Recipe, RecipeCatalog, plan_deduction};
pub use roster::{CHEF_CAPACITY, Roster, STATION_CAPACITY, Worker, least_loaded, workload};
