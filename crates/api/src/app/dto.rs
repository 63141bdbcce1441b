use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use galley_core::{InventoryItemId, Page, RecipeId, SupplierId};
use galley_inventory::{
    AdjustStock, ItemFilter, ItemSortBy, Reference, ReferenceKind, SortOrder, StockChange,
    StockStatus, TransactionFilter, TransactionType,
};
use galley_kitchen::{Ingredient, KdsSort, OrderStatus, Recipe};
use galley_purchasing::ReceiveLine;

use crate::context::Actor;

/// Alert window used when the caller gives none.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 7;

fn page(page: Option<u32>, per_page: Option<u32>) -> Page {
    Page::new(
        page.unwrap_or(1),
        per_page.unwrap_or(Page::DEFAULT_PER_PAGE),
    )
}

// -------------------------
// Inventory
// -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    Add,
    Subtract,
    Set,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockRequest {
    pub quantity: Decimal,
    pub adjustment_type: AdjustmentType,
    pub reason: Option<String>,
    /// Defaults to `adjustment`; `set` must stay `adjustment`.
    pub transaction_type: Option<TransactionType>,
    pub unit_cost: Option<Decimal>,
}

impl AdjustStockRequest {
    pub fn into_command(
        self,
        item_id: InventoryItemId,
        reference: ReferenceKind,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> AdjustStock {
        let change = match self.adjustment_type {
            AdjustmentType::Add => StockChange::Increase(self.quantity),
            AdjustmentType::Subtract => StockChange::Decrease(self.quantity),
            AdjustmentType::Set => StockChange::Set(self.quantity),
        };
        let kind = self.transaction_type.unwrap_or(TransactionType::Adjustment);
        let mut cmd = AdjustStock::new(item_id, change, kind, now)
            .with_reference(Reference::new(reference, item_id));
        cmd.reason = self.reason;
        cmd.unit_cost = self.unit_cost;
        cmd.performed_by = actor.name();
        cmd
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkAdjustLine {
    pub item_id: InventoryItemId,
    #[serde(flatten)]
    pub adjustment: AdjustStockRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkAdjustRequest {
    pub items: Vec<BulkAdjustLine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub status: Option<StockStatus>,
    pub expiring_within_days: Option<u32>,
    pub sort_by: Option<ItemSortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<ItemListQuery> for ItemFilter {
    fn from(q: ItemListQuery) -> Self {
        ItemFilter {
            search: q.search,
            category: q.category,
            supplier_id: q.supplier_id,
            status: q.status,
            expiring_within_days: q.expiring_within_days,
            sort_by: q.sort_by.unwrap_or_default(),
            sort_order: q.sort_order.unwrap_or_default(),
            page: page(q.page, q.per_page),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<TransactionQuery> for TransactionFilter {
    fn from(q: TransactionQuery) -> Self {
        TransactionFilter {
            kind: q.kind,
            from: q.from,
            to: q.to,
            page: page(q.page, q.per_page),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub days: Option<u32>,
}

// -------------------------
// Purchasing
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ReceiveItemsRequest {
    pub items: Vec<ReceiveLine>,
    pub received_by: Option<String>,
}

// -------------------------
// Kitchen
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub chef: String,
    pub station: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub sort: Option<KdsSort>,
}

#[derive(Debug, Deserialize)]
pub struct RosterMemberRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TableRequest {
    pub table_number: u32,
}

fn active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl RecipeRequest {
    pub fn into_recipe(self, id: RecipeId) -> Recipe {
        Recipe {
            id,
            name: self.name,
            price: self.price,
            is_active: self.is_active,
            ingredients: self.ingredients,
        }
    }
}
