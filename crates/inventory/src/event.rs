use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::InventoryItemId;
use galley_events::Event;

use crate::transaction::StockTransaction;

/// Facts published after inventory writes commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryEvent {
    ItemCreated {
        item_id: InventoryItemId,
        name: String,
        occurred_at: DateTime<Utc>,
    },
    ItemUpdated {
        item_id: InventoryItemId,
        occurred_at: DateTime<Utc>,
    },
    ItemDeactivated {
        item_id: InventoryItemId,
        occurred_at: DateTime<Utc>,
    },
    StockAdjusted {
        transaction: StockTransaction,
    },
    /// An adjustment moved the item from above its minimum to at-or-below it.
    LowStockReached {
        item_id: InventoryItemId,
        name: String,
        current_stock: Decimal,
        min_stock: Decimal,
        occurred_at: DateTime<Utc>,
    },
    /// A ledger row was rewritten in place (waste edit).
    LedgerAmended {
        transaction: StockTransaction,
        stock_delta: Decimal,
    },
}

impl InventoryEvent {
    pub fn item_id(&self) -> InventoryItemId {
        match self {
            InventoryEvent::ItemCreated { item_id, .. }
            | InventoryEvent::ItemUpdated { item_id, .. }
            | InventoryEvent::ItemDeactivated { item_id, .. }
            | InventoryEvent::LowStockReached { item_id, .. } => *item_id,
            InventoryEvent::StockAdjusted { transaction }
            | InventoryEvent::LedgerAmended { transaction, .. } => transaction.inventory_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated { .. } => "inventory.item.created",
            InventoryEvent::ItemUpdated { .. } => "inventory.item.updated",
            InventoryEvent::ItemDeactivated { .. } => "inventory.item.deactivated",
            InventoryEvent::StockAdjusted { .. } => "inventory.stock.adjusted",
            InventoryEvent::LowStockReached { .. } => "inventory.stock.low",
            InventoryEvent::LedgerAmended { .. } => "inventory.ledger.amended",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated { occurred_at, .. }
            | InventoryEvent::ItemUpdated { occurred_at, .. }
            | InventoryEvent::ItemDeactivated { occurred_at, .. }
            | InventoryEvent::LowStockReached { occurred_at, .. } => *occurred_at,
            InventoryEvent::StockAdjusted { transaction } => transaction.created_at,
            InventoryEvent::LedgerAmended { transaction, .. } => {
                transaction.amended_at.unwrap_or(transaction.created_at)
            }
        }
    }
}
