use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{OrderId, RecipeId};
use galley_events::Event;

use crate::order::{OrderStatus, OrderType};

/// Facts published by the fulfillment coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KitchenEvent {
    OrderPlaced {
        order_id: OrderId,
        order_type: OrderType,
        table_number: Option<u32>,
        total: Decimal,
        occurred_at: DateTime<Utc>,
    },
    StatusChanged {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        occurred_at: DateTime<Utc>,
    },
    Assigned {
        order_id: OrderId,
        chef: String,
        station: String,
        occurred_at: DateTime<Utc>,
    },
    Unassigned {
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    },
    UrgencyToggled {
        order_id: OrderId,
        urgent: bool,
        occurred_at: DateTime<Utc>,
    },
    /// A recipe ingredient matched no inventory item, so no stock moved for it.
    IngredientUnmatched {
        order_id: OrderId,
        recipe_id: RecipeId,
        ingredient: String,
        quantity: Decimal,
        occurred_at: DateTime<Utc>,
    },
}

impl KitchenEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            KitchenEvent::OrderPlaced { order_id, .. }
            | KitchenEvent::StatusChanged { order_id, .. }
            | KitchenEvent::Assigned { order_id, .. }
            | KitchenEvent::Unassigned { order_id, .. }
            | KitchenEvent::UrgencyToggled { order_id, .. }
            | KitchenEvent::IngredientUnmatched { order_id, .. } => *order_id,
        }
    }
}

impl Event for KitchenEvent {
    fn event_type(&self) -> &'static str {
        match self {
            KitchenEvent::OrderPlaced { .. } => "kitchen.order.placed",
            KitchenEvent::StatusChanged { .. } => "kitchen.order.status_changed",
            KitchenEvent::Assigned { .. } => "kitchen.order.assigned",
            KitchenEvent::Unassigned { .. } => "kitchen.order.unassigned",
            KitchenEvent::UrgencyToggled { .. } => "kitchen.order.urgency_toggled",
            KitchenEvent::IngredientUnmatched { .. } => "kitchen.order.ingredient_unmatched",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            KitchenEvent::OrderPlaced { occurred_at, .. }
            | KitchenEvent::StatusChanged { occurred_at, .. }
            | KitchenEvent::Assigned { occurred_at, .. }
            | KitchenEvent::Unassigned { occurred_at, .. }
            | KitchenEvent::UrgencyToggled { occurred_at, .. }
            | KitchenEvent::IngredientUnmatched { occurred_at, .. } => *occurred_at,
        }
    }
}
