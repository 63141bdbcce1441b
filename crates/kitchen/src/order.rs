use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{AggregateRoot, DomainError, DomainResult, OrderId, RecipeId};

use crate::notes::OrderNotes;
use crate::pricing::OrderTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeaway => "takeaway",
            OrderType::Delivery => "delivery",
        }
    }
}

/// Kitchen order status. Forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Preparing,
    Ready,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }

    /// Orders in these states count toward a chef's or station's workload.
    pub fn is_in_progress(self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::Preparing)
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Priced order line. Name and price are copied from the recipe at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub recipe_id: RecipeId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub recipe_id: RecipeId,
    pub quantity: u32,
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_type: OrderType,
    pub table_number: Option<u32>,
    pub items: Vec<NewOrderLine>,
    #[serde(default)]
    pub notes: OrderNotes,
    pub customer_name: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("order needs at least one item"));
        }
        if self.items.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation("item quantity must be positive"));
        }
        if self.order_type == OrderType::DineIn && self.table_number.is_none() {
            return Err(DomainError::validation("dine-in orders need a table number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub chef: String,
    pub station: String,
    pub assigned_at: DateTime<Utc>,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_type: OrderType,
    table_number: Option<u32>,
    customer_name: Option<String>,
    items: Vec<OrderLine>,
    status: OrderStatus,
    assignment: Option<Assignment>,
    urgent: bool,
    urgent_time: Option<DateTime<Utc>>,
    notes: OrderNotes,
    totals: OrderTotals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Order {
    /// Place an order from already-priced lines.
    pub fn place(
        id: OrderId,
        cmd: &NewOrder,
        items: Vec<OrderLine>,
        totals: OrderTotals,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        cmd.validate()?;
        if items.len() != cmd.items.len() {
            return Err(DomainError::invariant("priced lines do not match the order"));
        }
        Ok(Self {
            id,
            order_type: cmd.order_type,
            table_number: cmd.table_number,
            customer_name: cmd.customer_name.clone(),
            items,
            status: OrderStatus::New,
            assignment: None,
            urgent: false,
            urgent_time: None,
            notes: cmd.notes.clone(),
            totals,
            created_at: now,
            updated_at: now,
            completed_at: None,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn table_number(&self) -> Option<u32> {
        self.table_number
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    /// Number of lines on the ticket.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn assigned_chef(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.chef.as_str())
    }

    pub fn assigned_station(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.station.as_str())
    }

    pub fn is_urgent(&self) -> bool {
        self.urgent
    }

    pub fn urgent_time(&self) -> Option<DateTime<Utc>> {
        self.urgent_time
    }

    pub fn notes(&self) -> &OrderNotes {
        &self.notes
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    /// Move forward to `next`. Skipping ahead is allowed, going back is not.
    pub fn advance(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if next <= self.status {
            return Err(DomainError::invariant(format!(
                "order cannot move from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        if next == OrderStatus::Completed {
            self.completed_at = Some(now);
        }
        self.touch(now);
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.advance(OrderStatus::Completed, now)
    }

    pub fn assign(
        &mut self,
        chef: impl Into<String>,
        station: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.is_completed() {
            return Err(DomainError::invariant("completed orders cannot be assigned"));
        }
        let chef = chef.into();
        let station = station.into();
        if chef.trim().is_empty() || station.trim().is_empty() {
            return Err(DomainError::validation("chef and station are required"));
        }
        self.assignment = Some(Assignment {
            chef,
            station,
            assigned_at: now,
        });
        self.touch(now);
        Ok(())
    }

    /// Clear chef, station and assignment time together.
    pub fn unassign(&mut self, now: DateTime<Utc>) {
        self.assignment = None;
        self.touch(now);
    }

    /// Flip urgency; returns the new flag. Allowed in every state.
    pub fn toggle_urgent(&mut self, now: DateTime<Utc>) -> bool {
        self.urgent = !self.urgent;
        self.urgent_time = self.urgent.then_some(now);
        self.touch(now);
        self.urgent
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn order_with(
        order_type: OrderType,
        lines: usize,
        created_at: DateTime<Utc>,
    ) -> Order {
        let items: Vec<OrderLine> = (0..lines)
            .map(|i| OrderLine {
                recipe_id: RecipeId::new(),
                name: format!("dish {i}"),
                quantity: 1,
                unit_price: dec!(9.50),
            })
            .collect();
        let cmd = NewOrder {
            order_type,
            table_number: (order_type == OrderType::DineIn).then_some(4),
            items: items
                .iter()
                .map(|l| NewOrderLine {
                    recipe_id: l.recipe_id,
                    quantity: l.quantity,
                })
                .collect(),
            notes: OrderNotes::default(),
            customer_name: None,
        };
        Order::place(OrderId::new(), &cmd, items, OrderTotals::default(), created_at).unwrap()
    }

    #[test]
    fn status_only_moves_forward() {
        let now = Utc::now();
        let mut order = order_with(OrderType::Takeaway, 1, now);
        order.advance(OrderStatus::Preparing, now).unwrap();
        assert!(order.advance(OrderStatus::New, now).is_err());
        assert!(order.advance(OrderStatus::Preparing, now).is_err());

        order.complete(now).unwrap();
        assert_eq!(order.completed_at(), Some(now));
        assert!(order.complete(now).is_err());
    }

    #[test]
    fn urgency_is_orthogonal_to_status() {
        let now = Utc::now();
        let mut order = order_with(OrderType::Takeaway, 1, now);
        order.advance(OrderStatus::Ready, now).unwrap();
        assert!(order.toggle_urgent(now));
        assert_eq!(order.urgent_time(), Some(now));
        assert_eq!(order.status(), OrderStatus::Ready);
        assert!(!order.toggle_urgent(now));
        assert_eq!(order.urgent_time(), None);
    }

    #[test]
    fn unassign_clears_everything() {
        let now = Utc::now();
        let mut order = order_with(OrderType::Delivery, 2, now);
        order.assign("Ana", "grill", now).unwrap();
        assert_eq!(order.assigned_chef(), Some("Ana"));
        assert_eq!(order.assignment().map(|a| a.assigned_at), Some(now));
        order.unassign(now);
        assert!(order.assignment().is_none());
    }

    #[test]
    fn dine_in_needs_a_table() {
        let cmd = NewOrder {
            order_type: OrderType::DineIn,
            table_number: None,
            items: vec![NewOrderLine {
                recipe_id: RecipeId::new(),
                quantity: 1,
            }],
            notes: OrderNotes::default(),
            customer_name: None,
        };
        assert!(matches!(cmd.validate(), Err(DomainError::Validation(_))));
    }
}
