use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{
    AggregateRoot, DomainError, DomainResult, InventoryItemId, PurchaseId, PurchaseItemId,
    SupplierId, round_money,
};

use crate::number::PurchaseNumber;

/// Purchase status lifecycle.
///
/// `pending → ordered → shipped → delivered`, with `cancelled` and `returned`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Ordered,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchaseStatus::Delivered | PurchaseStatus::Cancelled | PurchaseStatus::Returned
        )
    }

    fn rank(self) -> u8 {
        match self {
            PurchaseStatus::Pending => 0,
            PurchaseStatus::Ordered => 1,
            PurchaseStatus::Shipped => 2,
            PurchaseStatus::Delivered
            | PurchaseStatus::Cancelled
            | PurchaseStatus::Returned => 3,
        }
    }

    pub fn can_transition_to(self, next: PurchaseStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Ordered => "ordered",
            PurchaseStatus::Shipped => "shipped",
            PurchaseStatus::Delivered => "delivered",
            PurchaseStatus::Cancelled => "cancelled",
            PurchaseStatus::Returned => "returned",
        }
    }
}

impl core::str::FromStr for PurchaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PurchaseStatus::Pending),
            "ordered" => Ok(PurchaseStatus::Ordered),
            "shipped" => Ok(PurchaseStatus::Shipped),
            "delivered" => Ok(PurchaseStatus::Delivered),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            "returned" => Ok(PurchaseStatus::Returned),
            other => Err(DomainError::validation(format!(
                "unknown purchase status '{other}'"
            ))),
        }
    }
}

/// Purchase line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: PurchaseItemId,
    pub inventory_id: InventoryItemId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// Never exceeds `quantity`.
    pub received_quantity: Decimal,
}

impl PurchaseItem {
    pub fn outstanding(&self) -> Decimal {
        (self.quantity - self.received_quantity).max(Decimal::ZERO)
    }

    pub fn line_total(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseLine {
    pub inventory_id: InventoryItemId,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// Command: CreatePurchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub supplier_id: SupplierId,
    pub items: Vec<NewPurchaseLine>,
    pub order_date: NaiveDate,
    pub expected_delivery: Option<NaiveDate>,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub notes: Option<String>,
}

/// One requested receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveLine {
    pub purchase_item_id: PurchaseItemId,
    pub received_quantity: Decimal,
}

/// A receipt the purchase has agreed to, ready to be booked against stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedReceipt {
    pub purchase_item_id: PurchaseItemId,
    pub inventory_id: InventoryItemId,
    /// Clamped to what is still outstanding on the line.
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// Aggregate root: Purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    purchase_number: PurchaseNumber,
    supplier_id: SupplierId,
    status: PurchaseStatus,
    items: Vec<PurchaseItem>,
    order_date: NaiveDate,
    expected_delivery: Option<NaiveDate>,
    delivery_date: Option<DateTime<Utc>>,
    received_by: Option<String>,
    subtotal: Decimal,
    shipping: Decimal,
    tax: Decimal,
    discount: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Purchase {
    /// Validate `cmd` and compute totals server-side.
    pub fn create(
        id: PurchaseId,
        purchase_number: PurchaseNumber,
        cmd: &NewPurchase,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.items.is_empty() {
            return Err(DomainError::validation("purchase needs at least one item"));
        }
        for (field, value) in [
            ("shipping", cmd.shipping),
            ("tax", cmd.tax),
            ("discount", cmd.discount),
        ] {
            if value < Decimal::ZERO {
                return Err(DomainError::validation(format!("{field} cannot be negative")));
            }
        }
        if let Some(expected) = cmd.expected_delivery {
            if expected < cmd.order_date {
                return Err(DomainError::validation(
                    "expected delivery cannot precede the order date",
                ));
            }
        }

        let mut items = Vec::with_capacity(cmd.items.len());
        for (idx, line) in cmd.items.iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "item {idx}: quantity must be positive"
                )));
            }
            if line.unit_cost < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "item {idx}: unit cost cannot be negative"
                )));
            }
            items.push(PurchaseItem {
                id: PurchaseItemId::new(),
                inventory_id: line.inventory_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                received_quantity: Decimal::ZERO,
            });
        }

        let subtotal = round_money(items.iter().map(PurchaseItem::line_total).sum());
        let total = round_money(subtotal + cmd.shipping + cmd.tax - cmd.discount);
        if total < Decimal::ZERO {
            return Err(DomainError::validation("discount exceeds the purchase value"));
        }

        Ok(Self {
            id,
            purchase_number,
            supplier_id: cmd.supplier_id,
            status: PurchaseStatus::Pending,
            items,
            order_date: cmd.order_date,
            expected_delivery: cmd.expected_delivery,
            delivery_date: None,
            received_by: None,
            subtotal,
            shipping: cmd.shipping,
            tax: cmd.tax,
            discount: cmd.discount,
            total,
            notes: cmd.notes.clone(),
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn purchase_number(&self) -> &PurchaseNumber {
        &self.purchase_number
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn expected_delivery(&self) -> Option<NaiveDate> {
        self.expected_delivery
    }

    pub fn delivery_date(&self) -> Option<DateTime<Utc>> {
        self.delivery_date
    }

    pub fn received_by(&self) -> Option<&str> {
        self.received_by.as_deref()
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn shipping(&self) -> Decimal {
        self.shipping
    }

    pub fn tax(&self) -> Decimal {
        self.tax
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn references_item(&self, item: InventoryItemId) -> bool {
        self.items.iter().any(|l| l.inventory_id == item)
    }

    pub fn is_fully_received(&self) -> bool {
        self.items.iter().all(|l| l.received_quantity >= l.quantity)
    }

    /// Work out what a receipt line may book.
    ///
    /// `Ok(None)` means the line has nothing outstanding and is skipped.
    pub fn plan_receipt(&self, line: &ReceiveLine) -> DomainResult<Option<PlannedReceipt>> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "purchase {} is {} and cannot receive items",
                self.purchase_number,
                self.status.as_str()
            )));
        }
        if line.received_quantity <= Decimal::ZERO {
            return Err(DomainError::validation("received quantity must be positive"));
        }
        let item = self
            .items
            .iter()
            .find(|l| l.id == line.purchase_item_id)
            .ok_or_else(|| DomainError::not_found(format!("purchase item {}", line.purchase_item_id)))?;

        let outstanding = item.outstanding();
        if outstanding <= Decimal::ZERO {
            return Ok(None);
        }
        Ok(Some(PlannedReceipt {
            purchase_item_id: item.id,
            inventory_id: item.inventory_id,
            quantity: line.received_quantity.min(outstanding),
            unit_cost: item.unit_cost,
        }))
    }

    /// Every line's remainder, for the auto-receive pass on direct delivery.
    pub fn outstanding_receipts(&self) -> Vec<PlannedReceipt> {
        self.items
            .iter()
            .filter(|l| l.outstanding() > Decimal::ZERO)
            .map(|l| PlannedReceipt {
                purchase_item_id: l.id,
                inventory_id: l.inventory_id,
                quantity: l.outstanding(),
                unit_cost: l.unit_cost,
            })
            .collect()
    }

    /// Record stock that has been booked for a line.
    pub fn record_receipt(
        &mut self,
        purchase_item_id: PurchaseItemId,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|l| l.id == purchase_item_id)
            .ok_or_else(|| DomainError::not_found(format!("purchase item {purchase_item_id}")))?;
        if quantity > item.outstanding() {
            return Err(DomainError::invariant(format!(
                "receipt of {quantity} exceeds the {} outstanding",
                item.outstanding()
            )));
        }
        item.received_quantity += quantity;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }

    pub fn ensure_transition(&self, next: PurchaseStatus) -> DomainResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "purchase cannot move from {} to {}",
                self.status.as_str(),
                next.as_str()
            )))
        }
    }

    /// Move to `next`. Reaching `delivered` stamps the delivery date
    /// (`delivery_date` or `now`) and requires every line to be received.
    pub fn transition(
        &mut self,
        next: PurchaseStatus,
        delivery_date: Option<DateTime<Utc>>,
        received_by: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_transition(next)?;
        if next == PurchaseStatus::Delivered {
            if !self.is_fully_received() {
                return Err(DomainError::invariant(
                    "purchase cannot be delivered with items outstanding",
                ));
            }
            self.delivery_date = Some(delivery_date.unwrap_or(now));
            if received_by.is_some() {
                self.received_by = received_by;
            }
        }
        self.status = next;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
