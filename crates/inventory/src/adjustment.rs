//! Pure planning of a single stock adjustment.
//!
//! [`plan_adjustment`] turns "change this item's stock" into the one ledger
//! row that would record it, or refuses. It never mutates anything; the
//! caller commits the row and the item together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{DomainError, DomainResult, InventoryItemId, TransactionId};

use crate::item::InventoryItem;
use crate::transaction::{Direction, Reference, StockTransaction, TransactionType};

/// Requested movement of stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "quantity", rename_all = "lowercase")]
pub enum StockChange {
    Increase(Decimal),
    Decrease(Decimal),
    /// Override stock to an absolute target. Exempt from the insufficient-stock guard.
    Set(Decimal),
}

/// Command: AdjustStock.
///
/// Not idempotent: submitting the same command twice books two rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub item_id: InventoryItemId,
    pub change: StockChange,
    pub kind: TransactionType,
    pub reference: Option<Reference>,
    pub reason: Option<String>,
    /// Overrides the item's current cost for valuation (e.g. purchase line cost).
    pub unit_cost: Option<Decimal>,
    pub performed_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AdjustStock {
    pub fn new(
        item_id: InventoryItemId,
        change: StockChange,
        kind: TransactionType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            change,
            kind,
            reference: None,
            reason: None,
            unit_cost: None,
            performed_by: None,
            occurred_at,
        }
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn performed_by(mut self, who: impl Into<String>) -> Self {
        self.performed_by = Some(who.into());
        self
    }
}

/// Outcome of a committed adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub delta: Decimal,
    pub transaction: StockTransaction,
}

impl From<StockTransaction> for AdjustmentResult {
    fn from(tx: StockTransaction) -> Self {
        Self {
            previous_stock: tx.previous_stock,
            new_stock: tx.new_stock,
            delta: tx.signed_delta(),
            transaction: tx,
        }
    }
}

/// Decide the ledger row for `cmd` against the item's current state.
pub fn plan_adjustment(item: &InventoryItem, cmd: &AdjustStock) -> DomainResult<StockTransaction> {
    if item.id_typed() != cmd.item_id {
        return Err(DomainError::invariant("item_id mismatch"));
    }
    if !item.is_active() {
        return Err(DomainError::validation(format!(
            "item '{}' is inactive",
            item.name()
        )));
    }

    let previous = item.current_stock();
    let (direction, quantity) = match cmd.change {
        StockChange::Increase(q) => {
            ensure_positive(q)?;
            (Direction::In, q)
        }
        StockChange::Decrease(q) => {
            ensure_positive(q)?;
            (Direction::Out, q)
        }
        StockChange::Set(target) => {
            if target < Decimal::ZERO {
                return Err(DomainError::validation("target stock cannot be negative"));
            }
            if cmd.kind != TransactionType::Adjustment {
                return Err(DomainError::validation(
                    "absolute stock overrides must be booked as adjustment",
                ));
            }
            if target >= previous {
                (Direction::In, target - previous)
            } else {
                (Direction::Out, previous - target)
            }
        }
    };

    if let Some(fixed) = cmd.kind.fixed_direction() {
        if fixed != direction {
            return Err(DomainError::validation(format!(
                "{} cannot move stock {}",
                cmd.kind.as_str(),
                match direction {
                    Direction::In => "in",
                    Direction::Out => "out",
                }
            )));
        }
    }

    let new_stock = previous + direction.sign() * quantity;
    if new_stock < Decimal::ZERO {
        return Err(DomainError::insufficient_stock(
            item.name(),
            quantity,
            previous,
        ));
    }

    let unit_cost = cmd.unit_cost.unwrap_or_else(|| item.cost_per_unit());
    if unit_cost < Decimal::ZERO {
        return Err(DomainError::validation("unit_cost cannot be negative"));
    }

    Ok(StockTransaction {
        id: TransactionId::new(),
        inventory_id: cmd.item_id,
        kind: cmd.kind,
        direction,
        quantity,
        previous_stock: previous,
        new_stock,
        reference: cmd.reference.clone(),
        unit_cost,
        total_value: quantity * unit_cost,
        reason: cmd.reason.clone(),
        performed_by: cmd.performed_by.clone(),
        created_at: cmd.occurred_at,
        amended_at: None,
    })
}

fn ensure_positive(q: Decimal) -> DomainResult<()> {
    if q <= Decimal::ZERO {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
