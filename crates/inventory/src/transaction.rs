use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{DomainError, DomainResult, InventoryItemId, TransactionId};

/// Classification of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Sale,
    Waste,
    Adjustment,
    Transfer,
    Return,
    Expiry,
    Damage,
}

impl TransactionType {
    /// The direction this type always moves stock in, if it is fixed.
    ///
    /// `adjustment` and `transfer` may go either way.
    pub fn fixed_direction(self) -> Option<Direction> {
        match self {
            TransactionType::Purchase | TransactionType::Return => Some(Direction::In),
            TransactionType::Sale
            | TransactionType::Waste
            | TransactionType::Expiry
            | TransactionType::Damage => Some(Direction::Out),
            TransactionType::Adjustment | TransactionType::Transfer => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Sale => "sale",
            TransactionType::Waste => "waste",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Transfer => "transfer",
            TransactionType::Return => "return",
            TransactionType::Expiry => "expiry",
            TransactionType::Damage => "damage",
        }
    }
}

impl core::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "purchase" => Ok(TransactionType::Purchase),
            "sale" => Ok(TransactionType::Sale),
            "waste" => Ok(TransactionType::Waste),
            "adjustment" => Ok(TransactionType::Adjustment),
            "transfer" => Ok(TransactionType::Transfer),
            "return" => Ok(TransactionType::Return),
            "expiry" => Ok(TransactionType::Expiry),
            "damage" => Ok(TransactionType::Damage),
            other => Err(DomainError::validation(format!(
                "unknown transaction type '{other}'"
            ))),
        }
    }
}

/// Which way a ledger row moved stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn sign(self) -> Decimal {
        match self {
            Direction::In => Decimal::ONE,
            Direction::Out => Decimal::NEGATIVE_ONE,
        }
    }
}

/// What kind of business record caused a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Item,
    Manual,
    Bulk,
    Purchase,
    PurchaseItem,
    Waste,
    Order,
}

/// Pointer from a ledger row to its originating record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub id: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

/// One row of the stock ledger.
///
/// Rows are append-only, with a single exception: a waste edit rewrites the
/// quantity of the row its waste record produced (see
/// [`StockTransaction::amended`]). Deleting a waste record instead
/// appends a compensating row. The two paths are inconsistent with each other;
/// both are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: TransactionId,
    pub inventory_id: InventoryItemId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub direction: Direction,
    /// Unsigned magnitude.
    pub quantity: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reference: Option<Reference>,
    pub unit_cost: Decimal,
    pub total_value: Decimal,
    pub reason: Option<String>,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the row was rewritten in place.
    pub amended_at: Option<DateTime<Utc>>,
}

impl StockTransaction {
    /// Signed contribution of this row to the item's stock.
    pub fn signed_delta(&self) -> Decimal {
        self.direction.sign() * self.quantity
    }

    /// Check `new = previous + sign·quantity` and `new >= 0`.
    pub fn check_consistency(&self) -> DomainResult<()> {
        if self.quantity < Decimal::ZERO {
            return Err(DomainError::invariant("ledger quantity must be unsigned"));
        }
        if self.new_stock != self.previous_stock + self.signed_delta() {
            return Err(DomainError::invariant(format!(
                "ledger row {} does not balance: {} + {} != {}",
                self.id,
                self.previous_stock,
                self.signed_delta(),
                self.new_stock
            )));
        }
        if self.new_stock < Decimal::ZERO {
            return Err(DomainError::invariant("ledger row drives stock negative"));
        }
        if let Some(dir) = self.kind.fixed_direction() {
            if dir != self.direction {
                return Err(DomainError::invariant(format!(
                    "{} rows must move stock {:?}",
                    self.kind.as_str(),
                    dir
                )));
            }
        }
        Ok(())
    }

    /// Build the rewritten version of this row for a new quantity, plus the
    /// stock delta the owning item must absorb.
    ///
    /// Known inconsistency: committing the result mutates history instead of
    /// appending. Only waste edits use it; waste deletion compensates with a
    /// new row instead.
    ///
    /// Two stock guards apply: the rewritten row must not drive its own
    /// `previous_stock` negative (checked here), and the item's current stock
    /// must absorb the delta (checked by [`crate::InventoryItem::apply_amendment`]).
    pub fn amended(
        &self,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<(StockTransaction, Decimal)> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let stock_delta = self.direction.sign() * (quantity - self.quantity);
        let mut row = self.clone();
        row.quantity = quantity;
        row.new_stock = self.previous_stock + self.direction.sign() * quantity;
        row.total_value = quantity * self.unit_cost;
        row.amended_at = Some(now);
        if row.new_stock < Decimal::ZERO {
            return Err(DomainError::insufficient_stock(
                self.inventory_id.to_string(),
                quantity,
                self.previous_stock,
            ));
        }
        row.check_consistency()?;
        Ok((row, stock_delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn waste_row(qty: Decimal, previous: Decimal) -> StockTransaction {
        StockTransaction {
            id: TransactionId::new(),
            inventory_id: InventoryItemId::new(),
            kind: TransactionType::Waste,
            direction: Direction::Out,
            quantity: qty,
            previous_stock: previous,
            new_stock: previous - qty,
            reference: None,
            unit_cost: dec!(2.50),
            total_value: qty * dec!(2.50),
            reason: None,
            performed_by: None,
            created_at: Utc::now(),
            amended_at: None,
        }
    }

    #[test]
    fn fixed_directions_match_the_sign_table() {
        assert_eq!(TransactionType::Purchase.fixed_direction(), Some(Direction::In));
        assert_eq!(TransactionType::Return.fixed_direction(), Some(Direction::In));
        for t in [
            TransactionType::Sale,
            TransactionType::Waste,
            TransactionType::Expiry,
            TransactionType::Damage,
        ] {
            assert_eq!(t.fixed_direction(), Some(Direction::Out));
        }
        assert_eq!(TransactionType::Adjustment.fixed_direction(), None);
        assert_eq!(TransactionType::Transfer.fixed_direction(), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Waste".parse::<TransactionType>().unwrap(), TransactionType::Waste);
        assert!("restock".parse::<TransactionType>().is_err());
    }

    #[test]
    fn amended_rewrites_row_and_reports_stock_delta() {
        let row = waste_row(dec!(20), dec!(100));
        let (amended, delta) = row.amended(dec!(25), Utc::now()).unwrap();

        assert_eq!(delta, dec!(-5));
        assert_eq!(amended.id, row.id);
        assert_eq!(amended.quantity, dec!(25));
        assert_eq!(amended.new_stock, dec!(75));
        assert_eq!(amended.total_value, dec!(62.50));
        assert!(amended.amended_at.is_some());
        amended.check_consistency().unwrap();
    }

    #[test]
    fn amended_with_smaller_quantity_gives_stock_back() {
        let row = waste_row(dec!(20), dec!(100));
        let (_, delta) = row.amended(dec!(12), Utc::now()).unwrap();
        assert_eq!(delta, dec!(8));
        assert!(row.amended(Decimal::ZERO, Utc::now()).is_err());
    }

    #[test]
    fn amended_cannot_overdraw_the_rows_own_starting_stock() {
        let row = waste_row(dec!(5), dec!(10));
        let err = row.amended(dec!(20), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientStock { requested, available, .. }
                if requested == dec!(20) && available == dec!(10)
        ));
        let (full, _) = row.amended(dec!(10), Utc::now()).unwrap();
        assert_eq!(full.new_stock, Decimal::ZERO);
    }

    #[test]
    fn consistency_rejects_wrong_direction_for_type() {
        let mut row = waste_row(dec!(1), dec!(5));
        row.direction = Direction::In;
        row.new_stock = dec!(6);
        assert!(row.check_consistency().is_err());
    }
}
