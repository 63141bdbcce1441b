use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{AggregateRoot, DomainError, DomainResult, InventoryItemId, SupplierId};

use crate::transaction::StockTransaction;

/// Aggregate root: InventoryItem.
///
/// `current_stock` is never written directly. It only moves through
/// [`InventoryItem::apply_transaction`], fed by a ledger row planned with
/// [`crate::plan_adjustment`], so the stock always equals the sum of the
/// item's signed ledger deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: InventoryItemId,
    name: String,
    sku: Option<String>,
    category: String,
    unit: String,
    current_stock: Decimal,
    min_stock: Decimal,
    max_stock: Option<Decimal>,
    cost_per_unit: Decimal,
    supplier_id: Option<SupplierId>,
    expiry_date: Option<NaiveDate>,
    location: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Fields accepted when creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewItem {
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub unit: String,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier_id: Option<SupplierId>,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<String>,
    /// Seed stock; a positive value is booked as one initial ledger entry.
    pub initial_stock: Decimal,
}

/// Partial update of descriptive fields. Stock is deliberately absent.
///
/// For optional columns, `Some(None)` clears the value and `None` leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub sku: Option<Option<String>>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Option<Decimal>>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier_id: Option<Option<SupplierId>>,
    pub expiry_date: Option<Option<NaiveDate>>,
    pub location: Option<Option<String>>,
}

impl InventoryItem {
    /// Validate and build a new item with zero stock.
    pub fn create(id: InventoryItemId, fields: &NewItem, now: DateTime<Utc>) -> DomainResult<Self> {
        if fields.initial_stock < Decimal::ZERO {
            return Err(DomainError::validation("initial_stock cannot be negative"));
        }

        let mut item = Self {
            id,
            name: String::new(),
            sku: None,
            category: String::new(),
            unit: String::new(),
            current_stock: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            max_stock: None,
            cost_per_unit: Decimal::ZERO,
            supplier_id: None,
            expiry_date: None,
            location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        item.apply_patch(
            &ItemPatch {
                name: Some(fields.name.clone()),
                sku: Some(fields.sku.clone()),
                category: Some(fields.category.clone()),
                unit: Some(fields.unit.clone()),
                min_stock: Some(fields.min_stock),
                max_stock: Some(fields.max_stock),
                cost_per_unit: Some(fields.cost_per_unit),
                supplier_id: Some(fields.supplier_id),
                expiry_date: Some(fields.expiry_date),
                location: Some(fields.location.clone()),
            },
            now,
        )?;
        item.version = 1;
        Ok(item)
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn current_stock(&self) -> Decimal {
        self.current_stock
    }

    pub fn min_stock(&self) -> Decimal {
        self.min_stock
    }

    pub fn max_stock(&self) -> Option<Decimal> {
        self.max_stock
    }

    pub fn cost_per_unit(&self) -> Decimal {
        self.cost_per_unit
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stock valued at the current unit cost.
    pub fn stock_value(&self) -> Decimal {
        self.current_stock * self.cost_per_unit
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock <= Decimal::ZERO
    }

    /// Case-insensitive name comparison used by ingredient matching.
    pub fn name_matches(&self, other: &str) -> bool {
        self.name.trim().to_lowercase() == other.trim().to_lowercase()
    }

    /// Apply descriptive changes after validating the resulting record.
    pub fn apply_patch(&mut self, patch: &ItemPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();

        if let Some(name) = &patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(sku) = &patch.sku {
            next.sku = sku
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }
        if let Some(category) = &patch.category {
            next.category = category.trim().to_string();
        }
        if let Some(unit) = &patch.unit {
            next.unit = unit.trim().to_string();
        }
        if let Some(min) = patch.min_stock {
            next.min_stock = min;
        }
        if let Some(max) = patch.max_stock {
            next.max_stock = max;
        }
        if let Some(cost) = patch.cost_per_unit {
            next.cost_per_unit = cost;
        }
        if let Some(supplier) = patch.supplier_id {
            next.supplier_id = supplier;
        }
        if let Some(expiry) = patch.expiry_date {
            next.expiry_date = expiry;
        }
        if let Some(location) = &patch.location {
            next.location = location.clone();
        }

        next.validate()?;
        next.updated_at = now;
        next.version = self.version + 1;
        *self = next;
        Ok(())
    }

    /// Soft delete. Ledger history is untouched.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::validation("item is already inactive"));
        }
        self.is_active = false;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }

    /// Move stock to the row's `new_stock`. The only stock write path.
    pub fn apply_transaction(&mut self, tx: &StockTransaction) -> DomainResult<()> {
        self.ensure_item_id(tx.inventory_id)?;
        if tx.previous_stock != self.current_stock {
            return Err(DomainError::conflict(format!(
                "ledger row expects previous stock {}, item holds {}",
                tx.previous_stock, self.current_stock
            )));
        }
        self.current_stock = tx.new_stock;
        self.updated_at = tx.created_at;
        self.version += 1;
        Ok(())
    }

    /// Re-apply an in-place ledger amendment: stock moves by `delta`.
    ///
    /// Only used by waste edits, which rewrite their original ledger row.
    pub fn apply_amendment(&mut self, delta: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::validation(format!("item '{}' is inactive", self.name)));
        }
        let next = self.current_stock + delta;
        if next < Decimal::ZERO {
            return Err(DomainError::insufficient_stock(
                self.name.clone(),
                -delta,
                self.current_stock,
            ));
        }
        self.current_stock = next;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }

    fn ensure_item_id(&self, item_id: InventoryItemId) -> DomainResult<()> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        if self.name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.unit.is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if self.min_stock < Decimal::ZERO {
            return Err(DomainError::validation("min_stock cannot be negative"));
        }
        if let Some(max) = self.max_stock {
            if max < self.min_stock {
                return Err(DomainError::validation("max_stock must be >= min_stock"));
            }
        }
        if self.cost_per_unit < Decimal::ZERO {
            return Err(DomainError::validation("cost_per_unit cannot be negative"));
        }
        Ok(())
    }
}

impl AggregateRoot for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flour() -> NewItem {
        NewItem {
            name: "Flour".to_string(),
            sku: Some("FLR-01".to_string()),
            category: "dry".to_string(),
            unit: "kg".to_string(),
            min_stock: dec!(10),
            max_stock: Some(dec!(200)),
            cost_per_unit: dec!(1.20),
            ..NewItem::default()
        }
    }

    #[test]
    fn create_starts_with_zero_stock_and_version_one() {
        let item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        assert_eq!(item.current_stock(), Decimal::ZERO);
        assert_eq!(item.version(), 1);
        assert!(item.is_active());
        assert!(item.is_low_stock());
        assert!(item.is_out_of_stock());
    }

    #[test]
    fn create_rejects_blank_name_and_inverted_bounds() {
        let mut fields = flour();
        fields.name = "   ".to_string();
        assert!(matches!(
            InventoryItem::create(InventoryItemId::new(), &fields, Utc::now()),
            Err(DomainError::Validation(_))
        ));

        let mut fields = flour();
        fields.max_stock = Some(dec!(5));
        assert!(matches!(
            InventoryItem::create(InventoryItemId::new(), &fields, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn failed_patch_leaves_item_untouched() {
        let mut item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        let before = item.clone();

        let err = item
            .apply_patch(
                &ItemPatch {
                    name: Some("Bread flour".to_string()),
                    cost_per_unit: Some(dec!(-1)),
                    ..ItemPatch::default()
                },
                Utc::now(),
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item, before);
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        item.apply_patch(
            &ItemPatch {
                sku: Some(None),
                max_stock: Some(None),
                ..ItemPatch::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(item.sku(), None);
        assert_eq!(item.max_stock(), None);
        assert_eq!(item.version(), 2);
    }

    #[test]
    fn name_matching_ignores_case_and_padding() {
        let item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        assert!(item.name_matches("  FLOUR "));
        assert!(!item.name_matches("flour (organic)"));
    }

    #[test]
    fn amendments_are_refused_on_inactive_items() {
        let mut item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        item.deactivate(Utc::now()).unwrap();
        let before = item.clone();
        assert!(matches!(
            item.apply_amendment(Decimal::ONE, Utc::now()),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(item, before);
    }

    #[test]
    fn deactivate_twice_is_rejected() {
        let mut item = InventoryItem::create(InventoryItemId::new(), &flour(), Utc::now()).unwrap();
        item.deactivate(Utc::now()).unwrap();
        assert!(!item.is_active());
        assert!(item.deactivate(Utc::now()).is_err());
    }
}
