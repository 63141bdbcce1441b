use std::collections::HashMap;
use std::sync::RwLock;

use galley_core::{AggregateRoot, DomainError, ExpectedVersion, InventoryItemId, TransactionId};
use galley_inventory::{InventoryItem, StockTransaction};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Default)]
struct State {
    items: HashMap<InventoryItemId, InventoryItem>,
    ledger: Vec<StockTransaction>,
    by_tx: HashMap<TransactionId, usize>,
}

impl State {
    fn check_version(&self, id: InventoryItemId, expected: ExpectedVersion) -> ServiceResult<()> {
        let current = self
            .items
            .get(&id)
            .ok_or_else(|| ServiceError::not_found(format!("inventory item {id}")))?;
        if !expected.matches(current.version()) {
            return Err(ServiceError::Concurrency(format!(
                "inventory item {id} moved to version {} (expected {expected:?})",
                current.version()
            )));
        }
        Ok(())
    }

    fn check_new(&self, item: &InventoryItem) -> ServiceResult<()> {
        if let Some(sku) = item.sku() {
            let taken = self
                .items
                .values()
                .any(|i| i.sku().is_some_and(|s| s.eq_ignore_ascii_case(sku)));
            if taken {
                return Err(DomainError::validation(format!("sku '{sku}' is already in use")).into());
            }
        }
        if self.items.contains_key(&item.id_typed()) {
            return Err(DomainError::conflict(format!("inventory item {} exists", item.id_typed())).into());
        }
        Ok(())
    }

    fn push_row(&mut self, tx: StockTransaction) {
        self.by_tx.insert(tx.id, self.ledger.len());
        self.ledger.push(tx);
    }
}

/// Inventory Store and Stock Ledger behind one lock.
///
/// Every write that changes stock stores the item and its ledger row in the
/// same critical section, so readers never see one without the other.
#[derive(Debug, Default)]
pub struct InventoryStore {
    state: RwLock<State>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ServiceResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| ServiceError::poisoned("inventory"))
    }

    fn write(&self) -> ServiceResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| ServiceError::poisoned("inventory"))
    }

    /// Insert a new item, with its optional opening ledger row.
    ///
    /// SKUs are unique case-insensitively across active and inactive items.
    pub fn insert_item(
        &self,
        item: InventoryItem,
        opening: Option<StockTransaction>,
    ) -> ServiceResult<()> {
        let mut state = self.write()?;
        state.check_new(&item)?;
        state.items.insert(item.id_typed(), item);
        if let Some(tx) = opening {
            state.push_row(tx);
        }
        Ok(())
    }

    /// Insert stockless items all together, or none of them.
    pub fn insert_items(&self, items: &[InventoryItem]) -> ServiceResult<()> {
        let mut state = self.write()?;
        for (idx, item) in items.iter().enumerate() {
            state.check_new(item)?;
            if let Some(sku) = item.sku() {
                let repeated = items[..idx]
                    .iter()
                    .any(|other| other.sku().is_some_and(|s| s.eq_ignore_ascii_case(sku)));
                if repeated {
                    return Err(DomainError::validation(format!("sku '{sku}' appears twice")).into());
                }
            }
        }
        for item in items {
            state.items.insert(item.id_typed(), item.clone());
        }
        Ok(())
    }

    /// Remove items that never reached the ledger. Items with rows are kept.
    pub fn discard_unbooked(&self, ids: &[InventoryItemId]) -> ServiceResult<usize> {
        let mut state = self.write()?;
        let mut removed = 0;
        for id in ids {
            if state.ledger.iter().any(|t| t.inventory_id == *id) {
                continue;
            }
            if state.items.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn get(&self, id: InventoryItemId) -> ServiceResult<Option<InventoryItem>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    pub fn load(&self, id: InventoryItemId) -> ServiceResult<InventoryItem> {
        self.get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("inventory item {id}")))
    }

    pub fn items(&self) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    /// First active item whose name equals `name`, ignoring case.
    ///
    /// Ties (duplicate names) resolve to the oldest item.
    pub fn find_active_by_name(&self, name: &str) -> ServiceResult<Option<InventoryItem>> {
        let state = self.read()?;
        Ok(state
            .items
            .values()
            .filter(|i| i.is_active() && i.name_matches(name))
            .min_by_key(|i| (i.created_at(), i.id_typed()))
            .cloned())
    }

    /// Replace descriptive fields (no stock change).
    pub fn replace_item(&self, item: InventoryItem, expected: ExpectedVersion) -> ServiceResult<()> {
        let mut state = self.write()?;
        state.check_version(item.id_typed(), expected)?;
        if let Some(sku) = item.sku() {
            let taken = state.items.values().any(|i| {
                i.id_typed() != item.id_typed()
                    && i.sku().is_some_and(|s| s.eq_ignore_ascii_case(sku))
            });
            if taken {
                return Err(DomainError::validation(format!("sku '{sku}' is already in use")).into());
            }
        }
        state.items.insert(item.id_typed(), item);
        Ok(())
    }

    /// Store the adjusted item and append its ledger row as one unit.
    pub fn commit_adjustment(
        &self,
        item: InventoryItem,
        tx: StockTransaction,
        expected: ExpectedVersion,
    ) -> ServiceResult<()> {
        if tx.inventory_id != item.id_typed() || tx.new_stock != item.current_stock() {
            return Err(DomainError::invariant("ledger row does not match the item").into());
        }
        let mut state = self.write()?;
        state.check_version(item.id_typed(), expected)?;
        state.items.insert(item.id_typed(), item);
        state.push_row(tx);
        Ok(())
    }

    /// Store the item and overwrite an existing ledger row in place.
    pub fn commit_amendment(
        &self,
        item: InventoryItem,
        row: StockTransaction,
        expected: ExpectedVersion,
    ) -> ServiceResult<()> {
        row.check_consistency()?;
        let mut state = self.write()?;
        state.check_version(item.id_typed(), expected)?;
        let idx = *state
            .by_tx
            .get(&row.id)
            .ok_or_else(|| ServiceError::not_found(format!("stock transaction {}", row.id)))?;
        if state.ledger[idx].inventory_id != item.id_typed() {
            return Err(DomainError::invariant("amended row belongs to another item").into());
        }
        state.ledger[idx] = row;
        state.items.insert(item.id_typed(), item);
        Ok(())
    }

    pub fn transaction(&self, id: TransactionId) -> ServiceResult<Option<StockTransaction>> {
        let state = self.read()?;
        Ok(state.by_tx.get(&id).map(|idx| state.ledger[*idx].clone()))
    }

    /// All ledger rows of one item, in append order.
    pub fn transactions_for(&self, item: InventoryItemId) -> ServiceResult<Vec<StockTransaction>> {
        let state = self.read()?;
        Ok(state
            .ledger
            .iter()
            .filter(|t| t.inventory_id == item)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use galley_inventory::{
        AdjustStock, Direction, NewItem, StockChange, TransactionType, plan_adjustment,
    };
    use rust_decimal_macros::dec;

    fn herb(name: &str, sku: &str) -> InventoryItem {
        InventoryItem::create(
            InventoryItemId::new(),
            &NewItem {
                name: name.into(),
                sku: Some(sku.into()),
                category: "herbs".into(),
                unit: "bunch".into(),
                ..NewItem::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn batch_insert_is_all_or_nothing() {
        let store = InventoryStore::new();
        let err = store
            .insert_items(&[herb("Basil", "H-1"), herb("Thai basil", "h-1")])
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(store.items().unwrap().is_empty());

        let pair = [herb("Basil", "H-1"), herb("Thyme", "H-2")];
        store.insert_items(&pair).unwrap();
        assert_eq!(store.items().unwrap().len(), 2);

        let ids: Vec<_> = pair.iter().map(InventoryItem::id_typed).collect();
        assert_eq!(store.discard_unbooked(&ids).unwrap(), 2);
        assert!(store.items().unwrap().is_empty());
    }

    #[test]
    fn discard_keeps_items_that_reached_the_ledger() {
        let store = InventoryStore::new();
        let mut item = herb("Sage", "H-3");
        let tx = plan_adjustment(
            &item,
            &AdjustStock::new(
                item.id_typed(),
                StockChange::Increase(dec!(4)),
                TransactionType::Purchase,
                Utc::now(),
            ),
        )
        .unwrap();
        item.apply_transaction(&tx).unwrap();
        store.insert_item(item.clone(), Some(tx)).unwrap();

        assert_eq!(store.discard_unbooked(&[item.id_typed()]).unwrap(), 0);
        assert!(store.get(item.id_typed()).unwrap().is_some());
    }

    #[test]
    fn amendment_with_a_negative_row_is_refused() {
        let store = InventoryStore::new();
        let mut item = herb("Dill", "H-4");
        let tx = plan_adjustment(
            &item,
            &AdjustStock::new(
                item.id_typed(),
                StockChange::Increase(dec!(10)),
                TransactionType::Purchase,
                Utc::now(),
            ),
        )
        .unwrap();
        item.apply_transaction(&tx).unwrap();
        store.insert_item(item.clone(), Some(tx.clone())).unwrap();

        let mut broken = tx.clone();
        broken.direction = Direction::Out;
        broken.kind = TransactionType::Adjustment;
        broken.quantity = dec!(20);
        broken.new_stock = broken.previous_stock - dec!(20);
        let err = store
            .commit_amendment(item.clone(), broken, ExpectedVersion::Exact(item.version()))
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InvariantViolation(_))
        ));
        assert_eq!(store.transaction(tx.id).unwrap(), Some(tx));
        assert_eq!(store.load(item.id_typed()).unwrap().current_stock(), dec!(10));
    }
}
