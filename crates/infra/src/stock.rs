//! Stock Adjustment Service: the only path that changes an item's stock.
//!
//! Each adjustment holds the item's lock, plans the ledger row against the
//! current item, and commits item and row together under a version check.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use galley_core::{
    AggregateRoot, DomainError, ExpectedVersion, InventoryItemId, Paginated, SupplierId,
    TransactionId,
};
use galley_inventory::{
    AdjustStock, AdjustmentResult, AlertSummary, InventoryEvent, InventoryItem, ItemFilter,
    ItemListing, ItemPatch, NewItem, Reference, ReferenceKind, StockChange, StockTransaction,
    TransactionFilter, TransactionType, alerts, filter_transactions, list_items, plan_adjustment,
};
use galley_purchasing::Supplier;

use crate::error::{BatchOutcome, ServiceError, ServiceResult};
use crate::publisher::EventPublisher;
use crate::store::{InventoryStore, LockTable, Repository};

/// Version-check retries before giving up with `ServiceError::Concurrency`.
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

const AGGREGATE: &str = "inventory.item";

/// Read-only view of inventory the kitchen uses to resolve ingredients.
pub trait InventoryLookup: Send + Sync {
    fn find_active_by_name(&self, name: &str) -> ServiceResult<Option<InventoryItem>>;
}

pub struct StockService {
    store: Arc<InventoryStore>,
    suppliers: Arc<Repository<Supplier>>,
    locks: LockTable<InventoryItemId>,
    events: EventPublisher,
}

impl StockService {
    pub fn new(
        store: Arc<InventoryStore>,
        suppliers: Arc<Repository<Supplier>>,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            suppliers,
            locks: LockTable::new(),
            events,
        }
    }

    pub fn store(&self) -> &Arc<InventoryStore> {
        &self.store
    }

    fn ensure_supplier(&self, supplier: Option<SupplierId>) -> ServiceResult<()> {
        if let Some(id) = supplier {
            let s = self.suppliers.load(&id)?;
            if !s.is_active() {
                return Err(DomainError::validation(format!("supplier {id} is inactive")).into());
            }
        }
        Ok(())
    }

    /// Create an item. A positive `initial_stock` is booked as one
    /// `adjustment` row so the ledger explains the stock from the start.
    pub fn create_item(
        &self,
        fields: NewItem,
        performed_by: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<InventoryItem> {
        self.ensure_supplier(fields.supplier_id)?;
        let mut item = InventoryItem::create(InventoryItemId::new(), &fields, now)?;

        let opening = if fields.initial_stock > Decimal::ZERO {
            let mut cmd = AdjustStock::new(
                item.id_typed(),
                StockChange::Increase(fields.initial_stock),
                TransactionType::Adjustment,
                now,
            )
            .with_reference(Reference::new(ReferenceKind::Item, item.id_typed()))
            .with_reason("initial stock");
            cmd.performed_by = performed_by;
            let tx = plan_adjustment(&item, &cmd)?;
            item.apply_transaction(&tx)?;
            Some(tx)
        } else {
            None
        };

        self.store.insert_item(item.clone(), opening.clone())?;
        self.announce_created(&item, now);
        if let Some(tx) = opening {
            self.events.publish(
                *item.id_typed().as_uuid(),
                AGGREGATE,
                item.version(),
                &InventoryEvent::StockAdjusted { transaction: tx },
            );
        }
        Ok(item)
    }

    /// Validate `fields` into a stockless item without storing it.
    ///
    /// Callers that create several items alongside another record store them
    /// with [`InventoryStore::insert_items`] once everything has validated,
    /// then call [`StockService::announce_created`].
    pub fn prepare_item(&self, fields: &NewItem, now: DateTime<Utc>) -> ServiceResult<InventoryItem> {
        if fields.initial_stock != Decimal::ZERO {
            return Err(DomainError::validation("prepared items start without stock").into());
        }
        self.ensure_supplier(fields.supplier_id)?;
        Ok(InventoryItem::create(InventoryItemId::new(), fields, now)?)
    }

    pub fn announce_created(&self, item: &InventoryItem, now: DateTime<Utc>) {
        tracing::info!(
            item_id = %item.id_typed(),
            name = item.name(),
            initial_stock = %item.current_stock(),
            "inventory item created"
        );
        self.events.publish(
            *item.id_typed().as_uuid(),
            AGGREGATE,
            item.version(),
            &InventoryEvent::ItemCreated {
                item_id: item.id_typed(),
                name: item.name().to_string(),
                occurred_at: now,
            },
        );
    }

    /// Edit descriptive fields. Stock cannot be written here.
    pub fn update_item(
        &self,
        id: InventoryItemId,
        patch: ItemPatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<InventoryItem> {
        if let Some(supplier) = patch.supplier_id {
            self.ensure_supplier(supplier)?;
        }
        let item = self.retry_commit(id, |current| {
            let mut next = current.clone();
            next.apply_patch(&patch, now)?;
            self.store
                .replace_item(next.clone(), ExpectedVersion::Exact(current.version()))?;
            Ok(next)
        })?;
        self.events.publish(
            *id.as_uuid(),
            AGGREGATE,
            item.version(),
            &InventoryEvent::ItemUpdated {
                item_id: id,
                occurred_at: now,
            },
        );
        Ok(item)
    }

    /// Soft delete; the ledger is kept.
    pub fn delete_item(&self, id: InventoryItemId, now: DateTime<Utc>) -> ServiceResult<InventoryItem> {
        let item = self.locks.with_lock(&id, || {
            self.retry_commit(id, |current| {
                let mut next = current.clone();
                next.deactivate(now)?;
                self.store
                    .replace_item(next.clone(), ExpectedVersion::Exact(current.version()))?;
                Ok(next)
            })
        })??;
        tracing::info!(item_id = %id, "inventory item deactivated");
        self.events.publish(
            *id.as_uuid(),
            AGGREGATE,
            item.version(),
            &InventoryEvent::ItemDeactivated {
                item_id: id,
                occurred_at: now,
            },
        );
        Ok(item)
    }

    pub fn get_item(&self, id: InventoryItemId) -> ServiceResult<InventoryItem> {
        self.store.load(id)
    }

    pub fn list_items(&self, filter: &ItemFilter, today: NaiveDate) -> ServiceResult<ItemListing> {
        Ok(list_items(self.store.items()?, filter, today))
    }

    /// Apply one adjustment atomically. Not idempotent.
    pub fn adjust_stock(&self, cmd: AdjustStock) -> ServiceResult<AdjustmentResult> {
        let id = cmd.item_id;
        let (before, tx) = self.locks.with_lock(&id, || {
            self.retry_commit(id, |current| {
                let tx = plan_adjustment(current, &cmd)?;
                let mut next = current.clone();
                next.apply_transaction(&tx)?;
                self.store
                    .commit_adjustment(next, tx.clone(), ExpectedVersion::Exact(current.version()))?;
                Ok((current.clone(), tx))
            })
        })??;

        tracing::info!(
            item_id = %id,
            kind = tx.kind.as_str(),
            previous_stock = %tx.previous_stock,
            new_stock = %tx.new_stock,
            reference = ?tx.reference,
            "stock adjusted"
        );
        self.publish_adjustment(&before, &tx);
        Ok(AdjustmentResult::from(tx))
    }

    /// Apply each adjustment on its own. Earlier successes are never rolled back.
    pub fn bulk_adjust(&self, cmds: Vec<AdjustStock>) -> BatchOutcome<AdjustmentResult> {
        let mut outcome = BatchOutcome::new();
        for (index, cmd) in cmds.into_iter().enumerate() {
            let key = cmd.item_id;
            outcome.record(index, key, self.adjust_stock(cmd));
        }
        if !outcome.is_clean() {
            tracing::warn!(
                applied = outcome.applied_count(),
                failed = outcome.errors.len(),
                "bulk adjustment partially applied"
            );
        }
        outcome
    }

    /// Rewrite an existing ledger row to `quantity` and move stock by the
    /// difference.
    ///
    /// Known inconsistency: this edits history in place. Waste edits use it;
    /// waste deletion appends a compensating row instead.
    pub fn amend_transaction(
        &self,
        tx_id: TransactionId,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> ServiceResult<StockTransaction> {
        let id = self
            .store
            .transaction(tx_id)?
            .ok_or_else(|| ServiceError::not_found(format!("stock transaction {tx_id}")))?
            .inventory_id;

        let (item, row, delta) = self.locks.with_lock(&id, || {
            self.retry_commit(id, |current| {
                let stored = self
                    .store
                    .transaction(tx_id)?
                    .ok_or_else(|| ServiceError::not_found(format!("stock transaction {tx_id}")))?;
                let (row, delta) = stored.amended(quantity, now)?;
                let mut next = current.clone();
                next.apply_amendment(delta, now)?;
                self.store.commit_amendment(
                    next.clone(),
                    row.clone(),
                    ExpectedVersion::Exact(current.version()),
                )?;
                Ok((next, row, delta))
            })
        })??;

        tracing::info!(
            item_id = %id,
            transaction_id = %tx_id,
            quantity = %quantity,
            stock_delta = %delta,
            new_stock = %item.current_stock(),
            "ledger row amended in place"
        );
        self.events.publish(
            *id.as_uuid(),
            AGGREGATE,
            item.version(),
            &InventoryEvent::LedgerAmended {
                transaction: row.clone(),
                stock_delta: delta,
            },
        );
        Ok(row)
    }

    pub fn list_transactions(
        &self,
        id: InventoryItemId,
        filter: &TransactionFilter,
    ) -> ServiceResult<Paginated<StockTransaction>> {
        self.store.load(id)?;
        Ok(filter_transactions(self.store.transactions_for(id)?, filter))
    }

    /// Sum of signed ledger deltas for one item.
    pub fn ledger_balance(&self, id: InventoryItemId) -> ServiceResult<Decimal> {
        Ok(self
            .store
            .transactions_for(id)?
            .iter()
            .map(StockTransaction::signed_delta)
            .sum())
    }

    pub fn low_stock(&self) -> ServiceResult<Vec<InventoryItem>> {
        let items = self.store.items()?;
        Ok(alerts::low_stock(&items).into_iter().cloned().collect())
    }

    pub fn out_of_stock(&self) -> ServiceResult<Vec<InventoryItem>> {
        let items = self.store.items()?;
        Ok(alerts::out_of_stock(&items).into_iter().cloned().collect())
    }

    pub fn expiring_soon(&self, today: NaiveDate, days: u32) -> ServiceResult<Vec<InventoryItem>> {
        let items = self.store.items()?;
        Ok(alerts::expiring_soon(&items, today, days)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn expired(&self, today: NaiveDate) -> ServiceResult<Vec<InventoryItem>> {
        let items = self.store.items()?;
        Ok(alerts::expired(&items, today).into_iter().cloned().collect())
    }

    pub fn alert_summary(&self, today: NaiveDate, days: u32) -> ServiceResult<AlertSummary> {
        Ok(alerts::alert_summary(&self.store.items()?, today, days))
    }

    /// Load the item and run `attempt` against it, reloading on a stale
    /// version up to [`MAX_COMMIT_ATTEMPTS`] times.
    fn retry_commit<R>(
        &self,
        id: InventoryItemId,
        mut attempt: impl FnMut(&InventoryItem) -> ServiceResult<R>,
    ) -> ServiceResult<R> {
        let mut last = None;
        for n in 1..=MAX_COMMIT_ATTEMPTS {
            let current = self.store.load(id)?;
            match attempt(&current) {
                Err(ServiceError::Concurrency(msg)) => {
                    tracing::warn!(item_id = %id, attempt = n, reason = %msg, "stale item version; retrying");
                    last = Some(msg);
                }
                other => return other,
            }
        }
        Err(ServiceError::Concurrency(last.unwrap_or_else(|| {
            format!("inventory item {id} kept changing")
        })))
    }

    fn publish_adjustment(&self, before: &InventoryItem, tx: &StockTransaction) {
        let id = *before.id_typed().as_uuid();
        let version = before.version() + 1;
        self.events.publish(
            id,
            AGGREGATE,
            version,
            &InventoryEvent::StockAdjusted {
                transaction: tx.clone(),
            },
        );
        let now_low = tx.new_stock <= before.min_stock();
        if now_low && !before.is_low_stock() {
            tracing::info!(
                item_id = %before.id_typed(),
                current_stock = %tx.new_stock,
                min_stock = %before.min_stock(),
                "item reached low stock"
            );
            self.events.publish(
                id,
                AGGREGATE,
                version,
                &InventoryEvent::LowStockReached {
                    item_id: before.id_typed(),
                    name: before.name().to_string(),
                    current_stock: tx.new_stock,
                    min_stock: before.min_stock(),
                    occurred_at: tx.created_at,
                },
            );
        }
    }
}

impl InventoryLookup for StockService {
    fn find_active_by_name(&self, name: &str) -> ServiceResult<Option<InventoryItem>> {
        self.store.find_active_by_name(name)
    }
}
