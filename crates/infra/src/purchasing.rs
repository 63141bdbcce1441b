//! Purchase Receiving Service and supplier directory.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{
    AggregateRoot, DomainError, ExpectedVersion, InventoryItemId, PurchaseId, SupplierId,
};
use galley_inventory::{
    AdjustStock, AdjustmentResult, InventoryItem, NewItem, Reference, ReferenceKind, StockChange, TransactionType,
};
use galley_purchasing::{
    NewPurchase, NewPurchaseLine, NewSupplier, PlannedReceipt, Purchase, PurchaseStatus,
    ReceiveLine, Supplier, next_purchase_number,
};

use crate::error::{BatchOutcome, ServiceError, ServiceResult};
use crate::stock::StockService;
use crate::store::{LockTable, Repository};

/// Which inventory item a purchase line restocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    Existing(InventoryItemId),
    /// Created with zero stock when the purchase is created.
    New(NewItem),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLineInput {
    pub item: LineItem,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// Command: CreatePurchase, before inline items are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchase {
    pub supplier_id: SupplierId,
    pub items: Vec<PurchaseLineInput>,
    pub order_date: NaiveDate,
    pub expected_delivery: Option<NaiveDate>,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPurchaseStatus {
    pub status: PurchaseStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub received_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseFilter {
    pub status: Option<PurchaseStatus>,
    pub supplier_id: Option<SupplierId>,
}

/// Result of a receipt: per-line outcome plus the purchase as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptOutcome {
    pub lines: BatchOutcome<AdjustmentResult>,
    pub purchase: Purchase,
}

const AGGREGATE: &str = "purchase";

pub struct PurchaseService {
    stock: Arc<StockService>,
    purchases: Repository<Purchase>,
    suppliers: Arc<Repository<Supplier>>,
    locks: LockTable<PurchaseId>,
    numbering: Mutex<()>,
}

impl PurchaseService {
    pub fn new(stock: Arc<StockService>, suppliers: Arc<Repository<Supplier>>) -> Self {
        Self {
            stock,
            purchases: Repository::new(AGGREGATE),
            suppliers,
            locks: LockTable::new(),
            numbering: Mutex::new(()),
        }
    }

    pub fn create_supplier(&self, fields: NewSupplier, now: DateTime<Utc>) -> ServiceResult<Supplier> {
        let supplier = Supplier::register(SupplierId::new(), &fields, now)?;
        self.suppliers.insert_if(supplier.clone(), |existing| {
            for s in existing {
                if s.name().eq_ignore_ascii_case(supplier.name()) {
                    return Err(DomainError::validation(format!(
                        "supplier '{}' already exists",
                        supplier.name()
                    ))
                    .into());
                }
            }
            Ok(())
        })?;
        tracing::info!(supplier_id = %supplier.id_typed(), name = supplier.name(), "supplier created");
        Ok(supplier)
    }

    pub fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        let mut all = self.suppliers.list()?;
        all.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
        Ok(all)
    }

    /// Refused while any item or purchase still references the supplier.
    pub fn delete_supplier(&self, id: SupplierId) -> ServiceResult<()> {
        let supplier = self.suppliers.load(&id)?;
        if self
            .stock
            .store()
            .items()?
            .iter()
            .any(|i| i.supplier_id() == Some(id))
        {
            return Err(DomainError::conflict(format!(
                "supplier '{}' still has inventory items",
                supplier.name()
            ))
            .into());
        }
        if self.purchases.list()?.iter().any(|p| p.supplier_id() == id) {
            return Err(DomainError::conflict(format!(
                "supplier '{}' still has purchases",
                supplier.name()
            ))
            .into());
        }
        self.suppliers
            .remove(&id, ExpectedVersion::Exact(supplier.version()))?;
        tracing::info!(supplier_id = %id, "supplier deleted");
        Ok(())
    }

    /// Create a purchase with a fresh `PO-YYYYMMDD-NNNN` number.
    ///
    /// Inline new items are built and validated with the purchase, then stored
    /// with zero stock together with it. A rejected purchase leaves no items.
    pub fn create_purchase(
        &self,
        cmd: CreatePurchase,
        now: DateTime<Utc>,
    ) -> ServiceResult<Purchase> {
        let supplier = self.suppliers.load(&cmd.supplier_id)?;
        if !supplier.is_active() {
            return Err(DomainError::validation(format!(
                "supplier '{}' is inactive",
                supplier.name()
            ))
            .into());
        }
        if cmd.items.is_empty() {
            return Err(DomainError::validation("purchase needs at least one item").into());
        }

        let mut inline = Vec::new();
        let mut lines = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let inventory_id = match &line.item {
                LineItem::Existing(id) => self.stock.get_item(*id)?.id_typed(),
                LineItem::New(fields) => {
                    let fields = NewItem {
                        supplier_id: fields.supplier_id.or(Some(cmd.supplier_id)),
                        initial_stock: Decimal::ZERO,
                        ..fields.clone()
                    };
                    let item = self.stock.prepare_item(&fields, now)?;
                    let id = item.id_typed();
                    inline.push(item);
                    id
                }
            };
            lines.push(NewPurchaseLine {
                inventory_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            });
        }
        let new = NewPurchase {
            supplier_id: cmd.supplier_id,
            items: lines,
            order_date: cmd.order_date,
            expected_delivery: cmd.expected_delivery,
            shipping: cmd.shipping,
            tax: cmd.tax,
            discount: cmd.discount,
            notes: cmd.notes,
        };

        let _numbering = self
            .numbering
            .lock()
            .map_err(|_| ServiceError::poisoned("purchase numbering"))?;
        let existing = self.purchases.list()?;
        let number = next_purchase_number(existing.iter().map(Purchase::purchase_number), cmd.order_date);
        let purchase = Purchase::create(PurchaseId::new(), number, &new, now)?;

        self.stock.store().insert_items(&inline)?;
        if let Err(err) = self.purchases.insert(purchase.clone()) {
            let ids: Vec<_> = inline.iter().map(InventoryItem::id_typed).collect();
            if let Err(undo) = self.stock.store().discard_unbooked(&ids) {
                tracing::error!(error = %undo, "failed to discard inline purchase items");
            }
            return Err(err);
        }
        for item in &inline {
            self.stock.announce_created(item, now);
        }

        tracing::info!(
            purchase_id = %purchase.id_typed(),
            purchase_number = %purchase.purchase_number(),
            lines = purchase.items().len(),
            inline_items = inline.len(),
            total = %purchase.total(),
            "purchase created"
        );
        Ok(purchase)
    }

    pub fn get_purchase(&self, id: PurchaseId) -> ServiceResult<Purchase> {
        self.purchases.load(&id)
    }

    /// Newest first.
    pub fn list_purchases(&self, filter: &PurchaseFilter) -> ServiceResult<Vec<Purchase>> {
        let mut rows: Vec<Purchase> = self
            .purchases
            .list()?
            .into_iter()
            .filter(|p| filter.status.is_none_or(|s| p.status() == s))
            .filter(|p| filter.supplier_id.is_none_or(|s| p.supplier_id() == s))
            .collect();
        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(rows)
    }

    /// Receive lines one by one. Each line is its own stock adjustment; a
    /// failed line does not undo the others. Once everything is received the
    /// purchase becomes `delivered`.
    pub fn receive_items(
        &self,
        id: PurchaseId,
        lines: Vec<ReceiveLine>,
        received_by: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<ReceiptOutcome> {
        self.locks.with_lock(&id, || {
            let mut purchase = self.purchases.load(&id)?;
            let loaded = purchase.version();
            if purchase.status().is_terminal() {
                return Err(DomainError::invariant(format!(
                    "purchase {} is {} and cannot receive items",
                    purchase.purchase_number(),
                    purchase.status().as_str()
                ))
                .into());
            }

            let mut outcome = BatchOutcome::new();
            for (index, line) in lines.iter().enumerate() {
                let result = purchase
                    .plan_receipt(line)
                    .map_err(ServiceError::from)
                    .and_then(|planned| match planned {
                        Some(r) => self.book_receipt(&mut purchase, &r, received_by.as_deref(), now).map(Some),
                        None => Ok(None),
                    });
                match result {
                    Ok(Some(applied)) => outcome.applied.push(applied),
                    Ok(None) => tracing::debug!(
                        purchase_item_id = %line.purchase_item_id,
                        "line already fully received; skipped"
                    ),
                    Err(e) => outcome.push_error(index, line.purchase_item_id, &e),
                }
            }

            if purchase.is_fully_received() {
                purchase.transition(PurchaseStatus::Delivered, None, received_by.clone(), now)?;
                tracing::info!(
                    purchase_id = %id,
                    purchase_number = %purchase.purchase_number(),
                    "purchase fully received; delivered"
                );
            }
            self.purchases
                .commit(purchase.clone(), ExpectedVersion::Exact(loaded))?;

            Ok(ReceiptOutcome {
                lines: outcome,
                purchase,
            })
        })?
    }

    /// Change status. Reaching `delivered` this way first receives every
    /// outstanding remainder, so stock always matches a delivered purchase.
    pub fn set_status(
        &self,
        id: PurchaseId,
        cmd: SetPurchaseStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Purchase> {
        self.locks.with_lock(&id, || {
            let mut purchase = self.purchases.load(&id)?;
            let loaded = purchase.version();
            purchase.ensure_transition(cmd.status)?;
            let from = purchase.status();

            if cmd.status == PurchaseStatus::Delivered {
                for r in purchase.outstanding_receipts() {
                    if let Err(e) = self.book_receipt(&mut purchase, &r, cmd.received_by.as_deref(), now) {
                        // Keep what was booked so stock and purchase agree.
                        self.purchases
                            .commit(purchase.clone(), ExpectedVersion::Exact(loaded))?;
                        tracing::warn!(
                            purchase_id = %id,
                            inventory_id = %r.inventory_id,
                            error = %e,
                            "auto-receive stopped; purchase not delivered"
                        );
                        return Err(e);
                    }
                }
            }

            purchase.transition(cmd.status, cmd.delivery_date, cmd.received_by.clone(), now)?;
            self.purchases
                .commit(purchase.clone(), ExpectedVersion::Exact(loaded))?;
            tracing::info!(
                purchase_id = %id,
                from = from.as_str(),
                to = cmd.status.as_str(),
                "purchase status changed"
            );
            Ok(purchase)
        })?
    }

    fn book_receipt(
        &self,
        purchase: &mut Purchase,
        receipt: &PlannedReceipt,
        received_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> ServiceResult<AdjustmentResult> {
        let mut cmd = AdjustStock::new(
            receipt.inventory_id,
            StockChange::Increase(receipt.quantity),
            TransactionType::Purchase,
            now,
        )
        .with_reference(Reference::new(
            ReferenceKind::PurchaseItem,
            receipt.purchase_item_id,
        ))
        .with_reason(format!("received on {}", purchase.purchase_number()))
        .with_unit_cost(receipt.unit_cost);
        cmd.performed_by = received_by.map(str::to_string);

        let applied = self.stock.adjust_stock(cmd)?;
        purchase.record_receipt(receipt.purchase_item_id, receipt.quantity, now)?;
        Ok(applied)
    }
}
