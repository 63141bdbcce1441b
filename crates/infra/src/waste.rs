//! Waste Recording Service.
//!
//! Known inconsistency, kept on purpose: editing a waste record rewrites its
//! original `waste` ledger row in place, while deleting one appends a
//! compensating `adjustment` row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use galley_core::{AggregateRoot, DomainError, ExpectedVersion, WasteId};
use galley_inventory::{
    AdjustStock, Reference, ReferenceKind, StockChange, TransactionType,
};
use galley_waste::{NewWaste, Waste, WasteFilter, WastePatch, cost_total};

use crate::error::{BatchOutcome, ServiceResult};
use crate::stock::StockService;
use crate::store::{LockTable, Repository};

pub struct WasteService {
    stock: Arc<StockService>,
    records: Repository<Waste>,
    locks: LockTable<WasteId>,
}

impl WasteService {
    pub fn new(stock: Arc<StockService>) -> Self {
        Self {
            stock,
            records: Repository::new("waste"),
            locks: LockTable::new(),
        }
    }

    /// Record waste: snapshot the item's unit cost, then book a `waste` row.
    pub fn create_waste(&self, cmd: NewWaste, now: DateTime<Utc>) -> ServiceResult<Waste> {
        cmd.validate()?;
        let item = self.stock.get_item(cmd.inventory_id)?;
        if item.current_stock() < cmd.quantity {
            return Err(DomainError::insufficient_stock(
                item.name(),
                cmd.quantity,
                item.current_stock(),
            )
            .into());
        }
        let unit_cost = item.cost_per_unit();
        let id = WasteId::new();

        let mut adjust = AdjustStock::new(
            cmd.inventory_id,
            StockChange::Decrease(cmd.quantity),
            TransactionType::Waste,
            now,
        )
        .with_reference(Reference::new(ReferenceKind::Waste, id))
        .with_reason(cmd.reason.as_str())
        .with_unit_cost(unit_cost);
        adjust.performed_by = cmd.recorded_by.clone();

        let applied = self.stock.adjust_stock(adjust)?;
        let waste = Waste::record(id, &cmd, unit_cost, applied.transaction.id, now)?;
        self.records.insert(waste.clone())?;

        tracing::info!(
            waste_id = %id,
            item_id = %cmd.inventory_id,
            quantity = %cmd.quantity,
            reason = cmd.reason.as_str(),
            total_cost = %waste.total_cost(),
            "waste recorded"
        );
        Ok(waste)
    }

    /// Edit a record. A quantity change moves stock by the difference and
    /// rewrites the original ledger row.
    pub fn update_waste(
        &self,
        id: WasteId,
        patch: WastePatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<Waste> {
        self.locks.with_lock(&id, || {
            let mut waste = self.records.load(&id)?;
            let loaded = waste.version();
            if let Some(quantity) = waste.quantity_change(&patch)? {
                self.stock
                    .amend_transaction(waste.transaction_id(), quantity, now)?;
            }
            waste.apply_patch(&patch, now)?;
            self.records
                .commit(waste.clone(), ExpectedVersion::Exact(loaded))?;
            tracing::info!(waste_id = %id, quantity = %waste.quantity(), "waste updated");
            Ok(waste)
        })?
    }

    /// Delete a record and give its stock back through a new `adjustment` row.
    pub fn delete_waste(
        &self,
        id: WasteId,
        performed_by: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<Waste> {
        self.locks.with_lock(&id, || {
            let waste = self.records.load(&id)?;
            let mut adjust = AdjustStock::new(
                waste.inventory_id(),
                StockChange::Increase(waste.quantity()),
                TransactionType::Adjustment,
                now,
            )
            .with_reference(Reference::new(ReferenceKind::Waste, id))
            .with_reason("waste record deleted")
            .with_unit_cost(waste.unit_cost());
            adjust.performed_by = performed_by;

            self.stock.adjust_stock(adjust)?;
            let removed = self
                .records
                .remove(&id, ExpectedVersion::Exact(waste.version()))?;
            tracing::info!(waste_id = %id, quantity = %removed.quantity(), "waste deleted; stock restored");
            Ok(removed)
        })?
    }

    /// Import records one by one; failures do not undo earlier records.
    pub fn bulk_import(&self, records: Vec<NewWaste>, now: DateTime<Utc>) -> BatchOutcome<Waste> {
        let mut outcome = BatchOutcome::new();
        for (index, cmd) in records.into_iter().enumerate() {
            let key = cmd.inventory_id;
            outcome.record(index, key, self.create_waste(cmd, now));
        }
        if !outcome.is_clean() {
            tracing::warn!(
                applied = outcome.applied_count(),
                failed = outcome.errors.len(),
                "waste import partially applied"
            );
        }
        outcome
    }

    pub fn get_waste(&self, id: WasteId) -> ServiceResult<Waste> {
        self.records.load(&id)
    }

    /// Most recent waste date first.
    pub fn list_waste(&self, filter: &WasteFilter) -> ServiceResult<Vec<Waste>> {
        let mut rows: Vec<Waste> = self
            .records
            .list()?
            .into_iter()
            .filter(|w| filter.matches(w))
            .collect();
        rows.sort_by(|a, b| {
            b.waste_date()
                .cmp(&a.waste_date())
                .then(b.created_at().cmp(&a.created_at()))
        });
        Ok(rows)
    }

    pub fn cost_total(&self, filter: &WasteFilter) -> ServiceResult<Decimal> {
        Ok(cost_total(&self.list_waste(filter)?))
    }
}
