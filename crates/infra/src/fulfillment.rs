//! Order Fulfillment Coordinator.
//!
//! Owns kitchen orders and the chef/station/table roster. Stock deduction
//! is a separate, explicit call (`deduct_stock_from_order`); placing or
//! completing an order never touches stock on its own.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use galley_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, OrderId, RecipeId};
use galley_inventory::{
    AdjustStock, AdjustmentResult, Reference, ReferenceKind, StockChange, TransactionType,
};
use galley_kitchen::{
    BoardEntry, KdsSort, KitchenEvent, NewOrder, Order, OrderLine, OrderStatus, RecipeCatalog,
    Roster, Worker, kitchen_board, least_loaded, plan_deduction, price_order, workload,
};

use crate::error::{BatchError, ServiceError, ServiceResult};
use crate::publisher::EventPublisher;
use crate::settings::SettingsStore;
use crate::stock::{InventoryLookup, StockService};
use crate::store::{LockTable, Repository};

const AGGREGATE: &str = "kitchen.order";

/// An ingredient that matched no active inventory item. No stock moved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedIngredient {
    pub recipe_id: RecipeId,
    pub ingredient: String,
    pub quantity: Decimal,
}

/// Result of `deduct_stock_from_order`.
///
/// Best effort: unmatched ingredients and missing recipes are skipped, not
/// errors, so stock can drift from what the kitchen really used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionOutcome {
    pub applied: Vec<AdjustmentResult>,
    pub unmatched: Vec<UnmatchedIngredient>,
    pub missing_recipes: Vec<RecipeId>,
    pub errors: Vec<BatchError>,
}

pub struct FulfillmentCoordinator {
    orders: Repository<Order>,
    roster: RwLock<Roster>,
    recipes: Arc<dyn RecipeCatalog>,
    inventory: Arc<dyn InventoryLookup>,
    stock: Arc<StockService>,
    settings: Arc<SettingsStore>,
    locks: LockTable<OrderId>,
    assigning: Mutex<()>,
    events: EventPublisher,
}

impl FulfillmentCoordinator {
    pub fn new(
        roster: Roster,
        recipes: Arc<dyn RecipeCatalog>,
        inventory: Arc<dyn InventoryLookup>,
        stock: Arc<StockService>,
        settings: Arc<SettingsStore>,
        events: EventPublisher,
    ) -> Self {
        Self {
            orders: Repository::new("order"),
            roster: RwLock::new(roster),
            recipes,
            inventory,
            stock,
            settings,
            locks: LockTable::new(),
            assigning: Mutex::new(()),
            events,
        }
    }

    fn roster_read(&self) -> ServiceResult<std::sync::RwLockReadGuard<'_, Roster>> {
        self.roster.read().map_err(|_| ServiceError::poisoned("roster"))
    }

    fn roster_write(&self) -> ServiceResult<std::sync::RwLockWriteGuard<'_, Roster>> {
        self.roster.write().map_err(|_| ServiceError::poisoned("roster"))
    }

    /// Place an order, pricing it from the recipe catalog and current settings.
    pub fn create_order(&self, cmd: NewOrder, now: DateTime<Utc>) -> ServiceResult<Order> {
        cmd.validate()?;
        if let Some(table) = cmd.table_number {
            if !self.roster_read()?.has_table(table) {
                return Err(DomainError::validation(format!("unknown table {table}")).into());
            }
        }

        let mut lines = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let recipe = self
                .recipes
                .recipe(line.recipe_id)
                .ok_or_else(|| ServiceError::not_found(format!("recipe {}", line.recipe_id)))?;
            if !recipe.is_active {
                return Err(DomainError::validation(format!(
                    "recipe '{}' is not available",
                    recipe.name
                ))
                .into());
            }
            lines.push(OrderLine {
                recipe_id: recipe.id,
                name: recipe.name,
                quantity: line.quantity,
                unit_price: recipe.price,
            });
        }

        let totals = price_order(&lines, cmd.order_type, self.settings.pricing()?)?;
        let order = Order::place(OrderId::new(), &cmd, lines, totals, now)?;
        self.orders.insert(order.clone())?;

        tracing::info!(
            order_id = %order.id_typed(),
            order_type = order.order_type().as_str(),
            items = order.item_count(),
            total = %order.totals().total,
            "order placed"
        );
        self.publish(
            &order,
            KitchenEvent::OrderPlaced {
                order_id: order.id_typed(),
                order_type: order.order_type(),
                table_number: order.table_number(),
                total: order.totals().total,
                occurred_at: now,
            },
        );
        Ok(order)
    }

    pub fn get_order(&self, id: OrderId) -> ServiceResult<Order> {
        self.orders.load(&id)
    }

    /// Oldest first.
    pub fn list_orders(&self, status: Option<OrderStatus>) -> ServiceResult<Vec<Order>> {
        let mut rows: Vec<Order> = self
            .orders
            .list()?
            .into_iter()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .collect();
        rows.sort_by_key(|o| (o.created_at(), o.id_typed()));
        Ok(rows)
    }

    pub fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let (order, from) = self.mutate(id, |o| {
            let from = o.status();
            o.advance(status, now)?;
            Ok(from)
        })?;
        tracing::info!(order_id = %id, from = from.as_str(), to = status.as_str(), "order status changed");
        self.publish(
            &order,
            KitchenEvent::StatusChanged {
                order_id: id,
                from,
                to: status,
                occurred_at: now,
            },
        );
        Ok(order)
    }

    /// Jump straight to `completed` from any earlier state.
    pub fn complete_order(&self, id: OrderId, now: DateTime<Utc>) -> ServiceResult<Order> {
        self.set_status(id, OrderStatus::Completed, now)
    }

    pub fn assign(
        &self,
        id: OrderId,
        chef: &str,
        station: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Order> {
        let roster = self.roster_read()?;
        if !roster.contains(Worker::Chef, chef) {
            return Err(DomainError::validation(format!("unknown chef '{chef}'")).into());
        }
        if !roster.contains(Worker::Station, station) {
            return Err(DomainError::validation(format!("unknown station '{station}'")).into());
        }
        let (order, ()) = self.mutate(id, |o| o.assign(chef, station, now))?;
        drop(roster);
        self.announce_assignment(&order, now);
        Ok(order)
    }

    /// Pick the available chef and station with the fewest in-progress orders.
    pub fn auto_assign(&self, id: OrderId, now: DateTime<Utc>) -> ServiceResult<Order> {
        let _assigning = self
            .assigning
            .lock()
            .map_err(|_| ServiceError::poisoned("assignment"))?;
        let roster = self.roster_read()?;
        let others: Vec<Order> = self
            .orders
            .list()?
            .into_iter()
            .filter(|o| o.id_typed() != id)
            .collect();

        let chef = least_loaded(roster.chefs(), &others, Worker::Chef)
            .ok_or_else(|| ServiceError::from(DomainError::conflict("no chef is available")))?;
        let station = least_loaded(roster.stations(), &others, Worker::Station)
            .ok_or_else(|| ServiceError::from(DomainError::conflict("no station is available")))?;

        let (order, ()) = self.mutate(id, |o| o.assign(chef.as_str(), station.as_str(), now))?;
        drop(roster);
        tracing::info!(order_id = %id, chef = %chef, station = %station, "order auto-assigned");
        self.announce_assignment(&order, now);
        Ok(order)
    }

    pub fn unassign(&self, id: OrderId, now: DateTime<Utc>) -> ServiceResult<Order> {
        let (order, ()) = self.mutate(id, |o| {
            o.unassign(now);
            Ok(())
        })?;
        self.publish(
            &order,
            KitchenEvent::Unassigned {
                order_id: id,
                occurred_at: now,
            },
        );
        Ok(order)
    }

    pub fn toggle_urgent(&self, id: OrderId, now: DateTime<Utc>) -> ServiceResult<Order> {
        let (order, urgent) = self.mutate(id, |o| Ok(o.toggle_urgent(now)))?;
        tracing::info!(order_id = %id, urgent, "order urgency toggled");
        self.publish(
            &order,
            KitchenEvent::UrgencyToggled {
                order_id: id,
                urgent,
                occurred_at: now,
            },
        );
        Ok(order)
    }

    /// What a kitchen display shows right now. Safe to poll.
    pub fn kitchen_board(&self, sort: KdsSort, now: DateTime<Utc>) -> ServiceResult<Vec<BoardEntry>> {
        Ok(kitchen_board(self.orders.list()?, sort, now))
    }

    pub fn workload(&self, worker: Worker, name: &str) -> ServiceResult<usize> {
        if !self.roster_read()?.contains(worker, name) {
            return Err(ServiceError::not_found(format!("{worker:?} '{name}'")));
        }
        Ok(workload(&self.orders.list()?, worker, name))
    }

    pub fn roster(&self) -> ServiceResult<Roster> {
        Ok(self.roster_read()?.clone())
    }

    pub fn add_to_roster(&self, worker: Worker, name: &str) -> ServiceResult<Roster> {
        let mut roster = self.roster_write()?;
        roster.add(worker, name)?;
        Ok(roster.clone())
    }

    pub fn remove_from_roster(&self, worker: Worker, name: &str) -> ServiceResult<Roster> {
        let mut roster = self.roster_write()?;
        roster.remove(worker, name, &self.orders.list()?)?;
        Ok(roster.clone())
    }

    pub fn add_table(&self, table: u32) -> ServiceResult<Roster> {
        let mut roster = self.roster_write()?;
        roster.add_table(table)?;
        Ok(roster.clone())
    }

    pub fn remove_table(&self, table: u32) -> ServiceResult<Roster> {
        let mut roster = self.roster_write()?;
        roster.remove_table(table, &self.orders.list()?)?;
        Ok(roster.clone())
    }

    /// Consume recipe ingredients from stock for every line of the order.
    ///
    /// Ingredients are matched to inventory items by name, ignoring case. An
    /// ingredient with no match is skipped with a warning and reported in
    /// `unmatched`; nothing fails. Each match is its own `sale` adjustment,
    /// so a failed one (e.g. insufficient stock) leaves the others applied.
    /// Calling this twice deducts twice.
    pub fn deduct_stock_from_order(
        &self,
        id: OrderId,
        performed_by: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<DeductionOutcome> {
        let order = self.orders.load(&id)?;
        let plan = plan_deduction(&order, self.recipes.as_ref());
        for recipe_id in &plan.missing_recipes {
            tracing::warn!(order_id = %id, %recipe_id, "recipe missing; line skipped during deduction");
        }

        let mut outcome = DeductionOutcome {
            applied: Vec::new(),
            unmatched: Vec::new(),
            missing_recipes: plan.missing_recipes,
            errors: Vec::new(),
        };

        for (index, demand) in plan.demands.into_iter().enumerate() {
            let item = match self.inventory.find_active_by_name(&demand.ingredient) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    tracing::warn!(
                        order_id = %id,
                        ingredient = %demand.ingredient,
                        quantity = %demand.quantity,
                        "ingredient matches no inventory item; stock not deducted"
                    );
                    self.publish(
                        &order,
                        KitchenEvent::IngredientUnmatched {
                            order_id: id,
                            recipe_id: demand.recipe_id,
                            ingredient: demand.ingredient.clone(),
                            quantity: demand.quantity,
                            occurred_at: now,
                        },
                    );
                    outcome.unmatched.push(UnmatchedIngredient {
                        recipe_id: demand.recipe_id,
                        ingredient: demand.ingredient,
                        quantity: demand.quantity,
                    });
                    continue;
                }
                Err(e) => {
                    outcome.errors.push(batch_error(index, &demand.ingredient, &e));
                    continue;
                }
            };

            let mut cmd = AdjustStock::new(
                item.id_typed(),
                StockChange::Decrease(demand.quantity),
                TransactionType::Sale,
                now,
            )
            .with_reference(Reference::new(ReferenceKind::Order, id))
            .with_reason(format!("ingredient '{}'", demand.ingredient));
            cmd.performed_by = performed_by.clone();

            match self.stock.adjust_stock(cmd) {
                Ok(applied) => outcome.applied.push(applied),
                Err(e) => {
                    tracing::warn!(
                        order_id = %id,
                        ingredient = %demand.ingredient,
                        error = %e,
                        "ingredient deduction failed"
                    );
                    outcome.errors.push(batch_error(index, &demand.ingredient, &e));
                }
            }
        }

        tracing::info!(
            order_id = %id,
            applied = outcome.applied.len(),
            unmatched = outcome.unmatched.len(),
            failed = outcome.errors.len(),
            "order stock deduction finished"
        );
        Ok(outcome)
    }

    fn mutate<R>(
        &self,
        id: OrderId,
        f: impl FnOnce(&mut Order) -> DomainResult<R>,
    ) -> ServiceResult<(Order, R)> {
        self.locks.with_lock(&id, || {
            let mut order = self.orders.load(&id)?;
            let loaded = order.version();
            let r = f(&mut order)?;
            self.orders
                .commit(order.clone(), ExpectedVersion::Exact(loaded))?;
            Ok((order, r))
        })?
    }

    fn announce_assignment(&self, order: &Order, now: DateTime<Utc>) {
        if let Some(a) = order.assignment() {
            self.publish(
                order,
                KitchenEvent::Assigned {
                    order_id: order.id_typed(),
                    chef: a.chef.clone(),
                    station: a.station.clone(),
                    occurred_at: now,
                },
            );
        }
    }

    fn publish(&self, order: &Order, event: KitchenEvent) {
        self.events
            .publish(*order.id_typed().as_uuid(), AGGREGATE, order.version(), &event);
    }
}

fn batch_error(index: usize, key: &str, error: &ServiceError) -> BatchError {
    BatchError {
        index,
        key: key.to_string(),
        code: error.code(),
        message: error.to_string(),
    }
}
