//! Chefs, stations and tables, and the workload rules for assignment.

use serde::{Deserialize, Serialize};

use galley_core::{DomainError, DomainResult};

use crate::order::Order;

/// A chef is available below this many in-progress orders.
pub const CHEF_CAPACITY: usize = 3;
/// A station is available below this many in-progress orders.
pub const STATION_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Worker {
    Chef,
    Station,
}

impl Worker {
    pub fn capacity(self) -> usize {
        match self {
            Worker::Chef => CHEF_CAPACITY,
            Worker::Station => STATION_CAPACITY,
        }
    }

    fn assigned<'a>(self, order: &'a Order) -> Option<&'a str> {
        match self {
            Worker::Chef => order.assigned_chef(),
            Worker::Station => order.assigned_station(),
        }
    }
}

/// Orders assigned to `name` that are still `new` or `preparing`.
pub fn workload<'a>(orders: impl IntoIterator<Item = &'a Order>, worker: Worker, name: &str) -> usize {
    orders
        .into_iter()
        .filter(|o| o.status().is_in_progress())
        .filter(|o| worker.assigned(o) == Some(name))
        .count()
}

/// The available candidate with the lowest workload. Ties go to the one
/// listed first.
pub fn least_loaded(candidates: &[String], orders: &[Order], worker: Worker) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for name in candidates {
        let load = workload(orders, worker, name);
        if load >= worker.capacity() {
            continue;
        }
        if best.is_none_or(|(_, b)| load < b) {
            best = Some((name, load));
        }
    }
    best.map(|(name, _)| name.clone())
}

/// Canonical, insertion-ordered roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    chefs: Vec<String>,
    stations: Vec<String>,
    tables: Vec<u32>,
}

impl Roster {
    pub fn new(chefs: Vec<String>, stations: Vec<String>, tables: Vec<u32>) -> DomainResult<Self> {
        let mut roster = Self::default();
        for chef in chefs {
            roster.add(Worker::Chef, chef)?;
        }
        for station in stations {
            roster.add(Worker::Station, station)?;
        }
        for table in tables {
            roster.add_table(table)?;
        }
        Ok(roster)
    }

    pub fn chefs(&self) -> &[String] {
        &self.chefs
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn tables(&self) -> &[u32] {
        &self.tables
    }

    pub fn members(&self, worker: Worker) -> &[String] {
        match worker {
            Worker::Chef => &self.chefs,
            Worker::Station => &self.stations,
        }
    }

    pub fn contains(&self, worker: Worker, name: &str) -> bool {
        self.members(worker).iter().any(|m| m == name)
    }

    pub fn has_table(&self, table: u32) -> bool {
        self.tables.contains(&table)
    }

    pub fn add(&mut self, worker: Worker, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.contains(worker, &name) {
            return Err(DomainError::validation(format!("'{name}' is already listed")));
        }
        match worker {
            Worker::Chef => self.chefs.push(name),
            Worker::Station => self.stations.push(name),
        }
        Ok(())
    }

    /// Remove a chef or station; refused while it still has unfinished orders.
    pub fn remove(&mut self, worker: Worker, name: &str, orders: &[Order]) -> DomainResult<()> {
        if !self.contains(worker, name) {
            return Err(DomainError::not_found(format!("{worker:?} '{name}'")));
        }
        if orders
            .iter()
            .any(|o| !o.is_completed() && worker.assigned(o) == Some(name))
        {
            return Err(DomainError::conflict(format!(
                "'{name}' still has active orders"
            )));
        }
        match worker {
            Worker::Chef => self.chefs.retain(|c| c != name),
            Worker::Station => self.stations.retain(|s| s != name),
        }
        Ok(())
    }

    pub fn add_table(&mut self, table: u32) -> DomainResult<()> {
        if self.has_table(table) {
            return Err(DomainError::validation(format!(
                "table {table} is already listed"
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn remove_table(&mut self, table: u32, orders: &[Order]) -> DomainResult<()> {
        if !self.has_table(table) {
            return Err(DomainError::not_found(format!("table {table}")));
        }
        if orders
            .iter()
            .any(|o| !o.is_completed() && o.table_number() == Some(table))
        {
            return Err(DomainError::conflict(format!(
                "table {table} still has active orders"
            )));
        }
        self.tables.retain(|t| *t != table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::order_with;
    use crate::order::{OrderStatus, OrderType};
    use chrono::Utc;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn assigned(chef: &str, station: &str, status: OrderStatus) -> Order {
        let now = Utc::now();
        let mut o = order_with(OrderType::Takeaway, 1, now);
        o.assign(chef, station, now).unwrap();
        if status != OrderStatus::New {
            o.advance(status, now).unwrap();
        }
        o
    }

    #[test]
    fn workload_counts_new_and_preparing_only() {
        let orders = vec![
            assigned("ana", "grill", OrderStatus::New),
            assigned("ana", "grill", OrderStatus::Preparing),
            assigned("ana", "grill", OrderStatus::Ready),
            assigned("ana", "grill", OrderStatus::Completed),
        ];
        assert_eq!(workload(&orders, Worker::Chef, "ana"), 2);
        assert_eq!(workload(&orders, Worker::Station, "grill"), 2);
    }

    #[test]
    fn least_loaded_breaks_ties_by_roster_order() {
        let chefs = names(&["ana", "ben", "cho"]);
        let orders = vec![assigned("ana", "grill", OrderStatus::New)];
        assert_eq!(least_loaded(&chefs, &orders, Worker::Chef), Some("ben".to_string()));
        assert_eq!(least_loaded(&chefs, &[], Worker::Chef), Some("ana".to_string()));
    }

    #[test]
    fn full_workers_are_unavailable() {
        let chefs = names(&["ana"]);
        let orders: Vec<Order> = (0..CHEF_CAPACITY)
            .map(|_| assigned("ana", "grill", OrderStatus::Preparing))
            .collect();
        assert_eq!(least_loaded(&chefs, &orders, Worker::Chef), None);
        assert_eq!(
            least_loaded(&names(&["grill"]), &orders, Worker::Station),
            Some("grill".to_string())
        );
    }

    #[test]
    fn removal_is_refused_while_orders_are_open() {
        let mut roster = Roster::new(names(&["ana"]), names(&["grill"]), vec![4]).unwrap();
        let open = vec![assigned("ana", "grill", OrderStatus::Ready)];
        assert!(matches!(
            roster.remove(Worker::Chef, "ana", &open),
            Err(DomainError::Conflict(_))
        ));

        let dine_in = vec![order_with(OrderType::DineIn, 1, Utc::now())];
        assert!(matches!(
            roster.remove_table(4, &dine_in),
            Err(DomainError::Conflict(_))
        ));

        roster.remove(Worker::Chef, "ana", &[]).unwrap();
        assert!(roster.chefs().is_empty());
        assert!(roster.add(Worker::Station, "grill").is_err());
    }
}
