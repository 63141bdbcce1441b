//! Stock alerts: stateless queries recomputed from item state on every call.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// Items at or below their minimum stock (includes out-of-stock items).
pub fn low_stock(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    items
        .iter()
        .filter(|i| i.is_active() && i.is_low_stock())
        .collect()
}

/// Items with nothing left.
pub fn out_of_stock(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    items
        .iter()
        .filter(|i| i.is_active() && i.is_out_of_stock())
        .collect()
}

/// Items whose expiry falls in `[today, today + days]`, soonest first.
pub fn expiring_soon(items: &[InventoryItem], today: NaiveDate, days: u32) -> Vec<&InventoryItem> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let mut hits: Vec<&InventoryItem> = items
        .iter()
        .filter(|i| i.is_active())
        .filter(|i| matches!(i.expiry_date(), Some(d) if d >= today && d <= horizon))
        .collect();
    hits.sort_by_key(|i| i.expiry_date());
    hits
}

/// Items already past their expiry date.
pub fn expired(items: &[InventoryItem], today: NaiveDate) -> Vec<&InventoryItem> {
    items
        .iter()
        .filter(|i| i.is_active())
        .filter(|i| matches!(i.expiry_date(), Some(d) if d < today))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

pub fn alert_summary(items: &[InventoryItem], today: NaiveDate, days: u32) -> AlertSummary {
    AlertSummary {
        low_stock: low_stock(items).len(),
        out_of_stock: out_of_stock(items).len(),
        expiring_soon: expiring_soon(items, today, days).len(),
        expired: expired(items, today).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::{AdjustStock, StockChange, plan_adjustment};
    use crate::item::NewItem;
    use crate::transaction::TransactionType;
    use chrono::Utc;
    use galley_core::InventoryItemId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(name: &str, stock: Decimal, min: Decimal, expiry: Option<NaiveDate>) -> InventoryItem {
        let mut item = InventoryItem::create(
            InventoryItemId::new(),
            &NewItem {
                name: name.to_string(),
                category: "misc".to_string(),
                unit: "pcs".to_string(),
                min_stock: min,
                expiry_date: expiry,
                ..NewItem::default()
            },
            Utc::now(),
        )
        .unwrap();
        if stock > Decimal::ZERO {
            let tx = plan_adjustment(
                &item,
                &AdjustStock::new(
                    item.id_typed(),
                    StockChange::Increase(stock),
                    TransactionType::Purchase,
                    Utc::now(),
                ),
            )
            .unwrap();
            item.apply_transaction(&tx).unwrap();
        }
        item
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn low_stock_is_inclusive_of_the_minimum() {
        let items = vec![
            item("at-min", dec!(10), dec!(10), None),
            item("above", dec!(11), dec!(10), None),
            item("empty", dec!(0), dec!(0), None),
        ];
        let names: Vec<_> = low_stock(&items).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["at-min", "empty"]);
        let names: Vec<_> = out_of_stock(&items).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["empty"]);
    }

    #[test]
    fn expiring_window_includes_both_ends() {
        let today = date(2026, 3, 10);
        let items = vec![
            item("today", dec!(1), dec!(0), Some(date(2026, 3, 10))),
            item("edge", dec!(1), dec!(0), Some(date(2026, 3, 17))),
            item("later", dec!(1), dec!(0), Some(date(2026, 3, 18))),
            item("gone", dec!(1), dec!(0), Some(date(2026, 3, 9))),
            item("none", dec!(1), dec!(0), None),
        ];

        let names: Vec<_> = expiring_soon(&items, today, 7).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["today", "edge"]);

        let names: Vec<_> = expired(&items, today).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["gone"]);

        let summary = alert_summary(&items, today, 7);
        assert_eq!(summary.expiring_soon, 2);
        assert_eq!(summary.expired, 1);
    }

    #[test]
    fn inactive_items_never_alert() {
        let mut gone = item("retired", dec!(0), dec!(5), None);
        gone.deactivate(Utc::now()).unwrap();
        assert!(low_stock(&[gone]).is_empty());
    }
}
