//! Item listing and ledger filtering over already-loaded records.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{Page, Paginated, SupplierId};

use crate::alerts;
use crate::item::InventoryItem;
use crate::transaction::{StockTransaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    LowStock,
    OutOfStock,
    /// Not soft-deleted.
    Active,
    /// Soft-deleted items only.
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortBy {
    #[default]
    Name,
    Category,
    CurrentStock,
    CostPerUnit,
    StockValue,
    ExpiryDate,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filters for `listItems`. Soft-deleted items are hidden unless `status`
/// is `Inactive`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub status: Option<StockStatus>,
    pub expiring_within_days: Option<u32>,
    pub sort_by: ItemSortBy,
    pub sort_order: SortOrder,
    pub page: Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub total_items: usize,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListing {
    pub items: Paginated<InventoryItem>,
    /// Computed over the whole filtered set, before pagination.
    pub summary: ItemSummary,
}

pub fn list_items(all: Vec<InventoryItem>, filter: &ItemFilter, today: NaiveDate) -> ItemListing {
    let needle = filter
        .search
        .as_ref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let category = filter.category.as_ref().map(|c| c.to_lowercase());

    let expiring: Option<HashSet<_>> = filter.expiring_within_days.map(|days| {
        alerts::expiring_soon(&all, today, days)
            .iter()
            .map(|i| i.id_typed())
            .collect()
    });

    let mut rows: Vec<InventoryItem> = all
        .iter()
        .filter(|i| match filter.status {
            Some(StockStatus::Inactive) => !i.is_active(),
            _ => i.is_active(),
        })
        .filter(|i| match filter.status {
            Some(StockStatus::LowStock) => i.is_low_stock(),
            Some(StockStatus::OutOfStock) => i.is_out_of_stock(),
            _ => true,
        })
        .filter(|i| match &needle {
            Some(n) => {
                i.name().to_lowercase().contains(n)
                    || i.sku().is_some_and(|s| s.to_lowercase().contains(n))
            }
            None => true,
        })
        .filter(|i| match &category {
            Some(c) => i.category().to_lowercase() == *c,
            None => true,
        })
        .filter(|i| match filter.supplier_id {
            Some(s) => i.supplier_id() == Some(s),
            None => true,
        })
        .filter(|i| match &expiring {
            Some(ids) => ids.contains(&i.id_typed()),
            None => true,
        })
        .cloned()
        .collect();

    rows.sort_by(|a, b| {
        let ord = match filter.sort_by {
            ItemSortBy::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
            ItemSortBy::Category => a.category().cmp(b.category()),
            ItemSortBy::CurrentStock => a.current_stock().cmp(&b.current_stock()),
            ItemSortBy::CostPerUnit => a.cost_per_unit().cmp(&b.cost_per_unit()),
            ItemSortBy::StockValue => a.stock_value().cmp(&b.stock_value()),
            ItemSortBy::ExpiryDate => a.expiry_date().cmp(&b.expiry_date()),
            ItemSortBy::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        match filter.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let summary = ItemSummary {
        total_items: rows.len(),
        low_stock_count: rows.iter().filter(|i| i.is_low_stock()).count(),
        out_of_stock_count: rows.iter().filter(|i| i.is_out_of_stock()).count(),
        total_value: rows.iter().map(|i| i.stock_value()).sum(),
    };

    ItemListing {
        items: filter.page.apply(rows),
        summary,
    }
}

/// Filters for `listTransactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Page,
}

/// Filter one item's ledger rows; newest first.
pub fn filter_transactions(
    rows: Vec<StockTransaction>,
    filter: &TransactionFilter,
) -> Paginated<StockTransaction> {
    let mut rows: Vec<StockTransaction> = rows
        .into_iter()
        .filter(|t| filter.kind.is_none_or(|k| t.kind == k))
        .filter(|t| filter.from.is_none_or(|f| t.created_at >= f))
        .filter(|t| filter.to.is_none_or(|to| t.created_at <= to))
        .collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    filter.page.apply(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::{AdjustStock, StockChange, plan_adjustment};
    use crate::item::{ItemPatch, NewItem};
    use chrono::Duration;
    use galley_core::InventoryItemId;
    use rust_decimal_macros::dec;

    fn stocked(name: &str, category: &str, stock: Decimal, min: Decimal, cost: Decimal) -> InventoryItem {
        let mut item = InventoryItem::create(
            InventoryItemId::new(),
            &NewItem {
                name: name.to_string(),
                sku: Some(format!("SKU-{}", name.to_uppercase())),
                category: category.to_string(),
                unit: "kg".to_string(),
                min_stock: min,
                cost_per_unit: cost,
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

    fn pantry() -> Vec<InventoryItem> {
        vec![
            stocked("butter", "dairy", dec!(4), dec!(5), dec!(6.00)),
            stocked("milk", "dairy", dec!(0), dec!(2), dec!(1.10)),
            stocked("rice", "dry", dec!(50), dec!(10), dec!(1.50)),
        ]
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn summary_counts_the_filtered_set() {
        let listing = list_items(pantry(), &ItemFilter::default(), today());
        assert_eq!(listing.summary.total_items, 3);
        assert_eq!(listing.summary.low_stock_count, 2);
        assert_eq!(listing.summary.out_of_stock_count, 1);
        assert_eq!(listing.summary.total_value, dec!(99.00));

        let names: Vec<_> = listing.items.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["butter", "milk", "rice"]);
    }

    #[test]
    fn category_and_status_filters_combine() {
        let filter = ItemFilter {
            category: Some("DAIRY".to_string()),
            status: Some(StockStatus::OutOfStock),
            ..ItemFilter::default()
        };
        let listing = list_items(pantry(), &filter, today());
        assert_eq!(listing.items.total, 1);
        assert_eq!(listing.items.items[0].name(), "milk");
    }

    #[test]
    fn search_matches_sku_and_sort_desc_by_stock() {
        let filter = ItemFilter {
            search: Some("sku-".to_string()),
            sort_by: ItemSortBy::CurrentStock,
            sort_order: SortOrder::Desc,
            ..ItemFilter::default()
        };
        let listing = list_items(pantry(), &filter, today());
        let names: Vec<_> = listing.items.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["rice", "butter", "milk"]);
    }

    #[test]
    fn soft_deleted_items_only_show_under_inactive() {
        let mut items = pantry();
        items[2].deactivate(Utc::now()).unwrap();

        let listing = list_items(items.clone(), &ItemFilter::default(), today());
        assert_eq!(listing.items.total, 2);

        let filter = ItemFilter {
            status: Some(StockStatus::Inactive),
            ..ItemFilter::default()
        };
        let listing = list_items(items, &filter, today());
        assert_eq!(listing.items.total, 1);
        assert_eq!(listing.items.items[0].name(), "rice");
    }

    #[test]
    fn expiring_filter_keeps_only_items_inside_the_window() {
        let mut items = pantry();
        for (item, days) in items.iter_mut().zip([3, 30, -1]) {
            item.apply_patch(
                &ItemPatch {
                    expiry_date: Some(Some(today() + Duration::days(days))),
                    ..ItemPatch::default()
                },
                Utc::now(),
            )
            .unwrap();
        }

        let filter = ItemFilter {
            expiring_within_days: Some(7),
            ..ItemFilter::default()
        };
        let listing = list_items(items, &filter, today());
        assert_eq!(listing.items.total, 1);
        assert_eq!(listing.items.items[0].name(), "butter");
    }

    #[test]
    fn transactions_filter_by_type_and_window() {
        let item = stocked("oil", "dry", dec!(0), dec!(0), dec!(3));
        let base = Utc::now();
        let mut rows = Vec::new();
        let mut current = item.clone();
        for (i, (kind, change)) in [
            (TransactionType::Purchase, StockChange::Increase(dec!(10))),
            (TransactionType::Sale, StockChange::Decrease(dec!(2))),
            (TransactionType::Sale, StockChange::Decrease(dec!(3))),
        ]
        .into_iter()
        .enumerate()
        {
            let at = base + Duration::minutes(i as i64);
            let tx = plan_adjustment(&current, &AdjustStock::new(current.id_typed(), change, kind, at)).unwrap();
            current.apply_transaction(&tx).unwrap();
            rows.push(tx);
        }

        let page = filter_transactions(
            rows.clone(),
            &TransactionFilter {
                kind: Some(TransactionType::Sale),
                ..TransactionFilter::default()
            },
        );
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].quantity, dec!(3));

        let page = filter_transactions(
            rows,
            &TransactionFilter {
                to: Some(base),
                ..TransactionFilter::default()
            },
        );
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].kind, TransactionType::Purchase);
    }
}
