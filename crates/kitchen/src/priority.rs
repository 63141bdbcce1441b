//! Kitchen display ranking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderType};

/// Age tier: 1 up to 10 minutes, 2 up to 15, 3 up to 20, 4 up to 30, 5 beyond.
pub fn priority_tier(age_minutes: i64) -> u8 {
    match age_minutes {
        m if m <= 10 => 1,
        m if m <= 15 => 2,
        m if m <= 20 => 3,
        m if m <= 30 => 4,
        _ => 5,
    }
}

/// Tier by age, plus one for delivery, plus one for more than five items.
pub fn priority_score(order: &Order, now: DateTime<Utc>) -> u8 {
    let age = (now - order.created_at()).num_minutes();
    let mut score = priority_tier(age);
    if order.order_type() == OrderType::Delivery {
        score += 1;
    }
    if order.item_count() > 5 {
        score += 1;
    }
    score
}

/// Active sort mode for the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdsSort {
    /// Oldest first.
    #[default]
    Timestamp,
    /// Highest score first.
    Priority,
    /// Lowest table number first; orders without a table last.
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub priority: u8,
    pub order: Order,
}

/// Non-completed orders, scored at `now` and sorted by `sort`.
///
/// Ties keep placement order.
pub fn kitchen_board(
    orders: impl IntoIterator<Item = Order>,
    sort: KdsSort,
    now: DateTime<Utc>,
) -> Vec<BoardEntry> {
    let mut entries: Vec<BoardEntry> = orders
        .into_iter()
        .filter(|o| !o.is_completed())
        .map(|order| BoardEntry {
            priority: priority_score(&order, now),
            order,
        })
        .collect();
    entries.sort_by_key(|e| (e.order.created_at(), e.order.id_typed()));
    match sort {
        KdsSort::Timestamp => {}
        KdsSort::Priority => entries.sort_by(|a, b| b.priority.cmp(&a.priority)),
        KdsSort::Table => entries.sort_by_key(|e| e.order.table_number().unwrap_or(u32::MAX)),
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::order::tests::order_with;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn late_large_delivery_scores_six() {
        let now = Utc::now();
        let order = order_with(OrderType::Delivery, 6, now - Duration::minutes(25));
        assert_eq!(priority_score(&order, now), 6);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(priority_tier(0), 1);
        assert_eq!(priority_tier(10), 1);
        assert_eq!(priority_tier(11), 2);
        assert_eq!(priority_tier(15), 2);
        assert_eq!(priority_tier(20), 3);
        assert_eq!(priority_tier(30), 4);
        assert_eq!(priority_tier(31), 5);
    }

    #[test]
    fn board_sorts_by_active_mode_and_hides_completed() {
        let now = Utc::now();
        let old = order_with(OrderType::Takeaway, 1, now - Duration::minutes(40));
        let fresh_delivery = order_with(OrderType::Delivery, 7, now - Duration::minutes(2));
        let table = order_with(OrderType::DineIn, 1, now - Duration::minutes(12));
        let mut done = order_with(OrderType::DineIn, 1, now - Duration::minutes(50));
        done.advance(OrderStatus::Completed, now).unwrap();

        let all = vec![old.clone(), fresh_delivery.clone(), table.clone(), done];

        let ids = |board: Vec<BoardEntry>| -> Vec<_> {
            board.into_iter().map(|e| e.order.id_typed()).collect()
        };

        assert_eq!(
            ids(kitchen_board(all.clone(), KdsSort::Timestamp, now)),
            vec![old.id_typed(), table.id_typed(), fresh_delivery.id_typed()]
        );
        // old: tier 5; delivery: 1 + 1 + 1 = 3; table: tier 2.
        assert_eq!(
            ids(kitchen_board(all.clone(), KdsSort::Priority, now)),
            vec![old.id_typed(), fresh_delivery.id_typed(), table.id_typed()]
        );
        assert_eq!(
            ids(kitchen_board(all, KdsSort::Table, now))[0],
            table.id_typed()
        );
    }

    proptest! {
        /// Property: the score is bounded by 1..=7 and never drops as an order ages.
        #[test]
        fn score_is_bounded_and_monotonic_in_age(
            age in 0i64..120,
            extra in 0i64..60,
            lines in 1usize..10,
            delivery in any::<bool>(),
        ) {
            let now = Utc::now();
            let kind = if delivery { OrderType::Delivery } else { OrderType::Takeaway };
            let order = order_with(kind, lines, now - Duration::minutes(age));
            let s = priority_score(&order, now);
            let later = priority_score(&order, now + Duration::minutes(extra));
            prop_assert!((1..=7).contains(&s));
            prop_assert!(later >= s);
        }
    }
}
