use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{
    AggregateRoot, DomainError, DomainResult, InventoryItemId, TransactionId, WasteId, round_money,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteReason {
    Expired,
    Spoiled,
    Damaged,
    Overproduction,
    Contaminated,
    Other,
}

impl WasteReason {
    pub fn as_str(self) -> &'static str {
        match self {
            WasteReason::Expired => "expired",
            WasteReason::Spoiled => "spoiled",
            WasteReason::Damaged => "damaged",
            WasteReason::Overproduction => "overproduction",
            WasteReason::Contaminated => "contaminated",
            WasteReason::Other => "other",
        }
    }
}

impl core::str::FromStr for WasteReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expired" => Ok(WasteReason::Expired),
            "spoiled" => Ok(WasteReason::Spoiled),
            "damaged" => Ok(WasteReason::Damaged),
            "overproduction" => Ok(WasteReason::Overproduction),
            "contaminated" => Ok(WasteReason::Contaminated),
            "other" => Ok(WasteReason::Other),
            other => Err(DomainError::validation(format!(
                "unknown waste reason '{other}'"
            ))),
        }
    }
}

/// Command: CreateWaste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWaste {
    pub inventory_id: InventoryItemId,
    pub quantity: Decimal,
    pub reason: WasteReason,
    pub notes: Option<String>,
    pub waste_date: NaiveDate,
    pub recorded_by: Option<String>,
}

impl NewWaste {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::validation("waste quantity must be positive"));
        }
        Ok(())
    }
}

/// Partial edit of a waste record. `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WastePatch {
    pub quantity: Option<Decimal>,
    pub reason: Option<WasteReason>,
    pub notes: Option<Option<String>>,
    pub waste_date: Option<NaiveDate>,
}

/// A recorded write-off.
///
/// `unit_cost` is the item's cost when the waste was recorded. Later cost
/// changes on the item never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waste {
    id: WasteId,
    inventory_id: InventoryItemId,
    quantity: Decimal,
    unit_cost: Decimal,
    total_cost: Decimal,
    reason: WasteReason,
    notes: Option<String>,
    waste_date: NaiveDate,
    /// The `waste` ledger row this record produced.
    transaction_id: TransactionId,
    recorded_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Waste {
    pub fn record(
        id: WasteId,
        cmd: &NewWaste,
        unit_cost: Decimal,
        transaction_id: TransactionId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        cmd.validate()?;
        if unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        Ok(Self {
            id,
            inventory_id: cmd.inventory_id,
            quantity: cmd.quantity,
            unit_cost,
            total_cost: round_money(cmd.quantity * unit_cost),
            reason: cmd.reason,
            notes: cmd.notes.clone(),
            waste_date: cmd.waste_date,
            transaction_id,
            recorded_by: cmd.recorded_by.clone(),
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> WasteId {
        self.id
    }

    pub fn inventory_id(&self) -> InventoryItemId {
        self.inventory_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    pub fn reason(&self) -> WasteReason {
        self.reason
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn waste_date(&self) -> NaiveDate {
        self.waste_date
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn recorded_by(&self) -> Option<&str> {
        self.recorded_by.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The new quantity when `patch` changes it, after validation.
    pub fn quantity_change(&self, patch: &WastePatch) -> DomainResult<Option<Decimal>> {
        match patch.quantity {
            Some(q) if q <= Decimal::ZERO => {
                Err(DomainError::validation("waste quantity must be positive"))
            }
            Some(q) if q != self.quantity => Ok(Some(q)),
            _ => Ok(None),
        }
    }

    /// Apply an edit. The total is recomputed from the frozen unit cost.
    pub fn apply_patch(&mut self, patch: &WastePatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(q) = self.quantity_change(patch)? {
            self.quantity = q;
            self.total_cost = round_money(q * self.unit_cost);
        }
        if let Some(reason) = patch.reason {
            self.reason = reason;
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(date) = patch.waste_date {
            self.waste_date = date;
        }
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Waste {
    type Id = WasteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Filters for `listWaste`; the date range is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteFilter {
    pub inventory_id: Option<InventoryItemId>,
    pub reason: Option<WasteReason>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl WasteFilter {
    pub fn matches(&self, w: &Waste) -> bool {
        self.inventory_id.is_none_or(|id| w.inventory_id == id)
            && self.reason.is_none_or(|r| w.reason == r)
            && self.from.is_none_or(|f| w.waste_date >= f)
            && self.to.is_none_or(|t| w.waste_date <= t)
    }
}

pub fn cost_total<'a>(records: impl IntoIterator<Item = &'a Waste>) -> Decimal {
    records.into_iter().map(Waste::total_cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn new_waste(q: Decimal, reason: WasteReason, date: NaiveDate) -> NewWaste {
        NewWaste {
            inventory_id: InventoryItemId::new(),
            quantity: q,
            reason,
            notes: None,
            waste_date: date,
            recorded_by: None,
        }
    }

    fn record(q: Decimal, cost: Decimal) -> Waste {
        Waste::record(
            WasteId::new(),
            &new_waste(q, WasteReason::Spoiled, day(3)),
            cost,
            TransactionId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn total_cost_uses_the_snapshot_cost() {
        let w = record(dec!(20), dec!(2.50));
        assert_eq!(w.total_cost(), dec!(50.00));
        assert_eq!(w.unit_cost(), dec!(2.50));
    }

    #[test]
    fn editing_quantity_recomputes_from_frozen_cost() {
        let mut w = record(dec!(20), dec!(2.50));
        let patch = WastePatch {
            quantity: Some(dec!(8)),
            notes: Some(Some("dropped tray".to_string())),
            ..WastePatch::default()
        };
        assert_eq!(w.quantity_change(&patch).unwrap(), Some(dec!(8)));
        w.apply_patch(&patch, Utc::now()).unwrap();
        assert_eq!(w.total_cost(), dec!(20.00));
        assert_eq!(w.notes(), Some("dropped tray"));
        assert_eq!(w.version(), 2);
    }

    #[test]
    fn unchanged_or_invalid_quantity() {
        let w = record(dec!(5), dec!(1));
        let same = WastePatch {
            quantity: Some(dec!(5)),
            ..WastePatch::default()
        };
        assert_eq!(w.quantity_change(&same).unwrap(), None);

        let zero = WastePatch {
            quantity: Some(Decimal::ZERO),
            ..WastePatch::default()
        };
        assert!(w.quantity_change(&zero).is_err());
        assert!(new_waste(dec!(-1), WasteReason::Other, day(1)).validate().is_err());
    }

    #[test]
    fn filter_by_range_and_total() {
        let records: Vec<Waste> = [(dec!(2), day(1)), (dec!(3), day(5)), (dec!(4), day(9))]
            .into_iter()
            .map(|(q, d)| {
                Waste::record(
                    WasteId::new(),
                    &new_waste(q, WasteReason::Expired, d),
                    dec!(1.25),
                    TransactionId::new(),
                    Utc::now(),
                )
                .unwrap()
            })
            .collect();

        let filter = WasteFilter {
            from: Some(day(2)),
            to: Some(day(9)),
            ..WasteFilter::default()
        };
        let hits: Vec<_> = records.iter().filter(|w| filter.matches(w)).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(cost_total(hits), dec!(8.75));
        assert_eq!("Spoiled".parse::<WasteReason>().unwrap(), WasteReason::Spoiled);
    }
}
