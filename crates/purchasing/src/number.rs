//! Sequential purchase numbers: `PO-YYYYMMDD-NNNN`, restarting every day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use galley_core::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseNumber(String);

impl PurchaseNumber {
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("PO-{}-{:04}", date.format("%Y%m%d"), sequence))
    }

    pub fn parse(raw: &str) -> DomainResult<(NaiveDate, u32)> {
        let invalid = || DomainError::validation(format!("malformed purchase number '{raw}'"));
        let rest = raw.strip_prefix("PO-").ok_or_else(invalid)?;
        let (date, seq) = rest.split_once('-').ok_or_else(invalid)?;
        let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
        if seq.len() < 4 {
            return Err(invalid());
        }
        let seq: u32 = seq.parse().map_err(|_| invalid())?;
        Ok((date, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PurchaseNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Next number for `date`, given every number issued so far.
pub fn next_purchase_number<'a>(
    issued: impl IntoIterator<Item = &'a PurchaseNumber>,
    date: NaiveDate,
) -> PurchaseNumber {
    let last = issued
        .into_iter()
        .filter_map(|n| PurchaseNumber::parse(n.as_str()).ok())
        .filter(|(d, _)| *d == date)
        .map(|(_, seq)| seq)
        .max()
        .unwrap_or(0);
    PurchaseNumber::new(date, last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn numbering_is_sequential_per_day() {
        let mut issued = Vec::new();
        for _ in 0..3 {
            let n = next_purchase_number(&issued, day(4));
            issued.push(n);
        }
        assert_eq!(issued[2].as_str(), "PO-20260504-0003");

        let other = next_purchase_number(&issued, day(5));
        assert_eq!(other.as_str(), "PO-20260505-0001");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(PurchaseNumber::parse("PO-2026-1").is_err());
        assert!(PurchaseNumber::parse("INV-20260504-0001").is_err());
        assert_eq!(
            PurchaseNumber::parse("PO-20260504-0042").unwrap(),
            (day(4), 42)
        );
    }
}
