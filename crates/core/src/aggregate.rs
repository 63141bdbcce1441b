//! Aggregate root trait and optimistic version checks.

use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
///
/// Every record that is mutated through a service (inventory items, purchases,
/// kitchen orders) carries a version that increases by one per committed write.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_rejects_stale_writer() {
        assert!(ExpectedVersion::Exact(3).check(3).is_ok());
        assert!(matches!(
            ExpectedVersion::Exact(3).check(4),
            Err(DomainError::Conflict(_))
        ));
        assert!(ExpectedVersion::Any.matches(42));
    }
}
