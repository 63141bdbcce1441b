//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// stock guards, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing/out-of-range field, duplicate unique key).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An adjustment would drive stock below zero.
    #[error("insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: Decimal,
        available: Decimal,
    },

    /// A domain invariant was violated (e.g. illegal status transition).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (resource still in use, stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn insufficient_stock(
        item: impl Into<String>,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        Self::InsufficientStock {
            item: item.into(),
            requested,
            available,
        }
    }

    /// Stable machine-readable code, used by transport adapters.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_item_and_quantities() {
        let err = DomainError::insufficient_stock("flour", Decimal::new(10, 0), Decimal::new(5, 0));
        assert_eq!(
            err.to_string(),
            "insufficient stock for flour: requested 10, available 5"
        );
        assert_eq!(err.code(), "insufficient_stock");
    }
}
