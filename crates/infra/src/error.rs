//! Service-level errors and the partial-success batch result.

use serde::Serialize;
use thiserror::Error;

use galley_core::DomainError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Deterministic business failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The record kept changing underneath the write; retries were exhausted.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// The backing store is unusable (poisoned lock).
    #[error("store failure: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::Domain(DomainError::not_found(what))
    }

    pub fn poisoned(what: &str) -> Self {
        ServiceError::Store(format!("{what} lock poisoned"))
    }

    /// Stable machine-readable code, used by transport adapters.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Domain(e) => e.code(),
            ServiceError::Concurrency(_) => "concurrency_conflict",
            ServiceError::Store(_) => "store_error",
        }
    }
}

/// One failed record of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// Position of the record in the request.
    pub index: usize,
    /// Identifier of the record the caller sent (item id, purchase line id).
    pub key: String,
    pub code: &'static str,
    pub message: String,
}

/// Result of a batch that is applied record by record.
///
/// Records are independent: a failure never rolls back earlier successes,
/// so callers must look at both `applied` and `errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome<T> {
    pub applied: Vec<T>,
    pub errors: Vec<BatchError>,
}

impl<T> BatchOutcome<T> {
    pub fn new() -> Self {
        Self {
            applied: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, index: usize, key: impl ToString, error: &ServiceError) {
        self.errors.push(BatchError {
            index,
            key: key.to_string(),
            code: error.code(),
            message: error.to_string(),
        });
    }

    pub fn record(&mut self, index: usize, key: impl ToString, result: ServiceResult<T>) {
        match result {
            Ok(v) => self.applied.push(v),
            Err(e) => self.push_error(index, key, &e),
        }
    }
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_keeps_successes_next_to_failures() {
        let mut outcome: BatchOutcome<u32> = BatchOutcome::new();
        outcome.record(0, "a", Ok(1));
        outcome.record(1, "b", Err(DomainError::validation("bad").into()));
        outcome.record(2, "c", Ok(3));

        assert_eq!(outcome.applied_count(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 1);
        assert_eq!(outcome.errors[0].key, "b");
        assert_eq!(outcome.errors[0].code, "validation_error");
        assert!(!outcome.is_clean());
    }
}
