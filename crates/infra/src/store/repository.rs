use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use galley_core::{AggregateRoot, DomainError, ExpectedVersion};

use crate::error::{ServiceError, ServiceResult};

/// In-memory versioned record store.
///
/// Writes replace a whole record and must name the version they were
/// computed from; a stale writer gets `ServiceError::Concurrency`.
#[derive(Debug)]
pub struct Repository<V: AggregateRoot> {
    name: &'static str,
    rows: RwLock<HashMap<V::Id, V>>,
}

impl<V> Repository<V>
where
    V: AggregateRoot + Clone,
    V::Id: Clone + Eq + Hash + core::fmt::Display,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: &V::Id) -> ServiceResult<Option<V>> {
        let rows = self.rows.read().map_err(|_| ServiceError::poisoned(self.name))?;
        Ok(rows.get(id).cloned())
    }

    /// Like [`Repository::get`], but a missing record is `NotFound`.
    pub fn load(&self, id: &V::Id) -> ServiceResult<V> {
        self.get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("{} {id}", self.name)))
    }

    pub fn list(&self) -> ServiceResult<Vec<V>> {
        let rows = self.rows.read().map_err(|_| ServiceError::poisoned(self.name))?;
        Ok(rows.values().cloned().collect())
    }

    pub fn insert(&self, value: V) -> ServiceResult<()> {
        let mut rows = self.rows.write().map_err(|_| ServiceError::poisoned(self.name))?;
        let id = value.id().clone();
        if rows.contains_key(&id) {
            return Err(DomainError::conflict(format!("{} {id} already exists", self.name)).into());
        }
        rows.insert(id, value);
        Ok(())
    }

    /// Insert `value` only if `guard` accepts the current contents, under one
    /// write lock (uniqueness checks).
    pub fn insert_if(
        &self,
        value: V,
        guard: impl FnOnce(&mut dyn Iterator<Item = &V>) -> ServiceResult<()>,
    ) -> ServiceResult<()> {
        let mut rows = self.rows.write().map_err(|_| ServiceError::poisoned(self.name))?;
        guard(&mut rows.values())?;
        let id = value.id().clone();
        if rows.contains_key(&id) {
            return Err(DomainError::conflict(format!("{} {id} already exists", self.name)).into());
        }
        rows.insert(id, value);
        Ok(())
    }

    /// Replace a record, checking it is still at `expected`.
    pub fn commit(&self, value: V, expected: ExpectedVersion) -> ServiceResult<()> {
        let mut rows = self.rows.write().map_err(|_| ServiceError::poisoned(self.name))?;
        let id = value.id().clone();
        let current = rows
            .get(&id)
            .ok_or_else(|| ServiceError::not_found(format!("{} {id}", self.name)))?;
        if !expected.matches(current.version()) {
            return Err(ServiceError::Concurrency(format!(
                "{} {id} moved to version {} (expected {expected:?})",
                self.name,
                current.version()
            )));
        }
        rows.insert(id, value);
        Ok(())
    }

    pub fn remove(&self, id: &V::Id, expected: ExpectedVersion) -> ServiceResult<V> {
        let mut rows = self.rows.write().map_err(|_| ServiceError::poisoned(self.name))?;
        let current = rows
            .get(id)
            .ok_or_else(|| ServiceError::not_found(format!("{} {id}", self.name)))?;
        if !expected.matches(current.version()) {
            return Err(ServiceError::Concurrency(format!(
                "{} {id} changed before removal",
                self.name
            )));
        }
        rows.remove(id)
            .ok_or_else(|| ServiceError::not_found(format!("{} {id}", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: u32,
        version: u64,
    }

    impl AggregateRoot for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    #[test]
    fn stale_commit_is_a_concurrency_error() {
        let repo = Repository::new("row");
        repo.insert(Row { id: 1, version: 1 }).unwrap();
        repo.commit(Row { id: 1, version: 2 }, ExpectedVersion::Exact(1))
            .unwrap();

        let err = repo
            .commit(Row { id: 1, version: 2 }, ExpectedVersion::Exact(1))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Concurrency(_)));
        assert_eq!(repo.load(&1).unwrap().version, 2);
        assert!(matches!(
            repo.load(&9),
            Err(ServiceError::Domain(DomainError::NotFound(_)))
        ));
        assert!(repo.insert(Row { id: 1, version: 1 }).is_err());
    }
}
