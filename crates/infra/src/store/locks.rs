use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::error::{ServiceError, ServiceResult};

/// One mutex per key, created on first use.
///
/// Serialises read-modify-write cycles on a single record while leaving
/// different records free to proceed in parallel.
#[derive(Debug)]
pub struct LockTable<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for LockTable<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> LockTable<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> ServiceResult<Arc<Mutex<()>>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ServiceError::poisoned("lock table"))?;
        Ok(slots.entry(key.clone()).or_default().clone())
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> ServiceResult<R> {
        let slot = self.slot(key)?;
        let _guard = slot
            .lock()
            .map_err(|_| ServiceError::poisoned("record"))?;
        Ok(f())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_key_never_runs_concurrently() {
        let table = Arc::new(LockTable::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = table.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    table
                        .with_lock(&7, || {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        })
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
