//! Nullable persistence: in-memory, with failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use strata_store::{Persistence, StoreError, WriteOp};

/// In-memory [`Persistence`].
///
/// A failed batch applies nothing, exactly like a process crash before the
/// backend's commit point. "Restarting" is building a new store over a
/// clone of the same `NullPersistence`.
#[derive(Clone, Default)]
pub struct NullPersistence {
    data: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
    failures_pending: Arc<AtomicUsize>,
    batches_committed: Arc<AtomicUsize>,
}

impl NullPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        match self.data.lock() {
            Ok(d) => d,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make the next batch fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commits(1);
    }

    pub fn fail_next_commits(&self, n: usize) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    pub fn batches_committed(&self) -> usize {
        self.batches_committed.load(Ordering::SeqCst)
    }

    /// Copy of everything stored.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.data().clone()
    }
}

impl Persistence for NullPersistence {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data().get(key).cloned())
    }

    fn raw_set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.data().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn raw_commit_batch(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        let injected = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut data = self.data();
        for op in batch {
            data.insert(op.key, op.value);
        }
        self.batches_committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failure_applies_nothing() {
        let db = NullPersistence::new();
        db.fail_next_commit();
        assert!(db
            .raw_commit_batch(vec![WriteOp::put("a", "1"), WriteOp::put("b", "2")])
            .is_err());
        assert!(db.snapshot().is_empty());

        db.raw_commit_batch(vec![WriteOp::put("a", "1")]).unwrap();
        assert_eq!(db.raw_get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(db.batches_committed(), 1);
    }

    #[test]
    fn clones_share_data() {
        let db = NullPersistence::new();
        let other = db.clone();
        db.raw_set(b"k", b"v").unwrap();
        assert_eq!(other.raw_get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
