//! The raw key/value seam every storage backend implements.

use crate::error::StoreError;

/// One write in an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOp {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl WriteOp {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Durable byte-level key/value storage.
///
/// `raw_commit_batch` must be all-or-nothing: after a crash either every
/// write in the batch is visible or none is.
pub trait Persistence: Send + Sync {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn raw_set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn raw_commit_batch(&self, batch: Vec<WriteOp>) -> Result<(), StoreError>;
}

impl<P: Persistence + ?Sized> Persistence for std::sync::Arc<P> {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).raw_get(key)
    }

    fn raw_set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        (**self).raw_set(key, value)
    }

    fn raw_commit_batch(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        (**self).raw_commit_batch(batch)
    }
}
