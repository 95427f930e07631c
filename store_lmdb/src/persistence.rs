//! [`Persistence`] over LMDB.

use std::path::Path;

use strata_store::{Persistence, StoreError, WriteOp};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

pub struct LmdbPersistence {
    environment: LmdbEnvironment,
}

impl LmdbPersistence {
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        Ok(Self {
            environment: LmdbEnvironment::open(path, map_size)?,
        })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.environment
    }

    /// Number of entries in the database.
    pub fn len(&self) -> Result<u64, StoreError> {
        let rtxn = self.environment.env().read_txn().map_err(LmdbError::from)?;
        Ok(self
            .environment
            .state_db()
            .len(&rtxn)
            .map_err(LmdbError::from)?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Persistence for LmdbPersistence {
    fn raw_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.environment.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .environment
            .state_db()
            .get(&rtxn, key)
            .map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn raw_set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.environment.env().write_txn().map_err(LmdbError::from)?;
        self.environment
            .state_db()
            .put(&mut wtxn, key, value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn raw_commit_batch(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        let db = self.environment.state_db();
        let mut wtxn = self.environment.env().write_txn().map_err(LmdbError::from)?;
        let ops = batch.len();
        for op in &batch {
            // An error here drops `wtxn`, which aborts the whole transaction.
            db.put(&mut wtxn, &op.key, &op.value)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(ops, "LMDB batch committed");
        Ok(())
    }
}
