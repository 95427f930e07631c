//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the database holding every state, metadata and block entry.
pub const STATE_DB: &str = "state";

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and its database handle.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    state_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the node opens each data directory once per process; no
        // other handle to the same environment exists.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let state_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(STATE_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            state_db,
            path: path.to_path_buf(),
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn state_db(&self) -> Database<Bytes, Bytes> {
        self.state_db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
