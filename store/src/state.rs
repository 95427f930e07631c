//! Staged state store with atomic block commits.

use std::collections::BTreeMap;

use strata_types::{BlockHash, TxHash};

use crate::chain::{BlockCommit, ChainHead, EpochInfo};
use crate::error::StoreError;
use crate::keys::{self, decode_u64, encode_u64};
use crate::persistence::{Persistence, WriteOp};
use crate::view::StateView;

/// Contract state plus chain metadata over a [`Persistence`] backend.
///
/// Writes made while executing a block are staged in memory and are visible
/// to later reads through this store. Nothing reaches the backend until
/// [`StateStore::commit`], which writes the staged deltas and the new chain
/// head in one batch. A crash before that leaves the backend exactly at the
/// previous block.
pub struct StateStore<P> {
    persistence: P,
    staged: BTreeMap<String, Vec<u8>>,
    blocks_per_epoch: u64,
}

impl<P: Persistence> StateStore<P> {
    pub fn new(persistence: P, blocks_per_epoch: u64) -> Self {
        Self {
            persistence,
            staged: BTreeMap::new(),
            blocks_per_epoch: blocks_per_epoch.max(1),
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Read through the staging overlay.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(v) = self.staged.get(key) {
            return Ok(Some(v.clone()));
        }
        self.committed(key)
    }

    /// Read committed state only, ignoring anything staged.
    pub fn committed(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.persistence.raw_get(key.as_bytes())
    }

    pub fn stage(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.staged.insert(key.into(), value);
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Drop every staged write.
    pub fn discard(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!(entries = self.staged.len(), "discarding staged state");
        }
        self.staged.clear();
    }

    pub fn chain_head(&self) -> Result<ChainHead, StoreError> {
        let number = match self.committed(keys::META_LAST_BLOCK_NUMBER)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => return Ok(ChainHead::EMPTY),
        };
        let hash = match self.committed(keys::META_LAST_BLOCK_HASH)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("last block hash has {} bytes", bytes.len()))
                })?;
                BlockHash::new(arr)
            }
            None => {
                return Err(StoreError::Corruption(
                    "last block number present without hash".into(),
                ))
            }
        };
        Ok(ChainHead { number, hash })
    }

    pub fn epoch(&self) -> Result<EpochInfo, StoreError> {
        let epoch = self
            .committed(keys::META_EPOCH)?
            .map(|b| decode_u64(&b))
            .transpose()?
            .unwrap_or(0);
        let start_block = self
            .committed(keys::META_EPOCH_START_BLOCK)?
            .map(|b| decode_u64(&b))
            .transpose()?
            .unwrap_or(0);
        Ok(EpochInfo { epoch, start_block })
    }

    /// Encoded block at `number`, if committed.
    pub fn load_block(&self, number: u64) -> Result<Option<Vec<u8>>, StoreError> {
        self.committed(&keys::block_key(number))
    }

    /// Whether a transaction with this input hash is already in a committed block.
    pub fn contains_transaction(&self, hash: &TxHash) -> Result<bool, StoreError> {
        Ok(self.committed(&keys::tx_key(hash))?.is_some())
    }

    /// Last committed nonce for the sender, if any.
    pub fn committed_nonce(&self, sender: &strata_types::PublicKey) -> Result<Option<u64>, StoreError> {
        self.committed(&keys::nonce_key(sender))?
            .map(|b| decode_u64(&b))
            .transpose()
    }

    /// Write initial state in one batch. Only allowed once, before any block.
    pub fn apply_genesis(
        &mut self,
        entries: impl IntoIterator<Item = (String, Vec<u8>)>,
    ) -> Result<usize, StoreError> {
        if self.committed(keys::META_GENESIS)?.is_some() {
            return Err(StoreError::GenesisAlreadyApplied);
        }
        if self.chain_head()?.number != 0 {
            return Err(StoreError::GenesisAlreadyApplied);
        }
        let mut batch: Vec<WriteOp> = entries
            .into_iter()
            .map(|(k, v)| WriteOp::put(k, v))
            .collect();
        let count = batch.len();
        batch.push(WriteOp::put(keys::META_GENESIS, vec![1]));
        self.persistence.raw_commit_batch(batch)?;
        tracing::info!(entries = count, "genesis state applied");
        Ok(count)
    }

    /// Flush staged deltas and the block's metadata in one atomic batch.
    ///
    /// Staging is emptied whether or not the batch lands; on failure the
    /// backend still holds the previous block and the caller must re-execute.
    pub fn commit(&mut self, commit: BlockCommit) -> Result<ChainHead, StoreError> {
        let staged = std::mem::take(&mut self.staged);

        let head = self.chain_head()?;
        let expected = head.number + 1;
        if commit.number != expected {
            return Err(StoreError::OutOfOrder {
                expected,
                got: commit.number,
            });
        }
        if commit.previous_hash != head.hash {
            return Err(StoreError::PreviousHashMismatch {
                number: commit.number,
            });
        }

        let mut batch: Vec<WriteOp> = staged
            .into_iter()
            .map(|(k, v)| WriteOp::put(k, v))
            .collect();
        for tx in &commit.transactions {
            batch.push(WriteOp::put(keys::tx_key(tx), commit.number.to_be_bytes().to_vec()));
        }
        batch.push(WriteOp::put(keys::block_key(commit.number), commit.encoded_block));

        let epoch = commit.number / self.blocks_per_epoch;
        if epoch != self.epoch()?.epoch || commit.number == 1 {
            batch.push(WriteOp::put(keys::META_EPOCH, encode_u64(epoch)));
            batch.push(WriteOp::put(keys::META_EPOCH_START_BLOCK, encode_u64(commit.number)));
        }
        batch.push(WriteOp::put(
            keys::META_LAST_BLOCK_HASH,
            commit.hash.as_bytes().to_vec(),
        ));
        batch.push(WriteOp::put(
            keys::META_LAST_BLOCK_NUMBER,
            encode_u64(commit.number),
        ));

        self.persistence.raw_commit_batch(batch)?;
        Ok(ChainHead {
            number: commit.number,
            hash: commit.hash,
        })
    }
}

impl<P: Persistence> StateView for StateStore<P> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        StateStore::get(self, key)
    }
}
