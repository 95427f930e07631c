//! Chain metadata records.

use serde::{Deserialize, Serialize};
use strata_types::{BlockHash, TxHash};

/// Top of the committed chain. Number 0 with a zero hash means "no blocks yet".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
    pub number: u64,
    pub hash: BlockHash,
}

impl ChainHead {
    pub const EMPTY: Self = Self {
        number: 0,
        hash: BlockHash::ZERO,
    };
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub epoch: u64,
    pub start_block: u64,
}

/// Everything a finalized block adds to the store besides its staged deltas.
#[derive(Clone, Debug)]
pub struct BlockCommit {
    pub number: u64,
    pub previous_hash: BlockHash,
    pub hash: BlockHash,
    /// Canonical encoding of the block, kept for peers that request it.
    pub encoded_block: Vec<u8>,
    /// Input hashes of every transaction in the block, for idempotent intake.
    pub transactions: Vec<TxHash>,
}
