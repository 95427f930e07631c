//! Key layout.
//!
//! Contract state lives under `contract.variable` or `contract.variable:key`.
//! Names starting with `__` are reserved for the node itself; intake
//! validation refuses such contract names, so user state can never collide
//! with these namespaces.

use strata_types::{PublicKey, TxHash};

use crate::error::StoreError;

pub const META_LAST_BLOCK_HASH: &str = "__meta__.last_block_hash";
pub const META_LAST_BLOCK_NUMBER: &str = "__meta__.last_block_number";
pub const META_EPOCH: &str = "__meta__.epoch";
pub const META_EPOCH_START_BLOCK: &str = "__meta__.epoch_start_block";
pub const META_GENESIS: &str = "__meta__.genesis";

const NONCES_PREFIX: &str = "__nonces__.";
const BLOCKS_PREFIX: &str = "__blocks__.";
const TXS_PREFIX: &str = "__txs__.";

/// `contract.variable` or `contract.variable:key`.
pub fn state_key(contract: &str, variable: &str, key: Option<&str>) -> String {
    match key {
        Some(k) => format!("{contract}.{variable}:{k}"),
        None => format!("{contract}.{variable}"),
    }
}

/// Last committed nonce of `sender`.
pub fn nonce_key(sender: &PublicKey) -> String {
    format!("{NONCES_PREFIX}{}", sender.to_hex())
}

/// Encoded block by number. Zero-padded so lexicographic order is numeric order.
pub fn block_key(number: u64) -> String {
    format!("{BLOCKS_PREFIX}{number:020}")
}

/// Marker for a transaction included in a committed block.
pub fn tx_key(hash: &TxHash) -> String {
    format!("{TXS_PREFIX}{hash}")
}

pub fn encode_u64(v: u64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

pub fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::Corruption(format!("expected 8-byte integer, found {} bytes", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(arr))
}
