//! Fundamental types for the Strata node.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! hashes, keys, hybrid logical clock timestamps, contract argument values,
//! protocol parameters, and network identifiers.

pub mod block;
pub mod error;
pub mod hash;
pub mod hlc;
pub mod keys;
pub mod network;
pub mod params;
pub mod value;

pub use block::BlockHash;
pub use error::TypesError;
pub use hash::TxHash;
pub use hlc::{HlcTimestamp, NodeId, SORT_KEY_LEN};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use network::NetworkId;
pub use params::{ProtocolParams, StampParams};
pub use value::Value;
