//! Cryptographic primitives for the Strata node.
//!
//! - **Ed25519** for transaction, processor, and block signatures
//! - **Blake2b-256** for transaction input hashes and block hashes
//! - [`Signer`] / [`Verifier`] capabilities so the pipeline never touches key
//!   material directly

pub mod capability;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use capability::{Ed25519Signer, Ed25519Verifier, Signer, Verifier};
pub use error::SignError;
pub use hash::{blake2b_256, blake2b_256_multi, hash_block, hash_transaction};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
