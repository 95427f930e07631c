use strata_crypto::SignError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid block {number}: {reason}")]
    InvalidBlock { number: u64, reason: String },

    #[error("block {number} hash does not match its contents")]
    HashMismatch { number: u64 },

    #[error("block {number} does not extend block {previous}")]
    BrokenChain { number: u64, previous: u64 },

    #[error("block {number} carries no owner signature")]
    MissingSignature { number: u64 },

    #[error("block {number} has an invalid signature from {signer}")]
    InvalidSignature { number: u64, signer: String },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SignError),
}

impl From<bincode::Error> for LedgerError {
    fn from(e: bincode::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}
