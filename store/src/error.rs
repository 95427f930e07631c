use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("block {got} is out of order, expected {expected}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("block {number} does not extend the current chain head")]
    PreviousHashMismatch { number: u64 },

    #[error("genesis state already applied")]
    GenesisAlreadyApplied,
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
