use strata_store::StoreError;
use thiserror::Error;

/// Local, non-deterministic failure while executing. Fatal to the node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorFault {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("corrupt state value at {key}: {reason}")]
    CorruptValue { key: String, reason: String },

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Deterministic contract failure, recorded in the block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("out of stamps: {supplied} supplied")]
    OutOfStamps { supplied: u64 },

    #[error("unknown function {contract}.{function}")]
    UnknownFunction { contract: String, function: String },

    #[error("caller is not authorised for {0}")]
    Unauthorized(String),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: i128, required: i128 },

    #[error("{0}")]
    Failed(String),

    /// Storage failure surfaced through a contract read. Converted to an
    /// [`ExecutorFault`] by the registry and never recorded in a block.
    #[error("storage fault: {0}")]
    Fault(ExecutorFault),
}

impl From<ExecutorFault> for ContractError {
    fn from(e: ExecutorFault) -> Self {
        Self::Fault(e)
    }
}
