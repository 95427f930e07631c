//! Per-transaction execution results.

use serde::{Deserialize, Serialize};
use strata_types::{TxHash, Value};
use thiserror::Error;

/// One state write produced by a successful transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NonceError {
    /// Nonce not strictly greater than the sender's last accepted nonce.
    #[error("nonce {got} is not greater than last nonce {last}")]
    TooLow { last: u64, got: u64 },
}

/// Deterministic reasons a transaction fails at execution.
///
/// Every honest node reaches the same error for the same transaction at
/// the same position, so these are recorded in the block.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExecutionError {
    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("insufficient stamps: {required} balance units required, {available} available")]
    InsufficientStamps { required: u64, available: u64 },

    #[error("invalid sender signature")]
    InvalidSignature,

    #[error("contract error: {0}")]
    Contract(String),
}

impl ExecutionError {
    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nonce(NonceError::TooLow { .. }) => "nonce_too_low",
            Self::InsufficientStamps { .. } => "insufficient_stamps",
            Self::InvalidSignature => "invalid_signature",
            Self::Contract(_) => "contract",
        }
    }
}

/// Outcome of executing one transaction at its final position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub transaction_hash: TxHash,
    pub success: bool,
    /// Deltas staged for this transaction, including the stamp fee. Empty on failure.
    pub state_deltas: Vec<StateDelta>,
    pub stamps_used: u64,
    /// Contract return value on success.
    pub result: Option<Value>,
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn succeeded(
        transaction_hash: TxHash,
        state_deltas: Vec<StateDelta>,
        stamps_used: u64,
        result: Value,
    ) -> Self {
        Self {
            transaction_hash,
            success: true,
            state_deltas,
            stamps_used,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(transaction_hash: TxHash, stamps_used: u64, error: ExecutionError) -> Self {
        Self {
            transaction_hash,
            success: false,
            state_deltas: Vec::new(),
            stamps_used,
            result: None,
            error: Some(error),
        }
    }
}
