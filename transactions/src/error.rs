use strata_crypto::SignError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid sender signature")]
    InvalidSignature,

    #[error("invalid processor signature")]
    InvalidProcessorSignature,

    #[error("input hash does not match transaction contents")]
    InputHashMismatch,

    #[error("timestamp node id does not match the processor key")]
    ProcessorMismatch,

    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("stamps_supplied must be greater than zero")]
    ZeroStamps,

    #[error("kwargs too large: {size} bytes exceeds limit of {limit}")]
    KwargsTooLarge { size: usize, limit: usize },

    #[error("transaction too large: {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SignError),
}

impl TransactionError {
    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidProcessorSignature => "invalid_processor_signature",
            Self::InputHashMismatch => "input_hash_mismatch",
            Self::ProcessorMismatch => "processor_mismatch",
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::ZeroStamps => "zero_stamps",
            Self::KwargsTooLarge { .. } => "kwargs_too_large",
            Self::TooLarge { .. } => "too_large",
            Self::Encoding(_) => "encoding",
            Self::Signing(_) => "signing",
        }
    }
}

impl From<bincode::Error> for TransactionError {
    fn from(e: bincode::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}
