use strata_types::NetworkId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("message too large: {size} > {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("message for network {got}, expected {expected}")]
    WrongNetwork { expected: NetworkId, got: NetworkId },

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),
}
