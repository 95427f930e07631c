use thiserror::Error;

/// Failure of a signing capability.
///
/// In-process Ed25519 keys never fail; remote signers (HSMs, key services)
/// can, and the block builder must survive that.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    #[error("signing refused: {0}")]
    Refused(String),
}
