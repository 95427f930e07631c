//! Stateless intake validation.
//!
//! Everything here depends only on the transaction itself and the protocol
//! parameters. Nonce ordering and stamp affordability depend on the state as
//! of the transaction's final position, so they are checked at execution.

use strata_crypto::Verifier;
use strata_types::{NodeId, ProtocolParams};

use crate::envelope::{ProcessedTransaction, SignedTransaction};
use crate::error::TransactionError;

/// Longest accepted contract or function name.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Check a contract or function name: `[A-Za-z_][A-Za-z0-9_]*`, at most
/// [`MAX_IDENTIFIER_LEN`] characters, and not starting with `__` (reserved for
/// store metadata namespaces).
pub fn validate_identifier(name: &str) -> Result<(), TransactionError> {
    let invalid = |reason| TransactionError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or underscore"))
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("only ASCII letters, digits and underscore are allowed"));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("too long"));
    }
    if name.starts_with("__") {
        return Err(invalid("reserved prefix"));
    }
    Ok(())
}

/// Validate a client-submitted transaction before it is stamped.
pub fn validate_signed(
    tx: &SignedTransaction,
    verifier: &dyn Verifier,
    params: &ProtocolParams,
) -> Result<(), TransactionError> {
    let payload = &tx.payload;

    validate_identifier(&payload.contract)?;
    validate_identifier(&payload.function)?;

    if payload.stamps_supplied == 0 {
        return Err(TransactionError::ZeroStamps);
    }

    let kwargs_size: usize = payload
        .kwargs
        .iter()
        .map(|(k, v)| k.len() + v.approx_size())
        .sum();
    if kwargs_size > params.max_kwargs_bytes {
        return Err(TransactionError::KwargsTooLarge {
            size: kwargs_size,
            limit: params.max_kwargs_bytes,
        });
    }

    let encoded = tx.encode()?;
    if encoded.len() > params.max_transaction_bytes {
        return Err(TransactionError::TooLarge {
            size: encoded.len(),
            limit: params.max_transaction_bytes,
        });
    }

    if !tx.verify_signature(verifier) {
        return Err(TransactionError::InvalidSignature);
    }
    Ok(())
}

/// Validate a stamped transaction relayed by a peer.
///
/// On top of [`validate_signed`], the input hash must match the carried
/// transaction, the processor's countersignature must verify and the
/// timestamp's node id must be the processor's.
pub fn validate_processed(
    tx: &ProcessedTransaction,
    verifier: &dyn Verifier,
    params: &ProtocolParams,
) -> Result<(), TransactionError> {
    if !tx.input_hash_matches() {
        return Err(TransactionError::InputHashMismatch);
    }
    if !tx.verify_processor(verifier) {
        return Err(TransactionError::InvalidProcessorSignature);
    }
    if tx.hlc_timestamp.node != NodeId::from(&tx.processor) {
        return Err(TransactionError::ProcessorMismatch);
    }
    validate_signed(&tx.transaction, verifier, params)
}
