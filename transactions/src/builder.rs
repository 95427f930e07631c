//! Fluent construction of signed transactions.

use strata_crypto::Signer;
use strata_types::Value;

use crate::envelope::{Kwargs, SignedTransaction, TransactionPayload};
use crate::error::TransactionError;

/// Builds and signs a [`SignedTransaction`]; the sender is the signer's key.
///
/// ```ignore
/// let tx = TransactionBuilder::new("currency", "transfer")
///     .nonce(1)
///     .stamps(100)
///     .arg("to", recipient_hex)
///     .arg("amount", 25i64)
///     .sign(&signer)?;
/// ```
#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    contract: String,
    function: String,
    nonce: u64,
    stamps_supplied: u64,
    kwargs: Kwargs,
}

impl TransactionBuilder {
    pub fn new(contract: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            nonce: 0,
            stamps_supplied: 0,
            kwargs: Kwargs::new(),
        }
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn stamps(mut self, stamps: u64) -> Self {
        self.stamps_supplied = stamps;
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn sign(self, signer: &dyn Signer) -> Result<SignedTransaction, TransactionError> {
        let payload = TransactionPayload {
            sender: signer.public_key(),
            nonce: self.nonce,
            stamps_supplied: self.stamps_supplied,
            contract: self.contract,
            function: self.function,
            kwargs: self.kwargs,
        };
        SignedTransaction::sign(payload, signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_crypto::{Ed25519Signer, Ed25519Verifier};

    #[test]
    fn builds_signed_transaction_for_signer() {
        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let tx = TransactionBuilder::new("currency", "transfer")
            .nonce(4)
            .stamps(20)
            .arg("amount", 7i64)
            .arg("to", "bob")
            .sign(&signer)
            .unwrap();

        assert_eq!(tx.payload.sender, signer.public_key());
        assert_eq!(tx.payload.nonce, 4);
        assert_eq!(tx.payload.kwargs.get("amount"), Some(&Value::Int(7)));
        assert!(tx.verify_signature(&Ed25519Verifier));
    }

    #[test]
    fn argument_order_does_not_change_encoding() {
        let signer = Ed25519Signer::from_seed(&[3u8; 32]);
        let a = TransactionBuilder::new("c", "f")
            .arg("x", 1i64)
            .arg("y", 2i64)
            .sign(&signer)
            .unwrap();
        let b = TransactionBuilder::new("c", "f")
            .arg("y", 2i64)
            .arg("x", 1i64)
            .sign(&signer)
            .unwrap();
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }
}
