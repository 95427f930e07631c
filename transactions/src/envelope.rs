//! Transaction payload, sender-signed envelope, and node-stamped envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use strata_crypto::{hash_transaction, Signer, Verifier};
use strata_types::{HlcTimestamp, PublicKey, Signature, TxHash, Value};

use crate::error::TransactionError;

/// Contract call arguments. A `BTreeMap` so the encoding is key-sorted.
pub type Kwargs = BTreeMap<String, Value>;

/// Everything the sender signs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub sender: PublicKey,
    pub nonce: u64,
    pub stamps_supplied: u64,
    pub contract: String,
    pub function: String,
    pub kwargs: Kwargs,
}

impl TransactionPayload {
    /// Canonical encoding: the bytes the sender signs.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(self)?)
    }
}

/// A payload plus the sender's signature over [`TransactionPayload::signing_bytes`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub payload: TransactionPayload,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Sign `payload` as its sender.
    ///
    /// The signer's identity must match `payload.sender` for the result to
    /// verify; this is not checked here so tests can build forged envelopes.
    pub fn sign(payload: TransactionPayload, signer: &dyn Signer) -> Result<Self, TransactionError> {
        let signature = signer.sign(&payload.signing_bytes()?)?;
        Ok(Self { payload, signature })
    }

    /// Canonical encoding of the whole signed envelope.
    pub fn encode(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(bincode::serialize(self)?)
    }

    /// Input hash: Blake2b-256 of the canonical signed encoding.
    pub fn input_hash(&self) -> Result<TxHash, TransactionError> {
        Ok(hash_transaction(&self.encode()?))
    }

    pub fn verify_signature(&self, verifier: &dyn Verifier) -> bool {
        match self.payload.signing_bytes() {
            Ok(bytes) => verifier.verify(&self.payload.sender, &bytes, &self.signature),
            Err(_) => false,
        }
    }

    pub fn sender(&self) -> &PublicKey {
        &self.payload.sender
    }

    pub fn nonce(&self) -> u64 {
        self.payload.nonce
    }
}

/// A signed transaction after its first acceptance by a node.
///
/// `hlc_timestamp` is assigned exactly once and travels with the transaction
/// to every peer; all nodes order by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    pub transaction: SignedTransaction,
    pub hlc_timestamp: HlcTimestamp,
    pub input_hash: TxHash,
    pub processor: PublicKey,
    pub processor_signature: Signature,
}

impl ProcessedTransaction {
    /// Stamp `transaction` with `hlc_timestamp` and countersign it as `processor`.
    pub fn stamp(
        transaction: SignedTransaction,
        hlc_timestamp: HlcTimestamp,
        processor: &dyn Signer,
    ) -> Result<Self, TransactionError> {
        let input_hash = transaction.input_hash()?;
        let processor_signature =
            processor.sign(&Self::processor_message(&input_hash, &hlc_timestamp))?;
        Ok(Self {
            transaction,
            hlc_timestamp,
            input_hash,
            processor: processor.public_key(),
            processor_signature,
        })
    }

    /// Bytes the processor signs: `input_hash || hlc sort key`.
    pub fn processor_message(input_hash: &TxHash, hlc_timestamp: &HlcTimestamp) -> Vec<u8> {
        let mut message = Vec::with_capacity(32 + strata_types::SORT_KEY_LEN);
        message.extend_from_slice(input_hash.as_bytes());
        message.extend_from_slice(&hlc_timestamp.to_sort_key());
        message
    }

    pub fn verify_processor(&self, verifier: &dyn Verifier) -> bool {
        verifier.verify(
            &self.processor,
            &Self::processor_message(&self.input_hash, &self.hlc_timestamp),
            &self.processor_signature,
        )
    }

    /// Whether `input_hash` really is the hash of the carried transaction.
    pub fn input_hash_matches(&self) -> bool {
        matches!(self.transaction.input_hash(), Ok(h) if h == self.input_hash)
    }

    pub fn hash(&self) -> TxHash {
        self.input_hash
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.transaction.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_crypto::{Ed25519Signer, Ed25519Verifier};
    use strata_types::NodeId;

    fn payload(sender: PublicKey, nonce: u64) -> TransactionPayload {
        let mut kwargs = Kwargs::new();
        kwargs.insert("amount".into(), Value::Int(10));
        TransactionPayload {
            sender,
            nonce,
            stamps_supplied: 100,
            contract: "currency".into(),
            function: "transfer".into(),
            kwargs,
        }
    }

    #[test]
    fn signed_transaction_verifies() {
        let signer = Ed25519Signer::from_seed(&[1u8; 32]);
        let tx = SignedTransaction::sign(payload(signer.public_key(), 1), &signer).unwrap();
        assert!(tx.verify_signature(&Ed25519Verifier));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let signer = Ed25519Signer::from_seed(&[1u8; 32]);
        let mut tx = SignedTransaction::sign(payload(signer.public_key(), 1), &signer).unwrap();
        tx.payload.nonce = 2;
        assert!(!tx.verify_signature(&Ed25519Verifier));
    }

    #[test]
    fn input_hash_differs_by_nonce() {
        let signer = Ed25519Signer::from_seed(&[1u8; 32]);
        let a = SignedTransaction::sign(payload(signer.public_key(), 1), &signer).unwrap();
        let b = SignedTransaction::sign(payload(signer.public_key(), 2), &signer).unwrap();
        assert_ne!(a.input_hash().unwrap(), b.input_hash().unwrap());
    }

    #[test]
    fn stamped_transaction_carries_processor_proof() {
        let sender = Ed25519Signer::from_seed(&[1u8; 32]);
        let node = Ed25519Signer::from_seed(&[2u8; 32]);
        let tx = SignedTransaction::sign(payload(sender.public_key(), 1), &sender).unwrap();
        let ts = HlcTimestamp::new(100, 0, NodeId::from(node.public_key()));

        let processed = ProcessedTransaction::stamp(tx.clone(), ts, &node).unwrap();
        assert_eq!(processed.input_hash, tx.input_hash().unwrap());
        assert_eq!(processed.processor, node.public_key());
        assert!(processed.verify_processor(&Ed25519Verifier));
        assert!(processed.input_hash_matches());

        let mut restamped = processed.clone();
        restamped.hlc_timestamp.physical_ns = 1;
        assert!(!restamped.verify_processor(&Ed25519Verifier));
    }
}
