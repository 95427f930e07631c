//! Blocks: an ordered list of stamped transactions and their results.

use serde::{Deserialize, Serialize};

use strata_crypto::{blake2b_256, blake2b_256_multi, hash_block, Signer, Verifier};
use strata_transactions::ProcessedTransaction;
use strata_types::{BlockHash, PublicKey, Signature};

use crate::error::LedgerError;
use crate::result::ExecutionResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// A finalized block. Immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub previous_hash: BlockHash,
    /// Transactions in final execution order.
    pub transactions: Vec<ProcessedTransaction>,
    /// `results[i]` belongs to `transactions[i]`.
    pub results: Vec<ExecutionResult>,
    /// `H(input hash 0 || input hash 1 || ...)`.
    pub inputs_hash: [u8; 32],
    /// `H(canonical encoding of results)`.
    pub results_hash: [u8; 32],
    /// `H(previous_hash || inputs_hash)`.
    pub hash: BlockHash,
    /// Node that produced the block.
    pub owner: PublicKey,
    pub signatures: Vec<BlockSignature>,
}

impl Block {
    /// Compute hashes for a block; the result is unsigned.
    pub fn finalize(
        number: u64,
        previous_hash: BlockHash,
        owner: PublicKey,
        transactions: Vec<ProcessedTransaction>,
        results: Vec<ExecutionResult>,
    ) -> Result<Self, LedgerError> {
        if transactions.len() != results.len() {
            return Err(LedgerError::InvalidBlock {
                number,
                reason: format!(
                    "{} transactions but {} results",
                    transactions.len(),
                    results.len()
                ),
            });
        }
        let inputs_hash = Self::compute_inputs_hash(&transactions);
        let results_hash = Self::compute_results_hash(&results)?;
        Ok(Self {
            number,
            previous_hash,
            hash: hash_block(&previous_hash, &inputs_hash),
            transactions,
            results,
            inputs_hash,
            results_hash,
            owner,
            signatures: Vec::new(),
        })
    }

    pub fn compute_inputs_hash(transactions: &[ProcessedTransaction]) -> [u8; 32] {
        let parts: Vec<&[u8]> = transactions
            .iter()
            .map(|tx| tx.input_hash.as_bytes().as_slice())
            .collect();
        blake2b_256_multi(&parts)
    }

    pub fn compute_results_hash(results: &[ExecutionResult]) -> Result<[u8; 32], LedgerError> {
        Ok(blake2b_256(&bincode::serialize(results)?))
    }

    /// Bytes every block signature covers: `hash || results_hash || number (BE)`.
    pub fn signing_message(hash: &BlockHash, results_hash: &[u8; 32], number: u64) -> Vec<u8> {
        let mut message = Vec::with_capacity(72);
        message.extend_from_slice(hash.as_bytes());
        message.extend_from_slice(results_hash);
        message.extend_from_slice(&number.to_be_bytes());
        message
    }

    /// Add `signer`'s signature.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), LedgerError> {
        let message = Self::signing_message(&self.hash, &self.results_hash, self.number);
        let signature = signer.sign(&message)?;
        self.signatures.push(BlockSignature {
            signer: signer.public_key(),
            signature,
        });
        Ok(())
    }

    /// The owner's signature, if present.
    pub fn owner_signature(&self) -> Option<&Signature> {
        self.signatures
            .iter()
            .find(|s| s.signer == self.owner)
            .map(|s| &s.signature)
    }

    /// Recompute every hash from the block's contents.
    pub fn verify_integrity(&self) -> Result<(), LedgerError> {
        if self.transactions.len() != self.results.len() {
            return Err(LedgerError::InvalidBlock {
                number: self.number,
                reason: "transaction and result counts differ".into(),
            });
        }
        for (tx, result) in self.transactions.iter().zip(&self.results) {
            if tx.input_hash != result.transaction_hash || !tx.input_hash_matches() {
                return Err(LedgerError::InvalidBlock {
                    number: self.number,
                    reason: format!("result mismatch for transaction {}", tx.input_hash),
                });
            }
        }
        let inputs_hash = Self::compute_inputs_hash(&self.transactions);
        if inputs_hash != self.inputs_hash
            || hash_block(&self.previous_hash, &inputs_hash) != self.hash
            || Self::compute_results_hash(&self.results)? != self.results_hash
        {
            return Err(LedgerError::HashMismatch {
                number: self.number,
            });
        }
        Ok(())
    }

    /// Every signature must verify and the owner must have signed.
    pub fn verify_signatures(&self, verifier: &dyn Verifier) -> Result<(), LedgerError> {
        if self.owner_signature().is_none() {
            return Err(LedgerError::MissingSignature {
                number: self.number,
            });
        }
        let message = Self::signing_message(&self.hash, &self.results_hash, self.number);
        for sig in &self.signatures {
            if !verifier.verify(&sig.signer, &message, &sig.signature) {
                return Err(LedgerError::InvalidSignature {
                    number: self.number,
                    signer: sig.signer.to_hex(),
                });
            }
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, LedgerError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::result::StateDelta;
    use strata_crypto::{Ed25519Signer, Ed25519Verifier};
    use strata_transactions::TransactionBuilder;
    use strata_types::{HlcTimestamp, NodeId, Value};

    pub(crate) fn processed(node: &Ed25519Signer, nonce: u64, physical: u64) -> ProcessedTransaction {
        let sender = Ed25519Signer::from_seed(&[42u8; 32]);
        let tx = TransactionBuilder::new("currency", "transfer")
            .nonce(nonce)
            .stamps(10)
            .sign(&sender)
            .unwrap();
        let ts = HlcTimestamp::new(physical, 0, NodeId::from(node.public_key()));
        ProcessedTransaction::stamp(tx, ts, node).unwrap()
    }

    pub(crate) fn signed_block(
        node: &Ed25519Signer,
        number: u64,
        previous: BlockHash,
        nonces: &[u64],
    ) -> Block {
        let txs: Vec<_> = nonces
            .iter()
            .map(|n| processed(node, *n, 100 * n))
            .collect();
        let results = txs
            .iter()
            .map(|tx| {
                ExecutionResult::succeeded(
                    tx.input_hash,
                    vec![StateDelta {
                        key: "currency.balances:x".into(),
                        value: vec![1],
                    }],
                    5,
                    Value::Null,
                )
            })
            .collect();
        let mut block = Block::finalize(number, previous, node.public_key(), txs, results).unwrap();
        block.sign(node).unwrap();
        block
    }

    #[test]
    fn hash_chains_previous_and_inputs() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let block = signed_block(&node, 1, BlockHash::ZERO, &[1, 2]);
        let expected = hash_block(&BlockHash::ZERO, &block.inputs_hash);
        assert_eq!(block.hash, expected);
        block.verify_integrity().unwrap();
        block.verify_signatures(&Ed25519Verifier).unwrap();
    }

    #[test]
    fn order_changes_hash() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let a = processed(&node, 1, 100);
        let b = processed(&node, 2, 200);
        let ab = Block::compute_inputs_hash(&[a.clone(), b.clone()]);
        let ba = Block::compute_inputs_hash(&[b, a]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn tampered_result_detected() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let mut block = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        block.results[0].stamps_used = 999;
        assert_eq!(
            block.verify_integrity(),
            Err(LedgerError::HashMismatch { number: 1 })
        );
    }

    #[test]
    fn unsigned_block_rejected() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let mut block = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        block.signatures.clear();
        assert_eq!(
            block.verify_signatures(&Ed25519Verifier),
            Err(LedgerError::MissingSignature { number: 1 })
        );
    }

    #[test]
    fn encode_decode_preserves_hashes() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let block = signed_block(&node, 3, BlockHash::new([7u8; 32]), &[4]);
        let decoded = Block::decode(&block.encode().unwrap()).unwrap();
        assert_eq!(decoded, block);
        decoded.verify_integrity().unwrap();
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let tx = processed(&node, 1, 1);
        assert!(Block::finalize(1, BlockHash::ZERO, node.public_key(), vec![tx], vec![]).is_err());
    }
}
