//! Block notifications sent to peers after a block is durable.

use serde::{Deserialize, Serialize};

use strata_crypto::Verifier;
use strata_types::{BlockHash, PublicKey, Signature};

use crate::block::Block;
use crate::error::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNotification {
    pub block_number: u64,
    pub block_hash: BlockHash,
    pub previous_hash: BlockHash,
    pub results_hash: [u8; 32],
    pub owner: PublicKey,
    pub owner_signature: Signature,
    /// Full block for peers that are syncing.
    pub block: Option<Block>,
}

impl BlockNotification {
    /// Build a notification for a signed block.
    pub fn from_block(block: &Block, include_block: bool) -> Result<Self, LedgerError> {
        let owner_signature = *block
            .owner_signature()
            .ok_or(LedgerError::MissingSignature {
                number: block.number,
            })?;
        Ok(Self {
            block_number: block.number,
            block_hash: block.hash,
            previous_hash: block.previous_hash,
            results_hash: block.results_hash,
            owner: block.owner,
            owner_signature,
            block: include_block.then(|| block.clone()),
        })
    }

    /// Check the owner's signature and, if present, the attached block.
    pub fn verify(&self, verifier: &dyn Verifier) -> Result<(), LedgerError> {
        let message = Block::signing_message(&self.block_hash, &self.results_hash, self.block_number);
        if !verifier.verify(&self.owner, &message, &self.owner_signature) {
            return Err(LedgerError::InvalidSignature {
                number: self.block_number,
                signer: self.owner.to_hex(),
            });
        }
        if let Some(block) = &self.block {
            if block.hash != self.block_hash || block.number != self.block_number {
                return Err(LedgerError::InvalidBlock {
                    number: self.block_number,
                    reason: "attached block does not match notification".into(),
                });
            }
            block.verify_integrity()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::signed_block;
    use strata_crypto::{Ed25519Signer, Ed25519Verifier};

    #[test]
    fn notification_verifies_against_owner() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let block = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        let note = BlockNotification::from_block(&block, true).unwrap();
        assert_eq!(note.block_hash, block.hash);
        note.verify(&Ed25519Verifier).unwrap();

        let mut forged = BlockNotification::from_block(&block, false).unwrap();
        forged.block_number = 2;
        assert!(forged.verify(&Ed25519Verifier).is_err());
    }
}
