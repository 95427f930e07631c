use crate::block::Block;
use crate::error::LedgerError;

/// Check a contiguous run of blocks: each block's contents reproduce its
/// hash, and each links to the one before it.
pub fn verify_chain(blocks: &[Block]) -> Result<(), LedgerError> {
    for block in blocks {
        block.verify_integrity()?;
    }
    for pair in blocks.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let follows = prev.number.checked_add(1) == Some(next.number);
        if !follows || next.previous_hash != prev.hash {
            return Err(LedgerError::BrokenChain {
                number: next.number,
                previous: prev.number,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::signed_block;
    use strata_crypto::Ed25519Signer;
    use strata_types::BlockHash;

    #[test]
    fn linked_chain_verifies() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let b1 = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        let b2 = signed_block(&node, 2, b1.hash, &[2, 3]);
        let b3 = signed_block(&node, 3, b2.hash, &[]);
        verify_chain(&[b1, b2, b3]).unwrap();
    }

    #[test]
    fn gap_detected() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let b1 = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        let b3 = signed_block(&node, 3, b1.hash, &[2]);
        assert_eq!(
            verify_chain(&[b1, b3]),
            Err(LedgerError::BrokenChain {
                number: 3,
                previous: 1
            })
        );
    }

    #[test]
    fn wrong_previous_hash_detected() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let b1 = signed_block(&node, 1, BlockHash::ZERO, &[1]);
        let b2 = signed_block(&node, 2, BlockHash::new([5u8; 32]), &[2]);
        assert!(matches!(
            verify_chain(&[b1, b2]),
            Err(LedgerError::BrokenChain { number: 2, .. })
        ));
    }

    #[test]
    fn nothing_follows_the_last_block_number() {
        let node = Ed25519Signer::from_seed(&[1u8; 32]);
        let last = signed_block(&node, u64::MAX, BlockHash::ZERO, &[1]);
        let wrapped = signed_block(&node, 0, last.hash, &[2]);
        assert_eq!(
            verify_chain(&[last, wrapped]),
            Err(LedgerError::BrokenChain {
                number: 0,
                previous: u64::MAX,
            })
        );
    }
}
