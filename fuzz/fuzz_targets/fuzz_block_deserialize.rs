#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_ledger::{verify_chain, Block, BlockNotification};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the block decoder or the integrity
    // checks run on whatever it produces.
    if let Ok(block) = Block::decode(data) {
        let _ = block.verify_integrity();
        let _ = verify_chain(std::slice::from_ref(&block));
        let _ = BlockNotification::from_block(&block, false);
    }

    let _ = bincode::deserialize::<BlockNotification>(data);
    let _ = bincode::deserialize::<strata_types::BlockHash>(data);
});
