#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_crypto::Ed25519Verifier;
use strata_transactions::{validate_processed, validate_signed, ProcessedTransaction, SignedTransaction};
use strata_types::ProtocolParams;

fuzz_target!(|data: &[u8]| {
    // Stateless validation runs on every transaction a peer sends us, so it
    // must reject garbage without panicking.
    let params = ProtocolParams::default();

    if let Ok(tx) = bincode::deserialize::<SignedTransaction>(data) {
        let _ = tx.input_hash();
        let _ = validate_signed(&tx, &Ed25519Verifier, &params);
    }

    if let Ok(tx) = bincode::deserialize::<ProcessedTransaction>(data) {
        let _ = validate_processed(&tx, &Ed25519Verifier, &params);
    }
});
