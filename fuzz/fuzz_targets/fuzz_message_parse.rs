#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_messages::{decode, encode};
use strata_types::NetworkId;

fuzz_target!(|data: &[u8]| {
    // Decoding untrusted transport bytes must never panic, and anything that
    // decodes must survive a re-encode unchanged.
    for network in [NetworkId::Live, NetworkId::Test, NetworkId::Dev] {
        if let Ok(message) = decode(network, data) {
            let encoded = encode(network, &message).expect("decoded message re-encodes");
            let again = decode(network, &encoded).expect("re-encoded message decodes");
            assert_eq!(again, message);
        }
    }
});
