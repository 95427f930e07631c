//! Message codec: bincode with a hard size limit.

use bincode::Options;
use strata_types::NetworkId;

use crate::error::CodecError;
use crate::{Envelope, MessageHeader, WireMessage, PROTOCOL_VERSION};

/// Maximum message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_SIZE as u64)
}

/// Wrap `message` in an envelope for `network` and serialize it.
pub fn encode(network: NetworkId, message: &WireMessage) -> Result<Vec<u8>, CodecError> {
    let envelope = Envelope {
        header: MessageHeader::new(network),
        message: message.clone(),
    };
    options()
        .serialize(&envelope)
        .map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Deserialize an envelope and check it belongs to `network` and speaks
/// this protocol version.
pub fn decode(network: NetworkId, data: &[u8]) -> Result<WireMessage, CodecError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::TooLarge {
            size: data.len(),
            limit: MAX_MESSAGE_SIZE,
        });
    }
    let envelope: Envelope = options()
        .deserialize(data)
        .map_err(|e| CodecError::Malformed(e.to_string()))?;
    if envelope.header.network != network {
        return Err(CodecError::WrongNetwork {
            expected: network,
            got: envelope.header.network,
        });
    }
    if envelope.header.protocol_version != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(
            envelope.header.protocol_version,
        ));
    }
    Ok(envelope.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_crypto::Ed25519Signer;
    use strata_transactions::TransactionBuilder;

    fn submit() -> WireMessage {
        let signer = Ed25519Signer::from_seed(&[1u8; 32]);
        let tx = TransactionBuilder::new("currency", "transfer")
            .nonce(1)
            .stamps(10)
            .arg("amount", 3i64)
            .sign(&signer)
            .unwrap();
        WireMessage::SubmitTransaction(tx)
    }

    #[test]
    fn decodes_what_it_encodes() {
        let msg = submit();
        let bytes = encode(NetworkId::Dev, &msg).unwrap();
        assert_eq!(decode(NetworkId::Dev, &bytes).unwrap(), msg);
    }

    #[test]
    fn rejects_other_network() {
        let bytes = encode(NetworkId::Test, &submit()).unwrap();
        assert_eq!(
            decode(NetworkId::Live, &bytes),
            Err(CodecError::WrongNetwork {
                expected: NetworkId::Live,
                got: NetworkId::Test
            })
        );
    }

    #[test]
    fn rejects_other_version() {
        let envelope = Envelope {
            header: MessageHeader {
                network: NetworkId::Dev,
                protocol_version: PROTOCOL_VERSION + 1,
            },
            message: submit(),
        };
        let bytes = options().serialize(&envelope).unwrap();
        assert_eq!(
            decode(NetworkId::Dev, &bytes),
            Err(CodecError::UnsupportedVersion(PROTOCOL_VERSION + 1))
        );
    }

    #[test]
    fn garbage_and_truncation_are_malformed() {
        assert!(matches!(
            decode(NetworkId::Dev, &[0xFF; 7]),
            Err(CodecError::Malformed(_))
        ));
        let bytes = encode(NetworkId::Dev, &submit()).unwrap();
        assert!(matches!(
            decode(NetworkId::Dev, &bytes[..bytes.len() - 1]),
            Err(CodecError::Malformed(_))
        ));
    }
}
